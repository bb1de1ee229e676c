//! # blockswap-primitives
//!
//! Primitive types for the blockswap block-exchange protocol.
//!
//! This crate provides the identifiers shared by every other crate:
//! - [`Cid`]: content identifier, the SHA-256 digest of a block's bytes
//! - [`PeerId`]: opaque identifier of a remote endpoint
//! - [`Block`]: raw block bytes paired with their content identifier

#![warn(missing_docs)]
#![warn(clippy::all)]

mod block;
mod cid;
mod error;
mod peer;

pub use block::Block;
pub use cid::{Cid, CidError};
pub use error::PrimitiveError;
pub use peer::PeerId;

/// Want priority as assigned by the requesting peer (higher is more urgent)
pub type Priority = i32;
