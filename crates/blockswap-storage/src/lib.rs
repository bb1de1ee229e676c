//! # blockswap-storage
//!
//! Block storage contract consumed by the decision engine.
//!
//! This crate provides:
//! - The [`Blockstore`] trait (`has` / `get` / `put` / `delete`)
//! - [`MemoryBlockstore`], a thread-safe in-memory backend

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod memory;
mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryBlockstore;
pub use traits::Blockstore;
