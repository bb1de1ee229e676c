//! Common error types for primitives

use crate::cid::CidError;
use thiserror::Error;

/// Primitive operation error
#[derive(Debug, Error)]
pub enum PrimitiveError {
    /// Content identifier error
    #[error("cid error: {0}")]
    Cid(#[from] CidError),

    /// Peer identifier error
    #[error("invalid peer id: {0}")]
    PeerId(String),
}
