//! Peer identifiers

use std::fmt;

use crate::error::PrimitiveError;

/// Peer identifier (32 bytes)
///
/// The engine treats this as opaque; only equality, hashing and ordering are used.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeerId([u8; 32]);

impl PeerId {
    /// Create from bytes
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create from slice
    pub fn from_slice(slice: &[u8]) -> Result<Self, PrimitiveError> {
        let bytes: [u8; 32] = slice
            .try_into()
            .map_err(|_| PrimitiveError::PeerId(format!("expected 32 bytes, got {}", slice.len())))?;
        Ok(Self(bytes))
    }

    /// Generate random peer ID
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// Get as bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}
