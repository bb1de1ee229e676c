//! Content identifiers

use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Cid parsing error
#[derive(Debug, Error)]
pub enum CidError {
    /// Invalid hex string
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    /// Invalid length
    #[error("invalid cid length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Expected length
        expected: usize,
        /// Actual length
        got: usize,
    },
}

/// Content identifier: SHA-256 digest of the block bytes.
///
/// Two blocks with equal cids carry identical content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cid([u8; 32]);

impl Cid {
    /// Size in bytes
    pub const LEN: usize = 32;

    /// Compute the cid of raw block data
    pub fn of(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        Cid(digest.into())
    }

    /// Create from digest bytes
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Cid(bytes)
    }

    /// Create from slice
    pub fn from_slice(slice: &[u8]) -> Result<Self, CidError> {
        if slice.len() != Self::LEN {
            return Err(CidError::InvalidLength {
                expected: Self::LEN,
                got: slice.len(),
            });
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);
        Ok(Cid(bytes))
    }

    /// Parse from hex string
    pub fn from_hex(s: &str) -> Result<Self, CidError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| CidError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Get as bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

impl From<[u8; 32]> for Cid {
    fn from(bytes: [u8; 32]) -> Self {
        Cid(bytes)
    }
}

impl AsRef<[u8]> for Cid {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cid_of_is_deterministic() {
        assert_eq!(Cid::of(b"a"), Cid::of(b"a"));
        assert_ne!(Cid::of(b"a"), Cid::of(b"b"));
    }

    #[test]
    fn test_cid_of_empty() {
        // sha256("") = e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855
        assert_eq!(
            Cid::of(&[]).to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_cid_from_hex() {
        let cid = Cid::of(b"hello");
        let parsed = Cid::from_hex(&cid.to_hex()).unwrap();
        assert_eq!(cid, parsed);

        let prefixed = Cid::from_hex(&format!("0x{}", cid.to_hex())).unwrap();
        assert_eq!(cid, prefixed);
    }

    #[test]
    fn test_cid_from_hex_invalid() {
        assert!(matches!(Cid::from_hex("zz"), Err(CidError::InvalidHex(_))));
        assert!(matches!(
            Cid::from_hex("abcd"),
            Err(CidError::InvalidLength { expected: 32, got: 2 })
        ));
    }

    #[test]
    fn test_cid_display_is_short() {
        let cid = Cid::from_bytes([0xab; 32]);
        assert_eq!(format!("{}", cid), "abababababababab");
        assert_eq!(format!("{:?}", cid), "Cid(abababababababab)");
    }
}
