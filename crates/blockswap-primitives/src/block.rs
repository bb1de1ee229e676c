//! Content-addressed blocks

use crate::cid::Cid;
use bytes::Bytes;

/// A block of raw data together with its content identifier
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    cid: Cid,
    data: Bytes,
}

impl Block {
    /// Create a block, deriving its cid from the data
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            cid: Cid::of(&data),
            data,
        }
    }

    /// Content identifier
    pub fn cid(&self) -> &Cid {
        &self.cid
    }

    /// Raw block bytes
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Length of the raw data in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the block carries no data
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
