//! Block storage traits

use crate::error::{StorageError, StorageResult};
use blockswap_primitives::{Block, Cid};

/// Content-addressed block storage
///
/// Implementations must be safe to share between the ingestion paths and the
/// dispatch workers.
pub trait Blockstore: Send + Sync {
    /// Check whether a block is stored
    fn has(&self, cid: &Cid) -> StorageResult<bool>;

    /// Fetch a block. Returns [`StorageError::NotFound`] if absent.
    fn get(&self, cid: &Cid) -> StorageResult<Block>;

    /// Store a block
    fn put(&self, block: Block) -> StorageResult<()>;

    /// Remove a block. Removing an absent block is not an error.
    fn delete(&self, cid: &Cid) -> StorageResult<()>;

    /// Store several blocks
    fn put_many(&self, blocks: Vec<Block>) -> StorageResult<()> {
        for block in blocks {
            self.put(block)?;
        }
        Ok(())
    }

    /// Fetch a block, mapping "not found" to `None`
    fn get_opt(&self, cid: &Cid) -> StorageResult<Option<Block>> {
        match self.get(cid) {
            Ok(block) => Ok(Some(block)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
