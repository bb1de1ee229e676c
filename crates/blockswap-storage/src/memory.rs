//! In-memory block store

use crate::error::{StorageError, StorageResult};
use crate::traits::Blockstore;
use blockswap_primitives::{Block, Cid};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::trace;

/// Thread-safe in-memory [`Blockstore`]
#[derive(Default)]
pub struct MemoryBlockstore {
    blocks: RwLock<HashMap<Cid, Block>>,
}

impl MemoryBlockstore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blocks
    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }
}

impl Blockstore for MemoryBlockstore {
    fn has(&self, cid: &Cid) -> StorageResult<bool> {
        Ok(self.blocks.read().contains_key(cid))
    }

    fn get(&self, cid: &Cid) -> StorageResult<Block> {
        self.blocks
            .read()
            .get(cid)
            .cloned()
            .ok_or(StorageError::NotFound(*cid))
    }

    fn put(&self, block: Block) -> StorageResult<()> {
        trace!(cid = %block.cid(), len = block.len(), "put block");
        self.blocks.write().insert(*block.cid(), block);
        Ok(())
    }

    fn delete(&self, cid: &Cid) -> StorageResult<()> {
        if self.blocks.write().remove(cid).is_some() {
            trace!(cid = %cid, "deleted block");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_has() {
        let store = MemoryBlockstore::new();
        let block = Block::new(&b"a"[..]);
        let cid = *block.cid();

        assert!(!store.has(&cid).unwrap());
        store.put(block.clone()).unwrap();
        assert!(store.has(&cid).unwrap());
        assert_eq!(store.get(&cid).unwrap(), block);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let store = MemoryBlockstore::new();
        let cid = Cid::of(b"missing");
        assert_eq!(store.get(&cid), Err(StorageError::NotFound(cid)));
        assert_eq!(store.get_opt(&cid), Ok(None));
    }

    #[test]
    fn test_delete() {
        let store = MemoryBlockstore::new();
        let block = Block::new(&b"a"[..]);
        let cid = *block.cid();

        store.put(block).unwrap();
        store.delete(&cid).unwrap();
        assert!(!store.has(&cid).unwrap());
        assert!(store.is_empty());

        // Idempotent
        store.delete(&cid).unwrap();
    }

    #[test]
    fn test_put_many() {
        let store = MemoryBlockstore::new();
        let blocks: Vec<Block> = ["a", "b", "c"]
            .iter()
            .map(|s| Block::new(s.as_bytes().to_vec()))
            .collect();
        store.put_many(blocks).unwrap();
        assert_eq!(store.len(), 3);
        assert!(store.has(&Cid::of(b"b")).unwrap());
    }
}
