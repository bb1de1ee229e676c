//! Protocol message

use crate::entry::WantEntry;
use blockswap_primitives::{Block, Cid, Priority};
use std::collections::HashMap;

/// Block-exchange protocol message
///
/// Want entries keep insertion order; adding a second entry for the same cid
/// replaces the first in place. Blocks are deduplicated by cid.
#[derive(Clone, Debug, Default)]
pub struct Message {
    full: bool,
    wantlist: Vec<WantEntry>,
    want_index: HashMap<Cid, usize>,
    blocks: Vec<Block>,
    block_index: HashMap<Cid, usize>,
}

impl Message {
    /// Create an empty message.
    ///
    /// A `full` message carries the sender's complete want-list and replaces
    /// whatever the receiver recorded before.
    pub fn new(full: bool) -> Self {
        Self {
            full,
            ..Default::default()
        }
    }

    /// Whether the want-list is complete
    pub fn full(&self) -> bool {
        self.full
    }

    /// Add (or replace) a want for `cid`
    pub fn add_entry(&mut self, cid: Cid, priority: Priority) {
        self.put_entry(WantEntry::want(cid, priority));
    }

    /// Add (or replace) a cancel for `cid`
    pub fn cancel(&mut self, cid: Cid) {
        self.put_entry(WantEntry::cancel(cid));
    }

    fn put_entry(&mut self, entry: WantEntry) {
        match self.want_index.get(&entry.cid) {
            Some(&idx) => self.wantlist[idx] = entry,
            None => {
                self.want_index.insert(entry.cid, self.wantlist.len());
                self.wantlist.push(entry);
            }
        }
    }

    /// Add a block to the payload. Duplicates are ignored.
    pub fn add_block(&mut self, block: Block) {
        if self.block_index.contains_key(block.cid()) {
            return;
        }
        self.block_index.insert(*block.cid(), self.blocks.len());
        self.blocks.push(block);
    }

    /// Want entries in insertion order
    pub fn wantlist(&self) -> &[WantEntry] {
        &self.wantlist
    }

    /// Blocks in insertion order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Check whether the payload contains the block `cid`
    pub fn has_block(&self, cid: &Cid) -> bool {
        self.block_index.contains_key(cid)
    }

    /// Check if the message carries neither entries nor blocks
    pub fn is_empty(&self) -> bool {
        self.wantlist.is_empty() && self.blocks.is_empty()
    }

    /// Payload size used for exchange accounting: total raw block bytes
    pub fn size(&self) -> u64 {
        self.blocks.iter().map(|b| b.len() as u64).sum()
    }
}
