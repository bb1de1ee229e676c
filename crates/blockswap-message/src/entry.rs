//! Want-list entries

use blockswap_primitives::{Cid, Priority};

/// A single want-list entry: a request for `cid` at `priority`, or a cancel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WantEntry {
    /// Requested block
    pub cid: Cid,
    /// Caller-assigned priority (higher is more urgent)
    pub priority: Priority,
    /// Whether this entry cancels an earlier want
    pub cancel: bool,
}

impl WantEntry {
    /// Create a want for `cid`
    pub fn want(cid: Cid, priority: Priority) -> Self {
        Self {
            cid,
            priority,
            cancel: false,
        }
    }

    /// Create a cancel for `cid`
    pub fn cancel(cid: Cid) -> Self {
        Self {
            cid,
            priority: 0,
            cancel: true,
        }
    }
}
