//! Per-peer exchange accounting

use blockswap_message::WantEntry;
use blockswap_primitives::{Cid, PeerId, Priority};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// Accounting record for one remote peer.
///
/// Holds what we sent to and received from the partner, plus the blocks the
/// partner currently wants from us.
#[derive(Debug, Clone)]
pub struct Ledger {
    partner: PeerId,
    bytes_sent: u64,
    bytes_received: u64,
    exchange_count: u64,
    wantlist: HashMap<Cid, WantEntry>,
    last_exchange: Option<Instant>,
}

impl Ledger {
    /// Create an empty ledger for `partner`
    pub fn new(partner: PeerId) -> Self {
        Self {
            partner,
            bytes_sent: 0,
            bytes_received: 0,
            exchange_count: 0,
            wantlist: HashMap::new(),
            last_exchange: None,
        }
    }

    /// The remote peer this ledger tracks
    pub fn partner(&self) -> PeerId {
        self.partner
    }

    /// Account bytes sent to the partner
    pub fn record_sent(&mut self, n: u64) {
        self.bytes_sent = self.bytes_sent.saturating_add(n);
        self.touch();
    }

    /// Account bytes received from the partner
    pub fn record_received(&mut self, n: u64) {
        self.bytes_received = self.bytes_received.saturating_add(n);
        self.touch();
    }

    fn touch(&mut self) {
        self.exchange_count += 1;
        self.last_exchange = Some(Instant::now());
    }

    /// Total bytes sent to the partner
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Total bytes received from the partner
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Number of messages accounted in either direction
    pub fn exchange_count(&self) -> u64 {
        self.exchange_count
    }

    /// Time of the most recent accounted message
    pub fn last_exchange(&self) -> Option<Instant> {
        self.last_exchange
    }

    /// Ratio of bytes sent to bytes received
    pub fn debt_ratio(&self) -> f64 {
        self.bytes_sent as f64 / (self.bytes_received as f64 + 1.0)
    }

    /// Record a want, replacing any earlier want for the same cid
    pub fn wants(&mut self, cid: Cid, priority: Priority) {
        self.wantlist.insert(cid, WantEntry::want(cid, priority));
    }

    /// Drop a want. Returns whether it was present.
    pub fn cancel_want(&mut self, cid: &Cid) -> bool {
        self.wantlist.remove(cid).is_some()
    }

    /// Look up the current want for `cid`
    pub fn wantlist_contains(&self, cid: &Cid) -> Option<&WantEntry> {
        self.wantlist.get(cid)
    }

    /// Clear the want-list, returning the cids that were wanted
    pub fn clear_wantlist(&mut self) -> Vec<Cid> {
        self.wantlist.drain().map(|(cid, _)| cid).collect()
    }

    /// Current wants ordered by descending priority
    pub fn wantlist(&self) -> Vec<WantEntry> {
        let mut entries: Vec<WantEntry> = self.wantlist.values().copied().collect();
        entries.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.cid.cmp(&b.cid)));
        entries
    }

    /// Number of wanted blocks
    pub fn wantlist_len(&self) -> usize {
        self.wantlist.len()
    }

    /// Serializable snapshot of the accounting state
    pub fn receipt(&self) -> Receipt {
        Receipt {
            peer: self.partner,
            value: self.debt_ratio(),
            sent: self.bytes_sent,
            recv: self.bytes_received,
            exchanged: self.exchange_count,
        }
    }
}

/// Summary of a ledger at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// Partner
    pub peer: PeerId,
    /// Debt ratio
    pub value: f64,
    /// Bytes sent to the partner
    pub sent: u64,
    /// Bytes received from the partner
    pub recv: u64,
    /// Messages exchanged
    pub exchanged: u64,
}
