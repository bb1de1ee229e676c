//! Engine counters and gauges

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Counters and gauges updated by the engine
#[derive(Default)]
pub struct EngineMetrics {
    messages_received: AtomicU64,
    messages_sent: AtomicU64,
    bytes_received: AtomicU64,
    bytes_sent: AtomicU64,
    wants_received: AtomicU64,
    cancels_received: AtomicU64,
    envelopes_dispatched: AtomicU64,
    envelopes_completed: AtomicU64,
    envelopes_failed: AtomicU64,
    blocks_dispatched: AtomicU64,
    batches_skipped: AtomicU64,
    partners: AtomicI64,
    in_flight: AtomicI64,
}

impl EngineMetrics {
    /// Create zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn message_received(&self, bytes: u64, wants: u64, cancels: u64) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
        self.wants_received.fetch_add(wants, Ordering::Relaxed);
        self.cancels_received.fetch_add(cancels, Ordering::Relaxed);
    }

    pub(crate) fn message_sent(&self, bytes: u64) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn envelope_dispatched(&self, blocks: u64) {
        self.envelopes_dispatched.fetch_add(1, Ordering::Relaxed);
        self.blocks_dispatched.fetch_add(blocks, Ordering::Relaxed);
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn envelope_completed(&self, ok: bool) {
        if ok {
            self.envelopes_completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.envelopes_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn batch_skipped(&self) {
        self.batches_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn set_partners(&self, partners: usize) {
        self.partners.store(partners as i64, Ordering::Relaxed);
    }

    /// Take a point-in-time copy
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            wants_received: self.wants_received.load(Ordering::Relaxed),
            cancels_received: self.cancels_received.load(Ordering::Relaxed),
            envelopes_dispatched: self.envelopes_dispatched.load(Ordering::Relaxed),
            envelopes_completed: self.envelopes_completed.load(Ordering::Relaxed),
            envelopes_failed: self.envelopes_failed.load(Ordering::Relaxed),
            blocks_dispatched: self.blocks_dispatched.load(Ordering::Relaxed),
            batches_skipped: self.batches_skipped.load(Ordering::Relaxed),
            partners: self.partners.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`EngineMetrics`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Inbound messages accounted
    pub messages_received: u64,
    /// Outbound messages accounted
    pub messages_sent: u64,
    /// Inbound payload bytes
    pub bytes_received: u64,
    /// Outbound payload bytes
    pub bytes_sent: u64,
    /// Want entries received
    pub wants_received: u64,
    /// Cancel entries received
    pub cancels_received: u64,
    /// Envelopes handed to the outbox
    pub envelopes_dispatched: u64,
    /// Envelopes reported sent
    pub envelopes_completed: u64,
    /// Envelopes reported failed or dropped
    pub envelopes_failed: u64,
    /// Blocks carried by dispatched envelopes
    pub blocks_dispatched: u64,
    /// Popped batches with no deliverable block
    pub batches_skipped: u64,
    /// Peers with a live ledger
    pub partners: i64,
    /// Envelopes awaiting completion
    pub in_flight: i64,
}

impl MetricsSnapshot {
    /// Export snapshot as JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
