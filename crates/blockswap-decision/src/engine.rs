//! Decision engine
//!
//! Ingests want-lists from partners, keeps their ledgers, queues deliverable
//! blocks and runs the dispatch workers that turn queued work into
//! [`Envelope`]s handed out through the [`Outbox`].

use crate::config::EngineConfig;
use crate::envelope::Envelope;
use crate::error::DecisionResult;
use crate::ledger::{Ledger, Receipt};
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::outbox::{self, Outbox, SlotRequests};
use crate::queue::{Admission, PeerTaskQueue};
use crate::tagger::PeerTagger;
use blockswap_message::{Message, WantEntry};
use blockswap_primitives::{Cid, PeerId};
use blockswap_storage::{Blockstore, StorageError};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Block-exchange decision engine.
///
/// Must be created inside a Tokio runtime: construction spawns the dispatch
/// workers. Dropping the engine closes it.
pub struct Engine {
    inner: Arc<EngineInner>,
    outbox: Outbox,
    shutdown: watch::Sender<bool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

struct EngineInner {
    config: EngineConfig,
    ledgers: DashMap<PeerId, Ledger>,
    queue: PeerTaskQueue,
    blockstore: Arc<dyn Blockstore>,
    tagger: Arc<dyn PeerTagger>,
    /// Tagged peers and their envelopes awaiting completion
    outstanding: Mutex<HashMap<PeerId, usize>>,
    metrics: EngineMetrics,
}

impl Engine {
    /// Create an engine with the default configuration
    pub fn new(blockstore: Arc<dyn Blockstore>, tagger: Arc<dyn PeerTagger>) -> Self {
        Self::with_config(EngineConfig::default(), blockstore, tagger)
    }

    /// Create an engine and start its dispatch workers
    pub fn with_config(
        config: EngineConfig,
        blockstore: Arc<dyn Blockstore>,
        tagger: Arc<dyn PeerTagger>,
    ) -> Self {
        let (outbox, requests) = outbox::channel(config.outbox_capacity);
        let (shutdown, _) = watch::channel(false);
        let worker_count = config.worker_count.max(1);

        let inner = Arc::new(EngineInner {
            config,
            ledgers: DashMap::new(),
            queue: PeerTaskQueue::new(),
            blockstore,
            tagger,
            outstanding: Mutex::new(HashMap::new()),
            metrics: EngineMetrics::new(),
        });

        let workers = (0..worker_count)
            .map(|id| {
                tokio::spawn(dispatch_worker(
                    id,
                    inner.clone(),
                    requests.clone(),
                    shutdown.subscribe(),
                ))
            })
            .collect();

        info!(workers = worker_count, "decision engine started");

        Self {
            inner,
            outbox,
            shutdown,
            workers: Mutex::new(workers),
        }
    }

    /// Handle for pulling ready envelopes
    pub fn outbox(&self) -> Outbox {
        self.outbox.clone()
    }

    /// Account an inbound message and apply its want-list.
    ///
    /// `from` becomes a partner even if the message is empty.
    pub fn message_received(&self, from: PeerId, msg: &Message) {
        let size = msg.size();
        let mut wants = 0u64;
        let mut cancels = 0u64;

        {
            let mut ledger = self
                .inner
                .ledgers
                .entry(from)
                .or_insert_with(|| Ledger::new(from));
            ledger.record_received(size);

            if msg.full() {
                let keep: HashSet<Cid> = msg
                    .wantlist()
                    .iter()
                    .filter(|e| !e.cancel)
                    .map(|e| e.cid)
                    .collect();
                for cid in ledger.clear_wantlist() {
                    if !keep.contains(&cid) {
                        self.inner.queue.cancel(&from, &cid);
                    }
                }
            }

            for entry in msg.wantlist() {
                if entry.cancel {
                    cancels += 1;
                    ledger.cancel_want(&entry.cid);
                    self.inner.queue.cancel(&from, &entry.cid);
                    trace!(peer = %from, cid = %entry.cid, "cancel");
                    continue;
                }

                wants += 1;
                ledger.wants(entry.cid, entry.priority);
                match self.inner.blockstore.has(&entry.cid) {
                    Ok(true) => match self.inner.queue.push_want(from, entry.cid, entry.priority) {
                        Admission::InFlight => {
                            trace!(peer = %from, cid = %entry.cid, "want already in flight");
                        }
                        _ => {
                            trace!(peer = %from, cid = %entry.cid, priority = entry.priority, "want queued");
                        }
                    },
                    Ok(false) => {
                        trace!(peer = %from, cid = %entry.cid, "want recorded, block not available");
                    }
                    Err(e) => {
                        warn!(peer = %from, cid = %entry.cid, error = %e, "block lookup failed");
                    }
                }
            }
        }

        debug!(peer = %from, bytes = size, wants, cancels, "message received");
        self.inner.metrics.message_received(size, wants, cancels);
        self.inner.metrics.set_partners(self.inner.ledgers.len());
        if cancels > 0 || msg.full() {
            self.inner.release_if_idle(&from);
        }
    }

    /// Account an outbound message.
    ///
    /// Only the byte counters change. Envelopes handed out by the outbox
    /// account themselves when completed with [`Envelope::sent`], and also
    /// drop the delivered blocks from the partner's want-list.
    pub fn message_sent(&self, to: PeerId, msg: &Message) {
        self.inner.account_sent(to, msg.size(), true);
    }

    /// Forget a partner: drop its ledger and every pending task for it
    pub fn peer_disconnected(&self, peer: PeerId) {
        let had_ledger = self.inner.ledgers.remove(&peer).is_some();
        let dropped = self.inner.queue.remove_peer(&peer);
        self.inner.release_if_idle(&peer);
        self.inner.metrics.set_partners(self.inner.ledgers.len());
        if had_ledger {
            debug!(peer = %peer, dropped_tasks = dropped, "peer disconnected");
        }
    }

    /// A block became available locally: queue it for every partner wanting it.
    ///
    /// Partners already receiving it in an uncompleted envelope are skipped.
    /// Returns the number of partners it was queued for.
    pub fn block_available(&self, cid: &Cid) -> usize {
        match self.inner.blockstore.has(cid) {
            Ok(true) => {}
            Ok(false) => {
                trace!(cid = %cid, "announced block not in store, ignored");
                return 0;
            }
            Err(e) => {
                warn!(cid = %cid, error = %e, "block lookup failed");
                return 0;
            }
        }

        let wanting: Vec<(PeerId, WantEntry)> = self
            .inner
            .ledgers
            .iter()
            .filter_map(|l| l.wantlist_contains(cid).map(|e| (*l.key(), *e)))
            .collect();

        let queued = wanting
            .iter()
            .filter(|(peer, entry)| {
                self.inner.queue.push_want(*peer, entry.cid, entry.priority) != Admission::InFlight
            })
            .count();
        if queued > 0 {
            debug!(cid = %cid, partners = queued, "block available, tasks queued");
        }
        queued
    }

    /// Partners with a live ledger, in no particular order
    pub fn peers(&self) -> Vec<PeerId> {
        self.inner.ledgers.iter().map(|l| *l.key()).collect()
    }

    /// Bytes sent to `peer` (0 if unknown)
    pub fn bytes_sent_to(&self, peer: &PeerId) -> u64 {
        self.inner
            .ledgers
            .get(peer)
            .map(|l| l.bytes_sent())
            .unwrap_or(0)
    }

    /// Bytes received from `peer` (0 if unknown)
    pub fn bytes_received_from(&self, peer: &PeerId) -> u64 {
        self.inner
            .ledgers
            .get(peer)
            .map(|l| l.bytes_received())
            .unwrap_or(0)
    }

    /// Accounting snapshot for `peer`
    pub fn ledger_for_peer(&self, peer: &PeerId) -> Option<Receipt> {
        self.inner.ledgers.get(peer).map(|l| l.receipt())
    }

    /// Current wants of `peer`, highest priority first
    pub fn wantlist_for_peer(&self, peer: &PeerId) -> Vec<WantEntry> {
        self.inner
            .ledgers
            .get(peer)
            .map(|l| l.wantlist())
            .unwrap_or_default()
    }

    /// Number of tasks waiting for dispatch
    pub fn pending_tasks(&self) -> usize {
        self.inner.queue.len()
    }

    /// Metrics snapshot
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    /// Stop dispatching.
    ///
    /// Blocked workers wake up and exit, after which the outbox reports
    /// closed. Envelopes already handed out stay valid and may still be
    /// completed.
    pub fn close(&self) {
        if self.shutdown.send_replace(true) {
            return;
        }
        self.inner.queue.close();
        info!("decision engine closing");
    }

    /// Whether [`Engine::close`] has been called
    pub fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Close the engine and wait for every dispatch worker to exit
    pub async fn shutdown(&self) {
        self.close();
        let workers: Vec<JoinHandle<()>> = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if let Err(e) = worker.await {
                warn!(error = %e, "dispatch worker failed");
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.close();
    }
}

impl EngineInner {
    /// Record sent bytes. Returns `false` if `to` has no ledger and `create`
    /// is not set.
    fn account_sent(&self, to: PeerId, size: u64, create: bool) -> bool {
        {
            let mut ledger = match self.ledgers.get_mut(&to) {
                Some(ledger) => ledger,
                None if create => self.ledgers.entry(to).or_insert_with(|| Ledger::new(to)),
                None => {
                    trace!(peer = %to, "completion for forgotten peer, not accounted");
                    return false;
                }
            };
            ledger.record_sent(size);
        }
        debug!(peer = %to, bytes = size, "message sent");
        self.metrics.message_sent(size);
        self.metrics.set_partners(self.ledgers.len());
        true
    }

    /// Delivered blocks leave the partner's want-list and the queue
    fn fulfil(&self, to: &PeerId, msg: &Message) {
        if let Some(mut ledger) = self.ledgers.get_mut(to) {
            for block in msg.blocks() {
                ledger.cancel_want(block.cid());
                self.queue.cancel(to, block.cid());
            }
        }
    }

    /// Build the next non-empty envelope, waiting for work.
    /// `None` once the queue is closed.
    async fn next_envelope(self: &Arc<Self>) -> Option<Envelope> {
        loop {
            let batch = self.queue.next_batch().await?;
            let peer = batch.peer;
            let mut message = Message::new(false);
            let mut dropped = Vec::new();

            for entry in &batch.entries {
                if !self.still_wanted(&peer, &entry.cid) {
                    trace!(peer = %peer, cid = %entry.cid, "want withdrawn before dispatch");
                    dropped.push(entry.cid);
                    continue;
                }
                match self.blockstore.get(&entry.cid) {
                    Ok(block) => message.add_block(block),
                    Err(StorageError::NotFound(_)) => {
                        debug!(peer = %peer, cid = %entry.cid, "block no longer available, dropping task");
                        dropped.push(entry.cid);
                    }
                    Err(e) => {
                        warn!(peer = %peer, cid = %entry.cid, error = %e, "block fetch failed, dropping task");
                        dropped.push(entry.cid);
                    }
                }
            }
            self.queue.tasks_done(&peer, &dropped);

            if message.blocks().is_empty() {
                debug!(peer = %peer, tasks = batch.entries.len(), "nothing deliverable in batch");
                self.metrics.batch_skipped();
                self.release_if_idle(&peer);
                continue;
            }

            self.acquire(&peer);
            let blocks = message.blocks().len();
            self.metrics.envelope_dispatched(blocks as u64);
            debug!(peer = %peer, blocks, "envelope ready");

            let inner = Arc::clone(self);
            return Some(Envelope::new(peer, message, move |peer, message, result| {
                inner.complete(*peer, message, result)
            }));
        }
    }

    fn still_wanted(&self, peer: &PeerId, cid: &Cid) -> bool {
        self.ledgers
            .get(peer)
            .map(|l| l.wantlist_contains(cid).is_some())
            .unwrap_or(false)
    }

    fn complete(&self, peer: PeerId, message: &Message, result: DecisionResult<()>) {
        let ok = result.is_ok();
        match result {
            Ok(()) => {
                if self.account_sent(peer, message.size(), false) {
                    self.fulfil(&peer, message);
                }
            }
            Err(e) => warn!(peer = %peer, error = %e, "envelope not delivered"),
        }
        self.queue
            .tasks_done(&peer, message.blocks().iter().map(|b| b.cid()));
        self.metrics.envelope_completed(ok);

        if let Some(count) = self.outstanding.lock().get_mut(&peer) {
            *count = count.saturating_sub(1);
        }
        self.release_if_idle(&peer);
    }

    /// Tag `peer` on its first in-flight envelope
    fn acquire(&self, peer: &PeerId) {
        let mut outstanding = self.outstanding.lock();
        match outstanding.get_mut(peer) {
            Some(count) => *count += 1,
            None => {
                outstanding.insert(*peer, 1);
                self.tagger
                    .tag_peer(peer, &self.config.tag_name, self.config.tag_weight);
                trace!(peer = %peer, "peer tagged");
            }
        }
    }

    /// Untag `peer` once nothing is in flight or queued for it
    fn release_if_idle(&self, peer: &PeerId) {
        let mut outstanding = self.outstanding.lock();
        if outstanding.get(peer) != Some(&0) || self.queue.has_tasks(peer) {
            return;
        }
        outstanding.remove(peer);
        self.tagger.untag_peer(peer, &self.config.tag_name);
        trace!(peer = %peer, "peer untagged");
    }
}

async fn dispatch_worker(
    id: usize,
    inner: Arc<EngineInner>,
    requests: SlotRequests,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!(worker = id, "dispatch worker started");
    // Envelope whose slot was dropped before delivery; goes to the next slot
    let mut held: Option<Envelope> = None;

    loop {
        if *shutdown.borrow() {
            break;
        }

        let slot = tokio::select! {
            _ = shutdown.changed() => break,
            request = requests.next() => match request {
                Some(slot) => slot,
                None => break,
            },
        };

        let envelope = match held.take() {
            Some(envelope) => envelope,
            None => tokio::select! {
                _ = shutdown.changed() => break,
                envelope = inner.next_envelope() => match envelope {
                    Some(envelope) => envelope,
                    None => break,
                },
            },
        };

        if let Err(envelope) = slot.send(envelope) {
            trace!(worker = id, peer = %envelope.peer(), "slot abandoned, holding envelope");
            held = Some(envelope);
        }
    }

    debug!(worker = id, "dispatch worker stopped");
}
