//! Peer task queue
//!
//! Pending "send block to peer" obligations, partitioned by peer. Peers are
//! served round-robin in the order they became active; each pop hands out
//! every pending task of one peer as a single batch.
//!
//! Popped tasks stay marked as dispatched until [`PeerTaskQueue::tasks_done`]
//! is called for them; a dispatched (peer, cid) cannot be queued again.

use blockswap_message::WantEntry;
use blockswap_primitives::{Cid, PeerId, Priority};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::sync::Notify;

/// All pending tasks of one peer, taken in one pop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskBatch {
    /// Target peer
    pub peer: PeerId,
    /// Entries by descending priority, ties in admission order
    pub entries: Vec<WantEntry>,
}

/// Outcome of [`PeerTaskQueue::push_want`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A new task was queued
    Created,
    /// A pending task had its priority updated
    Updated,
    /// The block is already on its way to the peer; nothing was queued
    InFlight,
}

#[derive(Debug, Clone, Copy)]
struct Task {
    priority: Priority,
    seq: u64,
}

#[derive(Default)]
struct QueueState {
    tasks: HashMap<PeerId, HashMap<Cid, Task>>,
    /// Active peers, front is served next
    rotation: VecDeque<PeerId>,
    /// Popped, not yet reported done
    dispatched: HashMap<PeerId, HashSet<Cid>>,
    next_seq: u64,
    closed: bool,
}

impl QueueState {
    fn drop_from_rotation(&mut self, peer: &PeerId) {
        self.rotation.retain(|p| p != peer);
    }
}

/// Round-robin, per-peer priority queue of pending block deliveries
#[derive(Default)]
pub struct PeerTaskQueue {
    state: Mutex<QueueState>,
    work: Notify,
}

impl PeerTaskQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit or update a pending task.
    ///
    /// A peer without pending tasks joins the back of the rotation. Updating
    /// an existing task changes its priority but keeps its admission order.
    /// A want for a dispatched block is refused.
    pub fn push_want(&self, peer: PeerId, cid: Cid, priority: Priority) -> Admission {
        let created = {
            let mut state = self.state.lock();
            if state
                .dispatched
                .get(&peer)
                .map(|d| d.contains(&cid))
                .unwrap_or(false)
            {
                return Admission::InFlight;
            }
            let seq = state.next_seq;
            let activate = !state.tasks.contains_key(&peer);
            let peer_tasks = state.tasks.entry(peer).or_default();
            let created = match peer_tasks.get_mut(&cid) {
                Some(task) => {
                    task.priority = priority;
                    false
                }
                None => {
                    peer_tasks.insert(cid, Task { priority, seq });
                    true
                }
            };
            if created {
                state.next_seq += 1;
            }
            if activate {
                state.rotation.push_back(peer);
            }
            created
        };
        self.work.notify_one();
        if created {
            Admission::Created
        } else {
            Admission::Updated
        }
    }

    /// Remove a pending task that has not been popped yet.
    /// Returns whether a task was removed.
    pub fn cancel(&self, peer: &PeerId, cid: &Cid) -> bool {
        let mut state = self.state.lock();
        let Some(peer_tasks) = state.tasks.get_mut(peer) else {
            return false;
        };
        let removed = peer_tasks.remove(cid).is_some();
        if peer_tasks.is_empty() {
            state.tasks.remove(peer);
            state.drop_from_rotation(peer);
        }
        removed
    }

    /// Remove every pending task of `peer`. Returns the number removed.
    /// Dispatched tasks stay marked until their envelope completes.
    pub fn remove_peer(&self, peer: &PeerId) -> usize {
        let mut state = self.state.lock();
        let removed = state.tasks.remove(peer).map(|t| t.len()).unwrap_or(0);
        state.drop_from_rotation(peer);
        removed
    }

    /// Take the peer at the front of the rotation with all its pending tasks.
    ///
    /// Returns `None` if no peer has pending tasks or the queue is closed.
    pub fn pop_next(&self) -> Option<TaskBatch> {
        let mut state = self.state.lock();
        if state.closed {
            return None;
        }
        let peer = state.rotation.pop_front()?;
        let peer_tasks = state.tasks.remove(&peer).unwrap_or_default();
        state
            .dispatched
            .entry(peer)
            .or_default()
            .extend(peer_tasks.keys().copied());

        let mut ordered: Vec<(Cid, Task)> = peer_tasks.into_iter().collect();
        ordered.sort_by(|(_, a), (_, b)| b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq)));

        let entries = ordered
            .into_iter()
            .map(|(cid, task)| WantEntry::want(cid, task.priority))
            .collect();
        Some(TaskBatch { peer, entries })
    }

    /// Wait for the next batch.
    ///
    /// Returns `None` once the queue has been closed.
    pub async fn next_batch(&self) -> Option<TaskBatch> {
        loop {
            let notified = self.work.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_closed() {
                return None;
            }
            if let Some(batch) = self.pop_next() {
                return Some(batch);
            }
            notified.await;
        }
    }

    /// Close the queue and wake every waiter
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.work.notify_waiters();
    }

    /// Whether the queue has been closed
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Whether `peer` has pending tasks
    pub fn has_tasks(&self, peer: &PeerId) -> bool {
        self.state.lock().tasks.contains_key(peer)
    }

    /// Release popped tasks so the same blocks may be queued again
    pub fn tasks_done<'a>(&self, peer: &PeerId, cids: impl IntoIterator<Item = &'a Cid>) {
        let mut state = self.state.lock();
        if let Some(dispatched) = state.dispatched.get_mut(peer) {
            for cid in cids {
                dispatched.remove(cid);
            }
            if dispatched.is_empty() {
                state.dispatched.remove(peer);
            }
        }
    }

    /// Total number of pending tasks
    pub fn len(&self) -> usize {
        self.state.lock().tasks.values().map(|t| t.len()).sum()
    }

    /// Check if no task is pending
    pub fn is_empty(&self) -> bool {
        self.state.lock().tasks.is_empty()
    }
}
