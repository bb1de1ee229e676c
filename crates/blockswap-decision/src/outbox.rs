//! Pull-based envelope handoff
//!
//! A consumer asks for a slot, then reads exactly one [`Envelope`] from it.
//! Requesting a slot never waits for work; reading the slot does, unless the
//! consumer polls it with [`OutboxSlot::try_recv`].

use crate::envelope::Envelope;
use crate::error::{DecisionError, DecisionResult};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};

pub(crate) type SlotRequest = oneshot::Sender<Envelope>;

/// Consumer handle to the engine's outgoing envelopes
#[derive(Clone, Debug)]
pub struct Outbox {
    requests: mpsc::Sender<SlotRequest>,
}

/// A granted dispatch slot, resolving to one envelope
#[derive(Debug)]
pub struct OutboxSlot {
    rx: oneshot::Receiver<Envelope>,
}

/// Worker side of the outbox
#[derive(Clone)]
pub(crate) struct SlotRequests {
    rx: Arc<Mutex<mpsc::Receiver<SlotRequest>>>,
}

pub(crate) fn channel(capacity: usize) -> (Outbox, SlotRequests) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        Outbox { requests: tx },
        SlotRequests {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

impl Outbox {
    /// Request the next dispatch slot.
    ///
    /// Fails with [`DecisionError::ShuttingDown`] once the engine is closed.
    pub async fn next_slot(&self) -> DecisionResult<OutboxSlot> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send(tx)
            .await
            .map_err(|_| DecisionError::ShuttingDown)?;
        Ok(OutboxSlot { rx })
    }

    /// Request a slot and wait for its envelope
    pub async fn next_envelope(&self) -> DecisionResult<Envelope> {
        self.next_slot().await?.recv().await
    }

    /// Whether the engine stopped serving slots
    pub fn is_closed(&self) -> bool {
        self.requests.is_closed()
    }
}

impl OutboxSlot {
    /// Wait for the envelope
    pub async fn recv(self) -> DecisionResult<Envelope> {
        self.rx.await.map_err(|_| DecisionError::ShuttingDown)
    }

    /// Take the envelope if it is ready, without waiting
    pub fn try_recv(&mut self) -> DecisionResult<Option<Envelope>> {
        match self.rx.try_recv() {
            Ok(envelope) => Ok(Some(envelope)),
            Err(oneshot::error::TryRecvError::Empty) => Ok(None),
            Err(oneshot::error::TryRecvError::Closed) => Err(DecisionError::ShuttingDown),
        }
    }
}

impl SlotRequests {
    /// Wait for a consumer to ask for a slot. `None` once every [`Outbox`] is gone.
    pub(crate) async fn next(&self) -> Option<SlotRequest> {
        self.rx.lock().await.recv().await
    }
}
