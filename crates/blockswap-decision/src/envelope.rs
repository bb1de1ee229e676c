//! Dispatch-ready outgoing messages

use crate::error::{DecisionError, DecisionResult};
use blockswap_message::Message;
use blockswap_primitives::PeerId;
use std::fmt;
use tracing::warn;

type Completion = Box<dyn FnOnce(&PeerId, &Message, DecisionResult<()>) + Send>;

/// One outgoing message plus its completion hook.
///
/// The consumer transmits [`Envelope::message`] to [`Envelope::peer`] and then
/// reports the outcome with [`Envelope::sent`] or [`Envelope::err`]. Both
/// consume the envelope. Dropping an envelope without completing it counts as
/// a failed delivery.
pub struct Envelope {
    peer: PeerId,
    message: Message,
    on_complete: Option<Completion>,
}

impl Envelope {
    pub(crate) fn new<F>(peer: PeerId, message: Message, on_complete: F) -> Self
    where
        F: FnOnce(&PeerId, &Message, DecisionResult<()>) + Send + 'static,
    {
        Self {
            peer,
            message,
            on_complete: Some(Box::new(on_complete)),
        }
    }

    /// Recipient
    pub fn peer(&self) -> PeerId {
        self.peer
    }

    /// Message to transmit
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Report successful transmission
    pub fn sent(mut self) {
        self.complete(Ok(()));
    }

    /// Report failed transmission
    pub fn err(mut self, error: DecisionError) {
        self.complete(Err(error));
    }

    fn complete(&mut self, result: DecisionResult<()>) {
        if let Some(on_complete) = self.on_complete.take() {
            on_complete(&self.peer, &self.message, result);
        }
    }
}

impl Drop for Envelope {
    fn drop(&mut self) {
        if self.on_complete.is_some() {
            warn!(peer = %self.peer, blocks = self.message.blocks().len(), "envelope dropped without completion");
            self.complete(Err(DecisionError::EnvelopeAbandoned));
        }
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("peer", &self.peer)
            .field("blocks", &self.message.blocks().len())
            .field("completed", &self.on_complete.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockswap_primitives::Block;
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Outcomes = Arc<Mutex<Vec<DecisionResult<()>>>>;

    fn envelope(outcomes: &Outcomes) -> Envelope {
        let mut message = Message::new(false);
        message.add_block(Block::new(&b"payload"[..]));
        let outcomes = outcomes.clone();
        Envelope::new(PeerId::from_bytes([1; 32]), message, move |_, _, result| {
            outcomes.lock().push(result)
        })
    }

    #[test]
    fn test_sent_completes_once() {
        let outcomes = Outcomes::default();
        let env = envelope(&outcomes);
        assert_eq!(env.message().blocks().len(), 1);
        env.sent();
        assert_eq!(*outcomes.lock(), vec![Ok(())]);
    }

    #[test]
    fn test_err_passes_error() {
        let outcomes = Outcomes::default();
        envelope(&outcomes).err(DecisionError::Transport("reset".into()));
        assert_eq!(
            *outcomes.lock(),
            vec![Err(DecisionError::Transport("reset".into()))]
        );
    }

    #[test]
    fn test_drop_without_completion_is_abandoned() {
        let outcomes = Outcomes::default();
        drop(envelope(&outcomes));
        assert_eq!(*outcomes.lock(), vec![Err(DecisionError::EnvelopeAbandoned)]);
    }

    #[test]
    fn test_debug_shows_state() {
        let outcomes = Outcomes::default();
        let env = envelope(&outcomes);
        let debug = format!("{:?}", env);
        assert!(debug.contains("Envelope"));
        assert!(debug.contains("completed: false"));
        env.sent();
    }
}
