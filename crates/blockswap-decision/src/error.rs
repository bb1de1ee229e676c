//! Decision engine error types

use blockswap_storage::StorageError;
use thiserror::Error;

/// Decision engine errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecisionError {
    /// Block store failure
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Transport reported a failure delivering an envelope
    #[error("transport error: {0}")]
    Transport(String),

    /// Envelope dropped without being completed
    #[error("envelope dropped without completion")]
    EnvelopeAbandoned,

    /// Engine is shutting down
    #[error("engine is shutting down")]
    ShuttingDown,
}

/// Result type for decision engine operations
pub type DecisionResult<T> = Result<T, DecisionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use blockswap_primitives::Cid;

    #[test]
    fn test_error_from_storage() {
        let err: DecisionError = StorageError::NotFound(Cid::from_bytes([1; 32])).into();
        let msg = format!("{}", err);
        assert!(msg.contains("storage error"));
        assert!(msg.contains("block not found"));
    }

    #[test]
    fn test_error_transport() {
        let err = DecisionError::Transport("stream reset".into());
        assert_eq!(err.to_string(), "transport error: stream reset");
    }

    #[test]
    fn test_error_abandoned() {
        let msg = DecisionError::EnvelopeAbandoned.to_string();
        assert!(msg.contains("without completion"));
    }

    #[test]
    fn test_error_shutting_down() {
        assert!(DecisionError::ShuttingDown.to_string().contains("shutting down"));
    }
}
