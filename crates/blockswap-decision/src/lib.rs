//! # blockswap-decision
//!
//! Decision engine for the blockswap block-exchange protocol.
//!
//! This crate provides:
//! - Per-peer ledgers (bytes exchanged, current want-list)
//! - A round-robin peer task queue with per-peer priority ordering
//! - Dispatch workers that turn queued work into envelopes
//! - A pull-based outbox through which the network layer takes envelopes
//! - Peer importance signalling for connections with outstanding work
//!
//! ## Architecture
//!
//! ```text
//! inbound Message
//!        |
//! +-------------------+      +-----------------+
//! |      Engine       | ---> |     Ledgers     |  <- accounting, want-lists
//! +-------------------+      +-----------------+
//!        |
//! +-------------------+
//! |  PeerTaskQueue    |  <- round-robin over peers
//! +-------------------+
//!        |
//! +-------------------+      +-----------------+
//! | dispatch worker   | ---> |   PeerTagger    |  <- tag / untag busy peers
//! +-------------------+      +-----------------+
//!        |
//! +-------------------+
//! |      Outbox       |  <- slot -> Envelope -> sent() / err()
//! +-------------------+
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use blockswap_decision::Engine;
//!
//! let engine = Engine::new(blockstore, tagger);
//! engine.message_received(peer, &msg);
//!
//! let outbox = engine.outbox();
//! while let Ok(slot) = outbox.next_slot().await {
//!     let envelope = slot.recv().await?;
//!     match network.send(envelope.peer(), envelope.message()).await {
//!         Ok(()) => envelope.sent(),
//!         Err(e) => envelope.err(DecisionError::Transport(e.to_string())),
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod engine;
mod envelope;
mod error;
mod ledger;
mod metrics;
mod outbox;
mod queue;
mod tagger;

pub use config::{EngineConfig, DEFAULT_TAG_NAME, DEFAULT_TAG_WEIGHT};
pub use engine::Engine;
pub use envelope::Envelope;
pub use error::{DecisionError, DecisionResult};
pub use ledger::{Ledger, Receipt};
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use outbox::{Outbox, OutboxSlot};
pub use queue::{Admission, PeerTaskQueue, TaskBatch};
pub use tagger::PeerTagger;
