//! # blockswap-message
//!
//! In-memory form of the block-exchange protocol message.
//!
//! A [`Message`] carries an ordered want-list of [`WantEntry`] values (wants
//! and cancels) and a set of blocks being delivered. Wire encoding belongs to
//! the transport; this crate only exposes the accessors the decision engine
//! needs, including [`Message::size`] for accounting.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod entry;
mod message;

pub use entry::WantEntry;
pub use message::Message;
