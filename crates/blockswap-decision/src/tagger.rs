//! Peer importance signalling

use blockswap_primitives::PeerId;

/// Receives importance signals for peers with outstanding work.
///
/// The connection manager implements this to avoid pruning connections the
/// engine is still serving. The engine pairs every `tag_peer` with exactly
/// one later `untag_peer` for the same peer and tag.
pub trait PeerTagger: Send + Sync {
    /// Mark `peer` as important
    fn tag_peer(&self, peer: &PeerId, tag: &str, weight: i32);

    /// Clear the mark set by `tag_peer`
    fn untag_peer(&self, peer: &PeerId, tag: &str);
}
