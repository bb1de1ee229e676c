//! Engine configuration

/// Tag name forwarded to the peer tagger
pub const DEFAULT_TAG_NAME: &str = "bs-engine";

/// Tag weight forwarded to the peer tagger
pub const DEFAULT_TAG_WEIGHT: i32 = 5;

/// Decision engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of dispatch workers. With more than one, envelopes for
    /// different peers may be delivered out of pop order.
    pub worker_count: usize,
    /// Outstanding outbox slot requests buffered before `next_slot` waits
    pub outbox_capacity: usize,
    /// Tag applied to peers with outstanding work
    pub tag_name: String,
    /// Weight of the tag
    pub tag_weight: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            outbox_capacity: 16,
            tag_name: DEFAULT_TAG_NAME.to_string(),
            tag_weight: DEFAULT_TAG_WEIGHT,
        }
    }
}

impl EngineConfig {
    /// Set the number of dispatch workers (at least one)
    pub fn with_worker_count(mut self, workers: usize) -> Self {
        self.worker_count = workers.max(1);
        self
    }

    /// Set the outbox request buffer (at least one)
    pub fn with_outbox_capacity(mut self, capacity: usize) -> Self {
        self.outbox_capacity = capacity.max(1);
        self
    }

    /// Set the tag applied to busy peers
    pub fn with_tag(mut self, name: impl Into<String>, weight: i32) -> Self {
        self.tag_name = name.into();
        self.tag_weight = weight;
        self
    }
}
