//! Streaming adapter configuration.

/// Channel sizes for a `ChannelizedQueue`.
///
/// Items only get re-ordered while they sit in the priority queue, so the
/// egress buffer is kept as small as tokio allows by default.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Buffer size of the ingress channel.
    pub ingress_capacity: usize,
    /// Buffer size of the egress channel.
    pub egress_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            ingress_capacity: 16,
            egress_capacity: 1,
        }
    }
}

impl StreamConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the ingress buffer size (minimum 1).
    pub fn with_ingress_capacity(mut self, capacity: usize) -> Self {
        self.ingress_capacity = capacity.max(1);
        self
    }

    /// Sets the egress buffer size (minimum 1).
    pub fn with_egress_capacity(mut self, capacity: usize) -> Self {
        self.egress_capacity = capacity.max(1);
        self
    }
}
