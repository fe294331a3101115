//! Gossip engine configuration.

use std::time::Duration;

/// Default anti-entropy period.
pub const DEFAULT_ANTI_ENTROPY: Duration = Duration::from_secs(10);

/// Largest UDP payload over IPv4.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Configuration for one [`GossipEngine`](crate::GossipEngine).
#[derive(Debug, Clone)]
pub struct GossipConfig {
    /// Name this node signs its rumors with.
    pub identifier: String,
    /// Period of the status push to a random peer. Zero disables it.
    pub anti_entropy: Duration,
    /// Period of empty route rumors. Zero disables them.
    pub route_timer: Duration,
    /// Packets larger than this are neither sent nor accepted.
    pub max_datagram_size: usize,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            identifier: "node".to_string(),
            anti_entropy: DEFAULT_ANTI_ENTROPY,
            route_timer: Duration::ZERO,
            max_datagram_size: MAX_DATAGRAM_SIZE,
        }
    }
}

impl GossipConfig {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Self::default()
        }
    }

    pub fn with_anti_entropy(mut self, period: Duration) -> Self {
        self.anti_entropy = period;
        self
    }

    pub fn with_route_timer(mut self, period: Duration) -> Self {
        self.route_timer = period;
        self
    }

    pub fn anti_entropy_enabled(&self) -> bool {
        !self.anti_entropy.is_zero()
    }

    pub fn route_rumors_enabled(&self) -> bool {
        !self.route_timer.is_zero()
    }
}
