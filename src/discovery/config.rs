use std::time::Duration;

use crate::constants::{
    BLOOM_FILTER_SIZE, BLOOM_ROTATION_PERIOD, DEFAULT_MAX_CONNECTIONS_PER_TORRENT,
    EXCHANGED_COUNT_REFRESH, MAX_DISCOVERED_PEERS, MAX_KNOWN_PEERS_PER_SESSION,
    MAX_REPEAT_RETRIES, MIN_REBUILD_WAIT, STARTUP_MIN_REBUILD_WAIT, STARTUP_WINDOW,
};

/// Tuning for a [`DiscoveryRegistry`](super::DiscoveryRegistry).
///
/// The defaults come from [`crate::constants`]; most callers only set the
/// torrent's connection limit.
///
/// ```
/// use peerdb::discovery::DiscoveryConfig;
///
/// let config = DiscoveryConfig::default().with_max_connections(50);
/// assert_eq!(config.discovered_cache_cap(), 100);
/// assert_eq!(config.known_peer_cap(), 50);
/// ```
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// The torrent's connection limit.
    pub max_connections_per_torrent: usize,
    pub startup_window: Duration,
    pub startup_min_rebuild_wait: Duration,
    pub min_rebuild_wait: Duration,
    pub bloom_rotation_period: Duration,
    pub bloom_filter_size: usize,
    pub max_repeat_retries: usize,
    pub exchanged_count_refresh: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_connections_per_torrent: DEFAULT_MAX_CONNECTIONS_PER_TORRENT,
            startup_window: STARTUP_WINDOW,
            startup_min_rebuild_wait: STARTUP_MIN_REBUILD_WAIT,
            min_rebuild_wait: MIN_REBUILD_WAIT,
            bloom_rotation_period: BLOOM_ROTATION_PERIOD,
            bloom_filter_size: BLOOM_FILTER_SIZE,
            max_repeat_retries: MAX_REPEAT_RETRIES,
            exchanged_count_refresh: EXCHANGED_COUNT_REFRESH,
        }
    }
}

impl DiscoveryConfig {
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections_per_torrent = max;
        self
    }

    pub fn with_bloom_rotation_period(mut self, period: Duration) -> Self {
        self.bloom_rotation_period = period;
        self
    }

    pub fn with_max_repeat_retries(mut self, retries: usize) -> Self {
        self.max_repeat_retries = retries;
        self
    }

    /// Discovered peers are cached at twice the connection limit to allow
    /// for failed attempts, within `[1, MAX_DISCOVERED_PEERS]`.
    pub fn discovered_cache_cap(&self) -> usize {
        self.max_connections_per_torrent
            .saturating_mul(2)
            .clamp(1, MAX_DISCOVERED_PEERS)
    }

    /// How many connected-peer entries each exchange session keeps.
    pub fn known_peer_cap(&self) -> usize {
        self.max_connections_per_torrent
            .clamp(1, MAX_KNOWN_PEERS_PER_SESSION)
    }
}
