//! Tuning constants for peer exchange and optimistic-connect selection.
//!
//! These values are the defaults behind [`DiscoveryConfig`](crate::discovery::DiscoveryConfig).

use std::time::Duration;

// ============================================================================
// Connection limits
// ============================================================================

/// Default maximum connections per torrent when the caller does not supply one.
pub const DEFAULT_MAX_CONNECTIONS_PER_TORRENT: usize = 100;

/// Hard ceiling on the discovered-peer cache, regardless of connection limit.
pub const MAX_DISCOVERED_PEERS: usize = 500;

/// Hard ceiling on how many peers a single exchange session remembers as
/// connected to its remote.
pub const MAX_KNOWN_PEERS_PER_SESSION: usize = 500;

// ============================================================================
// Peer exchange
// ============================================================================

/// Default number of peers handed out per drained PEX volley.
pub const PEX_VOLLEY_SIZE: usize = 50;

// ============================================================================
// Optimistic connect
// ============================================================================

/// After the registry is created, selection runs in "startup" mode for this long.
pub const STARTUP_WINDOW: Duration = Duration::from_secs(120);

/// During startup, every Nth candidate is drawn from PEX data first.
pub const STARTUP_PEX_INTERLEAVE: u64 = 5;

/// Minimum time between popularity-cache rebuilds while starting up.
pub const STARTUP_MIN_REBUILD_WAIT: Duration = Duration::from_secs(10);

/// Minimum time between popularity-cache rebuilds in steady state.
pub const MIN_REBUILD_WAIT: Duration = Duration::from_secs(60);

/// Upper bound on how many repeated candidates are skipped in one selection.
pub const MAX_REPEAT_RETRIES: usize = 100;

/// The exchanged-peer count is recomputed at most this often.
pub const EXCHANGED_COUNT_REFRESH: Duration = Duration::from_secs(10);

// ============================================================================
// Anti-repeat bloom filters
// ============================================================================

/// How long a bloom filter accepts additions before it is rotated out.
/// A returned peer stays suppressed for between one and two periods.
pub const BLOOM_ROTATION_PERIOD: Duration = Duration::from_secs(7 * 60);

/// Expected number of entries per bloom filter.
pub const BLOOM_FILTER_SIZE: usize = 10_000;

/// Bits allocated per expected entry.
pub const BLOOM_BITS_PER_ENTRY: usize = 10;

/// Number of hash probes per key.
pub const BLOOM_HASH_COUNT: usize = 4;

// ============================================================================
// Peer encoding
// ============================================================================

/// Shortest valid serialized peer: an IPv4 address plus a port.
pub const MIN_SERIALIZED_PEER_LEN: usize = 6;

/// Longest accepted serialized peer: room for overlay identifiers beyond IPv6.
pub const MAX_SERIALIZED_PEER_LEN: usize = 32;
