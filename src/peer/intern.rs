use std::sync::LazyLock;

use bytes::Bytes;
use dashmap::DashMap;

use super::identity::PeerIdentity;
use super::source::HandshakeType;

/// The fields that decide whether two peers are the same peer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PeerKey {
    pub address: Bytes,
    pub tcp_port: u16,
    pub udp_port: u16,
    pub handshake: HandshakeType,
}

static POOL: LazyLock<DashMap<PeerKey, PeerIdentity>> = LazyLock::new(DashMap::new);

/// Returns the process-wide instance for `key`, building it on first sight.
///
/// Lookups for already-known peers take only a shard read lock. When two
/// threads race to insert the same key the entry API picks one winner and
/// both callers get it.
pub(crate) fn intern(key: PeerKey, build: impl FnOnce(&PeerKey) -> PeerIdentity) -> PeerIdentity {
    if let Some(existing) = POOL.get(&key) {
        return existing.value().clone();
    }
    let built = POOL.entry(key.clone()).or_insert_with(|| build(&key));
    built.value().clone()
}

/// Number of distinct peers ever interned by this process.
pub fn interned_count() -> usize {
    POOL.len()
}
