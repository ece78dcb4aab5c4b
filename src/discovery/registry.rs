use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::Instant;

use super::bloom::RecentlyOffered;
use super::cache::DiscoveredCache;
use super::config::DiscoveryConfig;
use super::popularity::{least_popular_first, PopularityCache};
use crate::constants::STARTUP_PEX_INTERLEAVE;
use crate::peer::PeerIdentity;
use crate::pex::{ExchangeSession, SeedStatus};

/// Per-torrent peer discovery state.
///
/// Owns the exchange sessions of all connected PEX-capable peers, the
/// bounded caches of discovered-but-unconnected peers, and the
/// optimistic-connect selection that draws from both.
///
/// Every method takes the registry lock for its whole body, and the session
/// calls it makes happen while that lock is held rather than after it is
/// released. Nothing done under the lock blocks; session methods take their
/// own lock after the registry's, never the other way round.
pub struct DiscoveryRegistry {
    config: DiscoveryConfig,
    started: Instant,
    state: Mutex<RegistryState>,
}

struct RegistryState {
    sessions: HashMap<PeerIdentity, Arc<ExchangeSession>>,
    discovered: DiscoveredCache,
    discovered_non_public: DiscoveredCache,
    popularity: PopularityCache,
    recent: RecentlyOffered,
    self_peer: Option<PeerIdentity>,
    pex_used_count: u64,
    total_peers_returned: u64,
    exchanged_count: usize,
    exchanged_count_at: Option<Instant>,
}

/// A selection candidate and where it came from.
struct Candidate {
    peer: PeerIdentity,
    discovered: bool,
}

impl DiscoveryRegistry {
    pub fn new(config: DiscoveryConfig) -> Arc<Self> {
        let cap = config.discovered_cache_cap();
        let recent = RecentlyOffered::new(config.bloom_filter_size, config.bloom_rotation_period);
        Arc::new(Self {
            started: Instant::now(),
            state: Mutex::new(RegistryState {
                sessions: HashMap::new(),
                discovered: DiscoveredCache::new(cap),
                discovered_non_public: DiscoveredCache::new(cap),
                popularity: PopularityCache::default(),
                recent,
                self_peer: None,
                pex_used_count: 0,
                total_peers_returned: 0,
                exchanged_count: 0,
                exchanged_count_at: None,
            }),
            config,
        })
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Creates the exchange session for a newly connected peer.
    ///
    /// Every existing session and the new one are told about each other,
    /// except when both sides are seeds.
    pub fn register<S>(
        self: &Arc<Self>,
        peer: PeerIdentity,
        seed_status: S,
    ) -> Arc<ExchangeSession>
    where
        S: SeedStatus + 'static,
    {
        let session = Arc::new(ExchangeSession::new(
            peer.clone(),
            Arc::downgrade(self),
            Box::new(seed_status),
            self.config.known_peer_cap(),
        ));

        let mut state = self.state.lock();
        let new_is_seed = session.is_seed();
        for (existing_peer, existing) in &state.sessions {
            if existing_peer == &peer {
                continue;
            }
            if new_is_seed && existing.is_seed() {
                continue;
            }
            existing.record_peer_seen_by_remote(&peer);
            session.record_peer_seen_by_remote(existing_peer);
        }

        if state.sessions.insert(peer.clone(), session.clone()).is_some() {
            tracing::debug!(%peer, "replaced existing exchange session");
        }
        tracing::debug!(%peer, sessions = state.sessions.len(), "registered exchange session");

        session
    }

    /// Removes the session for `peer` and announces the drop to everyone else.
    pub fn deregister(&self, peer: &PeerIdentity) {
        let mut state = self.state.lock();
        if state.sessions.remove(peer).is_some() {
            state.announce_drop(peer);
        }
    }

    /// Removes `session` if it is still the registered session for its peer.
    ///
    /// A session that was replaced by a later registration of the same peer
    /// leaves the replacement alone.
    pub(crate) fn deregister_session(&self, session: &ExchangeSession) {
        let mut state = self.state.lock();
        let current = state
            .sessions
            .get(session.peer())
            .is_some_and(|registered| std::ptr::eq(registered.as_ref(), session));
        if !current {
            tracing::trace!(peer = %session.peer(), "destroyed session was already replaced");
            return;
        }
        state.sessions.remove(session.peer());
        state.announce_drop(session.peer());
    }

    /// Called when `session`'s remote becomes a seed. Every other seed and
    /// the new one stop advertising each other.
    ///
    /// Only non-seed to seed transitions are swept; the reverse is rare
    /// enough to leave alone.
    pub fn notify_seed_transition(&self, session: &ExchangeSession) {
        if !session.is_seed() {
            return;
        }

        let state = self.state.lock();
        let mut swept = 0usize;
        for other in state.sessions.values() {
            if std::ptr::eq(other.as_ref(), session) || !other.is_seed() {
                continue;
            }
            other.record_peer_gone_from_remote(session.peer());
            session.record_peer_gone_from_remote(other.peer());
            swept += 1;
        }
        tracing::debug!(peer = %session.peer(), swept, "seed transition");
    }

    /// Adds a peer learned from a tracker, the DHT, an incoming connection
    /// or similar.
    ///
    /// Ignored if any session already reports being connected to it, since
    /// PEX covers that peer.
    pub fn add_discovered_peer(&self, peer: PeerIdentity) {
        let mut state = self.state.lock();
        if state.sessions.values().any(|s| s.is_known_peer(&peer)) {
            tracing::trace!(%peer, "discovered peer already known via exchange");
            return;
        }
        state.insert_discovered(peer);
    }

    /// Picks the next peer to dial optimistically, if any.
    ///
    /// Fresh discoveries are preferred; exchanged peers fill in, and during
    /// the startup window every fifth pick comes from exchanged peers first.
    /// A peer handed out recently is skipped in favour of another candidate
    /// when one exists.
    pub fn next_optimistic_connect_peer(&self, want_non_public: bool) -> Option<PeerIdentity> {
        let mut state = self.state.lock();
        let now = Instant::now();
        let starting_up = now.duration_since(self.started) <= self.config.startup_window;
        let max_retries = self.config.max_repeat_retries;

        let mut repeats: Vec<Candidate> = Vec::new();
        let mut chosen = None;

        for attempt in 0..=max_retries {
            let candidate =
                match state.next_candidate(&self.config, now, starting_up, want_non_public) {
                    Some(candidate) => candidate,
                    None => break,
                };

            state.recent.rotate_if_due(now);

            if attempt < max_retries && state.recent.was_offered(candidate.peer.serialization()) {
                repeats.push(candidate);
                continue;
            }
            chosen = Some(candidate);
            break;
        }

        // with nothing fresher available the most recent repeat is returned
        let chosen = match chosen {
            Some(candidate) => candidate,
            None => {
                let last = repeats.pop();
                if last.is_some() {
                    tracing::debug!(
                        skipped = repeats.len() + 1,
                        "no fresh optimistic candidate, returning a repeat"
                    );
                }
                last?
            }
        };

        // skipped discoveries go back in the cache; skipped exchanged peers
        // are lost until the next popularity rebuild
        for skipped in repeats {
            if skipped.discovered {
                state.insert_discovered(skipped.peer);
            }
        }

        state.recent.record(chosen.peer.serialization());
        state.total_peers_returned += 1;
        Some(chosen.peer)
    }

    /// Number of exchanged peers not yet handed out from the current
    /// popularity snapshot. Recounted at most once per refresh interval.
    pub fn exchanged_peer_count(&self) -> usize {
        let mut state = self.state.lock();
        let now = Instant::now();
        let stale = match state.exchanged_count_at {
            Some(at) => now.duration_since(at) >= self.config.exchanged_count_refresh,
            None => true,
        };
        if stale {
            let count = least_popular_first(state.sessions.values()).map_or(0, |p| p.len());
            state.exchanged_count = count;
            state.exchanged_count_at = Some(now);
        }
        state
            .exchanged_count
            .saturating_sub(state.popularity.position())
    }

    /// How many optimistic candidates have come from exchanged peers.
    pub fn exchanged_peers_used(&self) -> u64 {
        self.state.lock().pex_used_count
    }

    /// How many optimistic candidates have been handed out in total.
    pub fn total_peers_returned(&self) -> u64 {
        self.state.lock().total_peers_returned
    }

    /// Discovered peers in priority order, optionally only those at `address`.
    pub fn discovered_peers(&self, address: Option<&str>) -> Vec<PeerIdentity> {
        let state = self.state.lock();
        state
            .discovered
            .iter()
            .filter(|peer| address.map_or(true, |a| peer.address_string() == a))
            .cloned()
            .collect()
    }

    pub fn discovered_peer_count(&self) -> usize {
        self.state.lock().discovered.len()
    }

    /// The non-public subset of the discovered cache, in priority order.
    pub fn discovered_non_public_peers(&self) -> Vec<PeerIdentity> {
        let state = self.state.lock();
        state.discovered_non_public.iter().cloned().collect()
    }

    pub fn discovered_non_public_count(&self) -> usize {
        self.state.lock().discovered_non_public.len()
    }

    /// Records our own externally visible identity.
    pub fn set_self(&self, peer: PeerIdentity) {
        self.state.lock().self_peer = Some(peer);
    }

    pub fn self_peer(&self) -> Option<PeerIdentity> {
        self.state.lock().self_peer.clone()
    }

    pub fn session(&self, peer: &PeerIdentity) -> Option<Arc<ExchangeSession>> {
        self.state.lock().sessions.get(peer).cloned()
    }

    pub fn session_count(&self) -> usize {
        self.state.lock().sessions.len()
    }
}

impl RegistryState {
    fn announce_drop(&self, peer: &PeerIdentity) {
        // seeds are notified too: the dropped peer may have been gossiped
        // before either side finished
        for session in self.sessions.values() {
            session.record_peer_gone_from_remote(peer);
        }
        tracing::debug!(%peer, sessions = self.sessions.len(), "deregistered exchange session");
    }

    fn insert_discovered(&mut self, peer: PeerIdentity) {
        if !self.discovered.insert(peer.clone()) {
            return;
        }
        if !peer.is_public() {
            self.discovered_non_public.insert(peer);
        }

        for evicted in self.discovered.evict_overflow() {
            self.discovered_non_public.remove(&evicted);
            tracing::trace!(peer = %evicted, "evicted discovered peer");
        }
        self.discovered_non_public.evict_overflow();
    }

    fn pop_discovered(&mut self, want_non_public: bool) -> Option<PeerIdentity> {
        if want_non_public {
            let peer = self.discovered_non_public.pop_best()?;
            self.discovered.remove(&peer);
            Some(peer)
        } else {
            let peer = self.discovered.pop_best()?;
            if !peer.is_public() {
                self.discovered_non_public.remove(&peer);
            }
            Some(peer)
        }
    }

    fn next_candidate(
        &mut self,
        config: &DiscoveryConfig,
        now: Instant,
        starting_up: bool,
        want_non_public: bool,
    ) -> Option<Candidate> {
        let mut tried_exchanged = false;

        if starting_up && self.total_peers_returned % STARTUP_PEX_INTERLEAVE == 0 {
            // exchanged peers are known to be live, which helps bootstrap
            if let Some(peer) = self.next_exchanged(config, now, starting_up, want_non_public) {
                return Some(Candidate {
                    peer,
                    discovered: false,
                });
            }
            tried_exchanged = true;
        }

        if let Some(peer) = self.pop_discovered(want_non_public) {
            return Some(Candidate {
                peer,
                discovered: true,
            });
        }

        if tried_exchanged {
            return None;
        }
        self.next_exchanged(config, now, starting_up, want_non_public)
            .map(|peer| Candidate {
                peer,
                discovered: false,
            })
    }

    fn next_exchanged(
        &mut self,
        config: &DiscoveryConfig,
        now: Instant,
        starting_up: bool,
        want_non_public: bool,
    ) -> Option<PeerIdentity> {
        if self.popularity.is_exhausted() {
            self.popularity.discard();
            let min_wait = if starting_up {
                config.startup_min_rebuild_wait
            } else {
                config.min_rebuild_wait
            };
            if self.popularity.may_rebuild(now, min_wait) {
                let peers = least_popular_first(self.sessions.values());
                tracing::debug!(
                    peers = peers.as_ref().map_or(0, |p| p.len()),
                    "rebuilt exchanged peer popularity cache"
                );
                self.popularity.install(peers, now);
            }
        }

        if want_non_public {
            self.popularity.next_non_public()
        } else {
            let peer = self.popularity.next_public(now)?;
            self.pex_used_count += 1;
            Some(peer)
        }
    }
}

impl fmt::Display for DiscoveryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        write!(
            f,
            "pc={},dp={}/{}",
            state.sessions.len(),
            state.discovered.len(),
            state.discovered_non_public.len()
        )
    }
}
