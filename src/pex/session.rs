use std::collections::HashSet;
use std::fmt;
use std::sync::Weak;

use indexmap::IndexSet;
use parking_lot::Mutex;

use super::seed::SeedStatus;
use crate::discovery::DiscoveryRegistry;
use crate::peer::{Network, PeerIdentity};

/// Per-connection peer exchange state.
///
/// One session exists for every connected remote that takes part in PEX.
/// It buffers the net changes ("added" / "dropped") that are still to be
/// gossiped to that remote, and remembers which peers the remote is known
/// to be connected to so the registry can skip redundant discoveries and
/// rank peers by popularity.
///
/// A peer is never pending in both `added` and `dropped`: recording the
/// opposite transition cancels the pending one, so only the last change
/// since the previous drain survives.
pub struct ExchangeSession {
    peer: PeerIdentity,
    registry: Weak<DiscoveryRegistry>,
    seed_status: Box<dyn SeedStatus>,
    known_peer_cap: usize,
    state: Mutex<SessionState>,
}

struct SessionState {
    added: IndexSet<PeerIdentity>,
    dropped: IndexSet<PeerIdentity>,
    known: HashSet<PeerIdentity>,
    maintaining: bool,
}

impl SessionState {
    fn clear(&mut self) {
        self.added.clear();
        self.dropped.clear();
        self.known.clear();
    }
}

impl ExchangeSession {
    pub(crate) fn new(
        peer: PeerIdentity,
        registry: Weak<DiscoveryRegistry>,
        seed_status: Box<dyn SeedStatus>,
        known_peer_cap: usize,
    ) -> Self {
        Self {
            peer,
            registry,
            seed_status,
            known_peer_cap,
            state: Mutex::new(SessionState {
                added: IndexSet::new(),
                dropped: IndexSet::new(),
                known: HashSet::new(),
                maintaining: true,
            }),
        }
    }

    /// The remote peer this session represents.
    pub fn peer(&self) -> &PeerIdentity {
        &self.peer
    }

    pub fn is_seed(&self) -> bool {
        self.seed_status.is_seed()
    }

    pub fn is_maintaining(&self) -> bool {
        self.state.lock().maintaining
    }

    /// Records that `peer` should be advertised to the remote as added.
    /// Cancels a pending drop of the same peer instead, if there is one.
    pub fn record_peer_seen_by_remote(&self, peer: &PeerIdentity) {
        let mut state = self.state.lock();
        if !state.maintaining {
            return;
        }
        if state.dropped.shift_remove(peer) {
            return;
        }
        state.added.insert(peer.clone());
    }

    /// Records that `peer` should be advertised to the remote as dropped.
    /// Cancels a pending add of the same peer instead, if there is one.
    pub fn record_peer_gone_from_remote(&self, peer: &PeerIdentity) {
        let mut state = self.state.lock();
        if !state.maintaining {
            return;
        }
        if state.added.shift_remove(peer) {
            return;
        }
        state.dropped.insert(peer.clone());
    }

    /// Takes up to `max_batch` pending additions in the order they were recorded.
    ///
    /// Returns `None` when nothing is pending. With a `network` filter the
    /// batch holds only peers on that network, but every entry visited on
    /// the way is consumed: peers on other networks are discarded rather
    /// than kept for a later drain.
    pub fn drain_added(
        &self,
        max_batch: usize,
        network: Option<Network>,
    ) -> Option<Vec<PeerIdentity>> {
        let mut state = self.state.lock();
        drain_batch(&mut state.added, max_batch, network)
    }

    /// Takes up to `max_batch` pending drops. Same rules as [`drain_added`](Self::drain_added).
    pub fn drain_dropped(
        &self,
        max_batch: usize,
        network: Option<Network>,
    ) -> Option<Vec<PeerIdentity>> {
        let mut state = self.state.lock();
        drain_batch(&mut state.dropped, max_batch, network)
    }

    pub fn pending_added_count(&self) -> usize {
        self.state.lock().added.len()
    }

    pub fn pending_dropped_count(&self) -> usize {
        self.state.lock().dropped.len()
    }

    /// Notes that the remote is connected to `peer`. Ignored once the
    /// known-peer set is full.
    pub fn mark_locally_known_peer(&self, peer: &PeerIdentity) {
        let mut state = self.state.lock();
        if !state.maintaining || state.known.len() >= self.known_peer_cap {
            return;
        }
        state.known.insert(peer.clone());
    }

    pub fn forget_locally_known_peer(&self, peer: &PeerIdentity) {
        let mut state = self.state.lock();
        if !state.maintaining {
            return;
        }
        state.known.remove(peer);
    }

    pub fn is_known_peer(&self, peer: &PeerIdentity) -> bool {
        self.state.lock().known.contains(peer)
    }

    /// Snapshot of the peers the remote is known to be connected to.
    pub fn known_peers(&self) -> Vec<PeerIdentity> {
        self.state.lock().known.iter().cloned().collect()
    }

    pub fn known_peer_count(&self) -> usize {
        self.state.lock().known.len()
    }

    /// Tells the owning registry that this remote has become a seed.
    pub fn notify_seed_transition(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.notify_seed_transition(self);
        }
    }

    /// Stops tracking and throws away all pending and known state.
    pub fn disable_state_maintenance(&self) {
        let mut state = self.state.lock();
        state.maintaining = false;
        state.clear();
    }

    /// Resumes tracking from an empty state.
    pub fn enable_state_maintenance(&self) {
        self.state.lock().maintaining = true;
    }

    /// Deregisters from the owning registry and clears all state.
    ///
    /// If the peer has since been registered again, the newer session stays.
    pub fn destroy(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.deregister_session(self);
        }
        let mut state = self.state.lock();
        state.maintaining = false;
        state.clear();
    }
}

fn drain_batch(
    pending: &mut IndexSet<PeerIdentity>,
    max_batch: usize,
    network: Option<Network>,
) -> Option<Vec<PeerIdentity>> {
    if pending.is_empty() {
        return None;
    }

    match network {
        None => {
            let take = max_batch.min(pending.len());
            Some(pending.drain(..take).collect())
        }
        Some(network) => {
            let mut batch = Vec::new();
            let mut visited = 0;
            for peer in pending.iter() {
                if batch.len() >= max_batch {
                    break;
                }
                visited += 1;
                if peer.network() == network {
                    batch.push(peer.clone());
                }
            }
            pending.drain(..visited).for_each(drop);
            Some(batch)
        }
    }
}

impl fmt::Debug for ExchangeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ExchangeSession")
            .field("peer", &self.peer)
            .field("added", &state.added.len())
            .field("dropped", &state.dropped.len())
            .field("known", &state.known.len())
            .field("maintaining", &state.maintaining)
            .finish()
    }
}
