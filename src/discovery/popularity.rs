use std::collections::HashMap;
use std::sync::Arc;

use tokio::time::{Duration, Instant};

use crate::peer::PeerIdentity;
use crate::pex::ExchangeSession;

/// Collects every peer known to any session and orders them rarest first.
///
/// A peer that few of our connections know about is less likely to be well
/// connected already, so it makes a better optimistic target. Returns `None`
/// when no session knows of any peer.
pub(crate) fn least_popular_first<'a>(
    sessions: impl Iterator<Item = &'a Arc<ExchangeSession>>,
) -> Option<Vec<PeerIdentity>> {
    let mut counts: HashMap<PeerIdentity, usize> = HashMap::new();
    for session in sessions {
        for peer in session.known_peers() {
            *counts.entry(peer).or_insert(0) += 1;
        }
    }

    if counts.is_empty() {
        return None;
    }

    let mut ranked: Vec<(PeerIdentity, usize)> = counts.into_iter().collect();
    ranked.sort_by_key(|(_, count)| *count);
    Some(ranked.into_iter().map(|(peer, _)| peer).collect())
}

/// Snapshot of exchanged peers with independent public and non-public cursors.
#[derive(Default)]
pub(crate) struct PopularityCache {
    peers: Option<Vec<PeerIdentity>>,
    pos: usize,
    pos_non_public: usize,
    last_rebuild: Option<Instant>,
}

impl PopularityCache {
    /// True when there is no snapshot or the public cursor has reached its end.
    pub fn is_exhausted(&self) -> bool {
        match &self.peers {
            Some(peers) => self.pos >= peers.len(),
            None => true,
        }
    }

    /// Whether enough time has passed since the last rebuild to allow another.
    pub fn may_rebuild(&self, now: Instant, min_wait: Duration) -> bool {
        match self.last_rebuild {
            Some(last) => now.duration_since(last) > min_wait,
            None => true,
        }
    }

    pub fn discard(&mut self) {
        self.peers = None;
    }

    pub fn install(&mut self, peers: Option<Vec<PeerIdentity>>, now: Instant) {
        self.peers = peers;
        self.pos = 0;
        self.pos_non_public = 0;
        self.last_rebuild = Some(now);
    }

    /// Public cursor read. Holds off the next rebuild for a full wait after
    /// the snapshot runs dry.
    pub fn next_public(&mut self, now: Instant) -> Option<PeerIdentity> {
        let peers = self.peers.as_ref()?;
        let peer = peers.get(self.pos)?.clone();
        self.pos += 1;
        if !peer.is_public() {
            self.pos_non_public = self.pos_non_public.max(self.pos);
        }
        self.last_rebuild = Some(now);
        Some(peer)
    }

    /// Scans forward from the non-public cursor without touching the public one.
    pub fn next_non_public(&mut self) -> Option<PeerIdentity> {
        let peers = self.peers.as_ref()?;
        while self.pos_non_public < peers.len() {
            let peer = &peers[self.pos_non_public];
            self.pos_non_public += 1;
            if !peer.is_public() {
                return Some(peer.clone());
            }
        }
        None
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}
