use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::peer::PeerIdentity;

/// Orders peers by priority (highest first), then by identity order.
#[derive(Clone, PartialEq, Eq)]
struct Ranked(PeerIdentity);

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .0
            .priority()
            .cmp(&self.0.priority())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A size-bounded set of not-yet-connected peers, best candidates first.
pub(crate) struct DiscoveredCache {
    entries: BTreeSet<Ranked>,
    cap: usize,
}

impl DiscoveredCache {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: BTreeSet::new(),
            cap,
        }
    }

    /// Inserts `peer`, returning false if it was already cached.
    pub fn insert(&mut self, peer: PeerIdentity) -> bool {
        self.entries.insert(Ranked(peer))
    }

    /// Drops lowest-priority entries until the cache is back within its cap.
    pub fn evict_overflow(&mut self) -> Vec<PeerIdentity> {
        let mut evicted = Vec::new();
        while self.entries.len() > self.cap {
            match self.entries.pop_last() {
                Some(Ranked(peer)) => evicted.push(peer),
                None => break,
            }
        }
        evicted
    }

    pub fn remove(&mut self, peer: &PeerIdentity) -> bool {
        self.entries.remove(&Ranked(peer.clone()))
    }

    /// Takes the highest-priority entry.
    pub fn pop_best(&mut self) -> Option<PeerIdentity> {
        self.entries.pop_first().map(|Ranked(peer)| peer)
    }

    #[cfg(test)]
    pub fn contains(&self, peer: &PeerIdentity) -> bool {
        self.entries.contains(&Ranked(peer.clone()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerIdentity> {
        self.entries.iter().map(|Ranked(peer)| peer)
    }
}
