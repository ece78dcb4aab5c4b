//! Anti-repeat filters for optimistic-connect candidates.
//!
//! A peer handed out for dialing is remembered in a pair of add-only bloom
//! filters. Lookups consult only the older filter; every rotation period the
//! older one is thrown away, the newer one takes its place and a fresh one
//! starts accepting additions. A returned peer therefore stays suppressed for
//! between one and two rotation periods.

use sha1::{Digest, Sha1};
use tokio::time::{Duration, Instant};

use crate::constants::{BLOOM_BITS_PER_ENTRY, BLOOM_HASH_COUNT};

/// Add-only bloom filter keyed by byte strings.
pub(crate) struct BloomFilter {
    bits: Vec<u64>,
    num_bits: u64,
    entries: usize,
}

impl BloomFilter {
    pub fn new(expected_entries: usize) -> Self {
        let num_bits = (expected_entries.max(1) * BLOOM_BITS_PER_ENTRY).max(64) as u64;
        let words = num_bits.div_ceil(64) as usize;
        Self {
            bits: vec![0; words],
            num_bits,
            entries: 0,
        }
    }

    /// Double hashing over the two halves of a SHA-1 digest.
    fn probes(&self, key: &[u8]) -> impl Iterator<Item = u64> {
        let digest = Sha1::digest(key);
        let mut h1 = [0u8; 8];
        let mut h2 = [0u8; 8];
        h1.copy_from_slice(&digest[..8]);
        h2.copy_from_slice(&digest[8..16]);
        let h1 = u64::from_be_bytes(h1);
        let h2 = u64::from_be_bytes(h2) | 1;
        let num_bits = self.num_bits;

        (0..BLOOM_HASH_COUNT as u64).map(move |i| h1.wrapping_add(i.wrapping_mul(h2)) % num_bits)
    }

    pub fn add(&mut self, key: &[u8]) {
        let probes: Vec<u64> = self.probes(key).collect();
        for bit in probes {
            self.bits[(bit / 64) as usize] |= 1 << (bit % 64);
        }
        self.entries += 1;
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.probes(key)
            .all(|bit| self.bits[(bit / 64) as usize] & (1 << (bit % 64)) != 0)
    }

    pub fn entries(&self) -> usize {
        self.entries
    }
}

/// The rotating pair of filters.
pub(crate) struct RecentlyOffered {
    older: BloomFilter,
    newer: BloomFilter,
    filter_size: usize,
    period: Duration,
    last_rotation: Option<Instant>,
}

impl RecentlyOffered {
    pub fn new(filter_size: usize, period: Duration) -> Self {
        Self {
            older: BloomFilter::new(filter_size),
            newer: BloomFilter::new(filter_size),
            filter_size,
            period,
            last_rotation: None,
        }
    }

    /// Rotates the pair if a full period has passed since the last rotation.
    pub fn rotate_if_due(&mut self, now: Instant) -> bool {
        let due = match self.last_rotation {
            Some(last) => now.duration_since(last) > self.period,
            None => true,
        };
        if !due {
            return false;
        }

        let fresh = BloomFilter::new(self.filter_size);
        self.older = std::mem::replace(&mut self.newer, fresh);
        self.last_rotation = Some(now);
        tracing::trace!(carried = self.older.entries(), "rotated anti-repeat filters");
        true
    }

    pub fn was_offered(&self, key: &[u8]) -> bool {
        self.older.contains(key)
    }

    pub fn record(&mut self, key: &[u8]) {
        self.older.add(key);
        self.newer.add(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bloom_add_contains() {
        let mut filter = BloomFilter::new(100);
        filter.add(b"\x0a\x00\x00\x01\x1a\xe1");
        assert!(filter.contains(b"\x0a\x00\x00\x01\x1a\xe1"));
        assert!(!filter.contains(b"\x0a\x00\x00\x02\x1a\xe1"));
        assert_eq!(filter.entries(), 1);
    }

    #[test]
    fn test_bloom_false_positive_rate() {
        let mut filter = BloomFilter::new(1000);
        for i in 0u32..1000 {
            filter.add(&i.to_be_bytes());
        }
        let false_positives = (1000u32..11000)
            .filter(|i| filter.contains(&i.to_be_bytes()))
            .count();
        assert!(false_positives < 500, "{} false positives", false_positives);
    }

    #[test]
    fn test_rotation_keeps_one_generation() {
        let start = Instant::now();
        let period = Duration::from_secs(60);
        let mut recent = RecentlyOffered::new(100, period);

        assert!(recent.rotate_if_due(start));
        recent.record(b"peer-a");
        assert!(recent.was_offered(b"peer-a"));

        assert!(!recent.rotate_if_due(start + period));
        assert!(recent.rotate_if_due(start + period + Duration::from_secs(1)));
        assert!(recent.was_offered(b"peer-a"));

        assert!(recent.rotate_if_due(start + period * 2 + Duration::from_secs(2)));
        assert!(!recent.was_offered(b"peer-a"));
    }
}
