//! Deterministic peer priority.
//!
//! Loosely modelled on BEP-40 canonical peer priority: the address is masked
//! to its /24 (or /48) before hashing, so all hosts in one subnet share a
//! priority for a given port. Overlay addresses are hashed whole.

use sha1::{Digest, Sha1};

/// Computes the priority for a peer from its address bytes and TCP port.
///
/// `is_ip` says whether `address` holds a binary IPv4/IPv6 address; only
/// then is it masked. Higher is preferred. The value carries no meaning
/// beyond ordering.
pub fn peer_priority(address: &[u8], port: u16, is_ip: bool) -> u32 {
    let mut hasher = Sha1::new();
    match (is_ip, address.len()) {
        (true, 4) => hasher.update(&address[..3]),
        (true, 16) => hasher.update(&address[..6]),
        _ => hasher.update(address),
    }
    hasher.update(port.to_be_bytes());
    let digest = hasher.finalize();
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}
