//! Peer Exchange (BEP-11) state tracking.
//!
//! This module keeps the per-connection bookkeeping behind PEX: which peers
//! still need to be announced to a remote as added or dropped, and which
//! peers that remote is known to be connected to. Encoding the resulting
//! batches onto the wire is left to the extension-protocol layer.
//!
//! Sessions are created by [`DiscoveryRegistry::register`](crate::discovery::DiscoveryRegistry::register)
//! and live as long as the connection does.
//!
//! # Examples
//!
//! ```
//! use peerdb::constants::PEX_VOLLEY_SIZE;
//! use peerdb::discovery::{DiscoveryConfig, DiscoveryRegistry};
//! use peerdb::peer::{PeerIdentity, PeerSource};
//!
//! let registry = DiscoveryRegistry::new(DiscoveryConfig::default());
//! let a = PeerIdentity::from_addr("198.51.100.1", 6881, PeerSource::Incoming);
//! let b = PeerIdentity::from_addr("198.51.100.2", 6881, PeerSource::Incoming);
//!
//! let session_a = registry.register(a.clone(), || false);
//! let session_b = registry.register(b.clone(), || false);
//!
//! // each side learns about the other
//! assert_eq!(session_a.drain_added(PEX_VOLLEY_SIZE, None), Some(vec![b]));
//! assert_eq!(session_b.drain_added(PEX_VOLLEY_SIZE, None), Some(vec![a]));
//! ```

mod seed;
mod session;

pub use seed::SeedStatus;
pub use session::ExchangeSession;

#[cfg(test)]
mod tests;
