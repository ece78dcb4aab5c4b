//! Discovered-peer caching and optimistic-connect selection.
//!
//! The [`DiscoveryRegistry`] is the per-torrent hub of peer discovery. The
//! connection layer registers an [`ExchangeSession`](crate::pex::ExchangeSession)
//! for each PEX-capable connection, feeds in peers found through trackers,
//! the DHT and incoming connections, and periodically asks for the next
//! peer to dial.
//!
//! # Selection
//!
//! Candidates come from two pools:
//!
//! - the discovered cache, a bounded priority-ordered set of peers nobody
//!   we're connected to has mentioned, drained best-first;
//! - the popularity cache, a snapshot of every peer our exchange sessions
//!   know about, ordered rarest first and rebuilt no more than once per
//!   rebuild interval.
//!
//! Peers handed out recently are tracked in rotating bloom filters and
//! skipped while another candidate is available.
//!
//! # Examples
//!
//! ```
//! use peerdb::discovery::{DiscoveryConfig, DiscoveryRegistry};
//! use peerdb::peer::{PeerIdentity, PeerSource};
//!
//! let registry = DiscoveryRegistry::new(DiscoveryConfig::default().with_max_connections(50));
//!
//! registry.add_discovered_peer(PeerIdentity::from_addr("203.0.113.5", 6881, PeerSource::Tracker));
//! registry.add_discovered_peer(PeerIdentity::from_addr("203.0.113.6", 6881, PeerSource::Dht));
//! assert_eq!(registry.discovered_peer_count(), 2);
//!
//! let first = registry.next_optimistic_connect_peer(false).unwrap();
//! let second = registry.next_optimistic_connect_peer(false).unwrap();
//! assert_ne!(first, second);
//! assert!(registry.next_optimistic_connect_peer(false).is_none());
//! ```

mod bloom;
mod cache;
mod config;
mod popularity;
mod registry;

pub use config::DiscoveryConfig;
pub use registry::DiscoveryRegistry;
