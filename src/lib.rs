//! peerdb - Peer exchange bookkeeping and optimistic-connect selection
//!
//! This library tracks the peers a BitTorrent client learns about for a
//! torrent and decides which ones to tell connected peers about (BEP-11 Peer
//! Exchange) and which one to dial next when an optimistic connection slot
//! opens up.
//!
//! # Modules
//!
//! - [`peer`] - Interned peer identities, network classification and priority
//! - [`pex`] - Per-connection exchange sessions with pending add/drop sets
//! - [`discovery`] - Discovered-peer caches and optimistic-connect selection
//! - [`constants`] - Protocol limits and timing defaults

pub mod constants;
pub mod discovery;
pub mod peer;
pub mod pex;

pub use discovery::{DiscoveryConfig, DiscoveryRegistry};
pub use peer::{CryptoLevel, HandshakeType, Network, PeerError, PeerIdentity, PeerSource};
pub use pex::{ExchangeSession, SeedStatus};
