//! Peer identities.
//!
//! A [`PeerIdentity`] is the canonical, interned value for "one peer" used
//! throughout the discovery engine: as a map key for exchange sessions, as a
//! member of the discovered-peer caches, and (through its compact
//! serialization) as the key of the anti-repeat bloom filters.

mod error;
mod identity;
mod intern;
mod network;
mod priority;
mod source;

pub use error::PeerError;
pub use identity::PeerIdentity;
pub use intern::interned_count;
pub use network::Network;
pub use priority::peer_priority;
pub use source::{CryptoLevel, HandshakeType, PeerSource};
