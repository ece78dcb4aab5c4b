/// Where a peer was first heard about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PeerSource {
    /// Returned by a tracker announce.
    Tracker = 0,
    /// Found through a DHT `get_peers` lookup.
    Dht = 1,
    /// Gossiped by a connected peer over PEX.
    PeerExchange = 2,
    /// Injected by a plugin or the user.
    Plugin = 3,
    /// Connected to us.
    Incoming = 4,
    /// Reached through a holepunch rendezvous.
    Holepunch = 5,
}

impl PeerSource {
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Maps a source id back to a tag, falling back to [`PeerSource::Tracker`]
    /// for ids this version doesn't know.
    pub fn from_id(id: u8) -> Self {
        match id {
            1 => PeerSource::Dht,
            2 => PeerSource::PeerExchange,
            3 => PeerSource::Plugin,
            4 => PeerSource::Incoming,
            5 => PeerSource::Holepunch,
            _ => PeerSource::Tracker,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PeerSource::Tracker => "tracker",
            PeerSource::Dht => "dht",
            PeerSource::PeerExchange => "pex",
            PeerSource::Plugin => "plugin",
            PeerSource::Incoming => "incoming",
            PeerSource::Holepunch => "holepunch",
        }
    }
}

/// The handshake a peer expects. Part of a peer's identity: the same
/// address reached with and without encryption is two different candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum HandshakeType {
    #[default]
    Plain = 0,
    Crypto = 1,
}

/// Encryption capability level advertised for a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CryptoLevel {
    #[default]
    Level1 = 1,
    Level2 = 2,
}

impl CryptoLevel {
    /// The level this client speaks.
    pub const CURRENT: CryptoLevel = CryptoLevel::Level2;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_roundtrip() {
        for source in [
            PeerSource::Tracker,
            PeerSource::Dht,
            PeerSource::PeerExchange,
            PeerSource::Plugin,
            PeerSource::Incoming,
            PeerSource::Holepunch,
        ] {
            assert_eq!(PeerSource::from_id(source.id()), source);
        }
    }

    #[test]
    fn test_unknown_source_id() {
        assert_eq!(PeerSource::from_id(200), PeerSource::Tracker);
    }
}
