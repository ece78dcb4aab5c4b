use std::fmt;

/// The network a peer address lives on.
///
/// Anything that isn't recognisably an overlay destination is treated as
/// reachable over the public internet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Network {
    #[default]
    Public,
    /// I2P destination (`*.i2p`).
    I2P,
    /// Tor onion service (`*.onion`).
    Tor,
}

impl Network {
    /// Classifies an address string.
    pub fn classify(address: &str) -> Self {
        let lower = address.trim_end_matches('.').to_ascii_lowercase();
        if lower.ends_with(".i2p") {
            Network::I2P
        } else if lower.ends_with(".onion") {
            Network::Tor
        } else {
            Network::Public
        }
    }

    pub fn is_public(self) -> bool {
        self == Network::Public
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Network::Public => "public",
            Network::I2P => "i2p",
            Network::Tor => "tor",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
