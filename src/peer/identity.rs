use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};

use super::error::PeerError;
use super::intern::{intern, PeerKey};
use super::network::Network;
use super::priority::peer_priority;
use super::source::{CryptoLevel, HandshakeType, PeerSource};
use crate::constants::{MAX_SERIALIZED_PEER_LEN, MIN_SERIALIZED_PEER_LEN};

/// One peer in the swarm, as seen by the discovery engine.
///
/// Identities are interned: every constructor returns the single
/// process-wide instance for a given (address, TCP port, UDP port,
/// handshake) tuple, so cloning is a reference-count bump and equality
/// usually short-circuits on pointer identity.
///
/// Metadata that doesn't take part in equality (source, crypto level,
/// speed hint) is whatever the first constructor supplied.
///
/// # Examples
///
/// ```
/// use peerdb::peer::{HandshakeType, PeerIdentity, PeerSource};
///
/// let a = PeerIdentity::from_addr("10.0.0.1", 6881, PeerSource::Tracker);
/// let b = PeerIdentity::from_addr("10.0.0.1", 6881, PeerSource::Dht);
/// assert_eq!(a, b);
/// assert!(PeerIdentity::ptr_eq(&a, &b));
///
/// // address bytes followed by the big-endian port
/// assert_eq!(&a.serialization()[..], &[10, 0, 0, 1, 0x1A, 0xE1]);
/// ```
#[derive(Clone)]
pub struct PeerIdentity(Arc<PeerData>);

struct PeerData {
    address: Bytes,
    address_string: String,
    serialization: Bytes,
    tcp_port: u16,
    udp_port: u16,
    source: PeerSource,
    handshake: HandshakeType,
    crypto_level: CryptoLevel,
    network: Network,
    is_ip: bool,
    up_speed_hint: u32,
    priority: u32,
    hash: u64,
}

impl PeerIdentity {
    /// Builds (or looks up) the identity for a peer given by address string.
    ///
    /// Public addresses that parse as IPv4/IPv6 are stored in binary form;
    /// anything else, such as an I2P destination or a hostname, is stored as
    /// its raw ASCII bytes.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        address: &str,
        tcp_port: u16,
        source: PeerSource,
        handshake: HandshakeType,
        udp_port: u16,
        crypto_level: CryptoLevel,
        up_speed_hint: u32,
    ) -> Self {
        let network = Network::classify(address);

        let parsed = match network {
            Network::Public => address.trim().parse::<IpAddr>().ok(),
            _ => None,
        };
        let (address_bytes, address_string) = match parsed {
            Some(ip) => (ip_octets(ip), ip.to_string()),
            None => (
                Bytes::copy_from_slice(address.as_bytes()),
                address.to_string(),
            ),
        };

        Self::canonical(
            PeerKey {
                address: address_bytes,
                tcp_port,
                udp_port,
                handshake,
            },
            address_string,
            network,
            parsed.is_some(),
            source,
            crypto_level,
            up_speed_hint,
        )
    }

    /// Shorthand for a plain-handshake peer with no UDP port.
    pub fn from_addr(address: &str, tcp_port: u16, source: PeerSource) -> Self {
        Self::create(
            address,
            tcp_port,
            source,
            HandshakeType::Plain,
            0,
            CryptoLevel::Level1,
            0,
        )
    }

    /// Builds (or looks up) the identity from its compact serialization:
    /// address bytes followed by a big-endian TCP port.
    ///
    /// Returns [`PeerError::InvalidPeerEncoding`] if `bytes` is shorter than
    /// an IPv4 peer or longer than 32 bytes.
    pub fn from_serialization(
        bytes: &[u8],
        source: PeerSource,
        handshake: HandshakeType,
        udp_port: u16,
        network: Network,
    ) -> Result<Self, PeerError> {
        if bytes.len() < MIN_SERIALIZED_PEER_LEN || bytes.len() > MAX_SERIALIZED_PEER_LEN {
            return Err(PeerError::InvalidPeerEncoding { len: bytes.len() });
        }

        let split = bytes.len() - 2;
        let tcp_port = u16::from_be_bytes([bytes[split], bytes[split + 1]]);
        let address = Bytes::copy_from_slice(&bytes[..split]);

        // a public peer of IP length is taken to be a binary address
        let ip = match network {
            Network::Public => ip_from_octets(&address),
            _ => None,
        };
        let address_string = match ip {
            Some(ip) => ip.to_string(),
            None => String::from_utf8_lossy(&address).into_owned(),
        };

        Ok(Self::canonical(
            PeerKey {
                address,
                tcp_port,
                udp_port,
                handshake,
            },
            address_string,
            network,
            ip.is_some(),
            source,
            CryptoLevel::Level1,
            0,
        ))
    }

    fn canonical(
        key: PeerKey,
        address_string: String,
        network: Network,
        is_ip: bool,
        source: PeerSource,
        crypto_level: CryptoLevel,
        up_speed_hint: u32,
    ) -> Self {
        intern(key, |key| {
            let mut buf = BytesMut::with_capacity(key.address.len() + 2);
            buf.put_slice(&key.address);
            buf.put_u16(key.tcp_port);

            let mut hasher = DefaultHasher::new();
            key.hash(&mut hasher);

            PeerIdentity(Arc::new(PeerData {
                address: key.address.clone(),
                address_string,
                serialization: buf.freeze(),
                tcp_port: key.tcp_port,
                udp_port: key.udp_port,
                source,
                handshake: key.handshake,
                crypto_level,
                network,
                is_ip,
                up_speed_hint,
                priority: peer_priority(&key.address, key.tcp_port, is_ip),
                hash: hasher.finish(),
            }))
        })
    }

    /// Returns true if both handles point at the same interned instance.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Raw address bytes: 4 or 16 for IP peers, ASCII for overlay peers.
    pub fn address_bytes(&self) -> &[u8] {
        &self.0.address
    }

    pub fn address_string(&self) -> &str {
        &self.0.address_string
    }

    /// The IP address, for peers stored in binary form.
    ///
    /// Hostnames kept as text have none, whatever their length.
    pub fn ip(&self) -> Option<IpAddr> {
        if self.0.is_ip {
            ip_from_octets(&self.0.address)
        } else {
            None
        }
    }

    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.ip().map(|ip| SocketAddr::new(ip, self.0.tcp_port))
    }

    pub fn tcp_port(&self) -> u16 {
        self.0.tcp_port
    }

    pub fn udp_port(&self) -> u16 {
        self.0.udp_port
    }

    pub fn source(&self) -> PeerSource {
        self.0.source
    }

    pub fn handshake_type(&self) -> HandshakeType {
        self.0.handshake
    }

    pub fn crypto_level(&self) -> CryptoLevel {
        self.0.crypto_level
    }

    pub fn network(&self) -> Network {
        self.0.network
    }

    pub fn is_public(&self) -> bool {
        self.0.network.is_public()
    }

    pub fn up_speed_hint(&self) -> u32 {
        self.0.up_speed_hint
    }

    /// Ordering score for the discovered-peer cache. Higher is tried first.
    pub fn priority(&self) -> u32 {
        self.0.priority
    }

    /// Address bytes followed by the big-endian TCP port.
    ///
    /// Stable for the lifetime of the process, which is what the anti-repeat
    /// filters key on.
    pub fn serialization(&self) -> &Bytes {
        &self.0.serialization
    }
}

fn ip_octets(ip: IpAddr) -> Bytes {
    match ip {
        IpAddr::V4(v4) => Bytes::copy_from_slice(&v4.octets()),
        IpAddr::V6(v6) => Bytes::copy_from_slice(&v6.octets()),
    }
}

fn ip_from_octets(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => Some(IpAddr::V4(Ipv4Addr::new(
            bytes[0], bytes[1], bytes[2], bytes[3],
        ))),
        16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(bytes);
            Some(IpAddr::V6(Ipv6Addr::from(octets)))
        }
        _ => None,
    }
}

impl PartialEq for PeerIdentity {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        self.0.tcp_port == other.0.tcp_port
            && self.0.udp_port == other.0.udp_port
            && self.0.handshake == other.0.handshake
            && self.0.address == other.0.address
    }
}

impl Eq for PeerIdentity {}

impl Hash for PeerIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl Ord for PeerIdentity {
    /// Tie-breaking order: TCP port, UDP port, address length, address bytes.
    /// The handshake type only separates otherwise identical peers.
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .tcp_port
            .cmp(&other.0.tcp_port)
            .then_with(|| self.0.udp_port.cmp(&other.0.udp_port))
            .then_with(|| self.0.address.len().cmp(&other.0.address.len()))
            .then_with(|| self.0.address.cmp(&other.0.address))
            .then_with(|| self.0.handshake.cmp(&other.0.handshake))
    }
}

impl PartialOrd for PeerIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for PeerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerIdentity")
            .field("address", &self.0.address_string)
            .field("tcp_port", &self.0.tcp_port)
            .field("udp_port", &self.0.udp_port)
            .field("handshake", &self.0.handshake)
            .field("network", &self.0.network)
            .finish()
    }
}

impl fmt::Display for PeerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.socket_addr() {
            Some(addr) => write!(f, "{}", addr),
            None => write!(f, "{}:{}", self.0.address_string, self.0.tcp_port),
        }
    }
}
