use thiserror::Error;

/// Errors that can occur while building a peer identity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeerError {
    /// A serialized peer was shorter than an IPv4 address plus port, or
    /// longer than any address this client accepts.
    #[error("invalid peer encoding: {len} bytes")]
    InvalidPeerEncoding { len: usize },
}
