//! Error types for the bridge engine

use std::net::SocketAddr;

use thiserror::Error;

/// Errors that can occur in the bridge engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// DMX start address outside the usable range
    #[error("invalid DMX address {0} (valid range 1-511)")]
    InvalidAddress(u16),

    /// Configuration value that cannot be used
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The Art-Net UDP port could not be bound
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        /// Requested bind address
        addr: SocketAddr,
        /// Underlying socket error
        #[source]
        source: std::io::Error,
    },

    /// Local IPv4/MAC identity could not be determined
    #[error("cannot determine network identity: {0}")]
    NetworkIdentity(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
