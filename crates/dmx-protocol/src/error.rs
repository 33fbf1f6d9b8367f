//! Error types for Art-Net packet parsing

use thiserror::Error;

/// Reasons a datagram is not accepted as an Art-Net packet
///
/// These never escape [`crate::decode`]; they exist so the reason a packet
/// was dropped can be traced while debugging a noisy network.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Datagram shorter than the fixed part of the packet
    #[error("packet too short: {len} bytes, need at least {needed}")]
    TooShort { len: usize, needed: usize },

    /// First 8 bytes are not `Art-Net\0`
    #[error("invalid Art-Net header")]
    InvalidHeader,

    /// Protocol version older than the minimum supported revision
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u16),

    /// Opcode this node does not handle
    #[error("unsupported opcode 0x{0:04X}")]
    UnsupportedOpcode(u16),

    /// ArtDmx length field larger than a universe
    #[error("DMX length {0} exceeds 512 channels")]
    LengthOutOfRange(u16),

    /// ArtDmx length field larger than the data actually carried
    #[error("truncated DMX data: header announces {announced} channels, {available} present")]
    Truncated { announced: usize, available: usize },
}
