//! Art-Net packet codec
//!
//! # Packet Layout
//! ```text
//! offset  size  field
//!      0     8  "Art-Net\0"
//!      8     2  opcode (little-endian)
//!     10     2  protocol version (big-endian, >= 14)
//! ArtDmx only:
//!     12     1  sequence
//!     13     1  physical input port
//!     14     2  universe (little-endian)
//!     16     2  length (big-endian, <= 512)
//!     18     n  DMX channel data
//! ```
//!
//! ArtPollReply is a fixed 238-byte structure; see [`PollReply`].

use std::net::Ipv4Addr;

use crate::error::ParseError;
use crate::EncodePacket;

/// UDP port used by every Art-Net node and controller
pub const ARTNET_PORT: u16 = 6454;
/// Packet identifier present at the start of every Art-Net datagram
pub const HEADER: &[u8; 8] = b"Art-Net\0";
/// ArtDmx opcode
pub const OP_DMX: u16 = 0x5000;
/// ArtPoll opcode
pub const OP_POLL: u16 = 0x2000;
/// ArtPollReply opcode
pub const OP_POLL_REPLY: u16 = 0x2100;
/// Oldest protocol revision accepted
pub const MIN_PROTOCOL_VERSION: u16 = 14;
/// Number of channels in a DMX universe
pub const MAX_CHANNELS: usize = 512;
/// Size of an encoded ArtPollReply
pub const POLL_REPLY_LEN: usize = 238;
/// Protocol revision written into encoded packets
const PROTOCOL_VERSION: u16 = 14;
/// ESTA manufacturer code sent in poll replies
const ESTA_CODE: &[u8; 2] = b"tm";

/// Header + opcode + version
const BASE_LEN: usize = 12;
/// Fixed part of an ArtDmx packet
const DMX_HEADER_LEN: usize = 18;

const SHORT_NAME_LEN: usize = 18;
const LONG_NAME_LEN: usize = 64;

/// One decoded ArtDmx packet
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    /// Sequence number (0 = sequencing disabled)
    pub sequence: u8,
    /// Physical input port on the sender
    pub physical: u8,
    /// 15-bit port address
    pub universe: u16,
    /// Number of channels announced by the sender
    pub length: u16,
    /// Channel values, `length` entries
    pub channels: Vec<u8>,
}

impl Frame {
    /// Create a frame whose length matches `channels`
    ///
    /// Channels beyond 512 are dropped.
    pub fn new(sequence: u8, physical: u8, universe: u16, mut channels: Vec<u8>) -> Self {
        channels.truncate(MAX_CHANNELS);
        Self {
            sequence,
            physical,
            universe,
            length: channels.len() as u16,
            channels,
        }
    }
}

impl EncodePacket for Frame {
    fn encode(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(DMX_HEADER_LEN + self.channels.len());
        packet.extend_from_slice(HEADER);
        packet.extend_from_slice(&OP_DMX.to_le_bytes());
        packet.extend_from_slice(&PROTOCOL_VERSION.to_be_bytes());
        packet.push(self.sequence);
        packet.push(self.physical);
        packet.extend_from_slice(&self.universe.to_le_bytes());
        packet.extend_from_slice(&(self.channels.len() as u16).to_be_bytes());
        packet.extend_from_slice(&self.channels);
        packet
    }
}

/// Result of decoding one datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// ArtDmx data frame
    Dmx(Frame),
    /// ArtPoll discovery request
    Poll,
    /// Anything else: wrong header, old version, unhandled opcode, malformed
    Ignored,
}

/// Decode a datagram, dropping anything that is not a usable Art-Net packet
pub fn decode(bytes: &[u8]) -> Packet {
    match parse_packet(bytes) {
        Ok(packet) => packet,
        Err(e) => {
            tracing::trace!("Ignoring datagram ({} bytes): {}", bytes.len(), e);
            Packet::Ignored
        }
    }
}

/// Strict parser behind [`decode`]
///
/// Only ever returns [`Packet::Dmx`] or [`Packet::Poll`] on success.
pub fn parse_packet(bytes: &[u8]) -> Result<Packet, ParseError> {
    if bytes.len() < BASE_LEN {
        if bytes.len() >= HEADER.len() && &bytes[..HEADER.len()] != HEADER {
            return Err(ParseError::InvalidHeader);
        }
        return Err(ParseError::TooShort {
            len: bytes.len(),
            needed: BASE_LEN,
        });
    }

    if &bytes[..HEADER.len()] != HEADER {
        return Err(ParseError::InvalidHeader);
    }

    let opcode = u16::from_le_bytes([bytes[8], bytes[9]]);
    let version = u16::from_be_bytes([bytes[10], bytes[11]]);

    if version < MIN_PROTOCOL_VERSION {
        return Err(ParseError::UnsupportedVersion(version));
    }

    match opcode {
        OP_DMX => parse_dmx(bytes).map(Packet::Dmx),
        OP_POLL => Ok(Packet::Poll),
        other => Err(ParseError::UnsupportedOpcode(other)),
    }
}

fn parse_dmx(bytes: &[u8]) -> Result<Frame, ParseError> {
    if bytes.len() < DMX_HEADER_LEN {
        return Err(ParseError::TooShort {
            len: bytes.len(),
            needed: DMX_HEADER_LEN,
        });
    }

    let sequence = bytes[12];
    let physical = bytes[13];
    let universe = u16::from_le_bytes([bytes[14], bytes[15]]);
    let length = u16::from_be_bytes([bytes[16], bytes[17]]);

    if length as usize > MAX_CHANNELS {
        return Err(ParseError::LengthOutOfRange(length));
    }

    let data = &bytes[DMX_HEADER_LEN..];
    if data.len() < length as usize {
        return Err(ParseError::Truncated {
            announced: length as usize,
            available: data.len(),
        });
    }

    Ok(Frame {
        sequence,
        physical,
        universe,
        length,
        channels: data[..length as usize].to_vec(),
    })
}

/// Encode an ArtPoll request (controller side; used by simulators)
pub fn encode_poll() -> Vec<u8> {
    let mut packet = Vec::with_capacity(14);
    packet.extend_from_slice(HEADER);
    packet.extend_from_slice(&OP_POLL.to_le_bytes());
    packet.extend_from_slice(&PROTOCOL_VERSION.to_be_bytes());
    // TalkToMe, Priority
    packet.extend_from_slice(&[0, 0]);
    packet
}

/// ArtPollReply describing this node
///
/// The layout is byte-exact; controllers and discovery tools reject replies
/// with fields at other offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReply {
    /// Short node name (at most 18 bytes on the wire)
    pub short_name: String,
    /// Long node name (at most 64 bytes on the wire)
    pub long_name: String,
    /// IPv4 address of the node
    pub ip: Ipv4Addr,
    /// MAC address of the node
    pub mac: [u8; 6],
    /// UDP port the node listens on
    pub port: u16,
}

impl PollReply {
    /// Create a reply using the same name for both name fields
    pub fn new(name: &str, ip: Ipv4Addr, mac: [u8; 6]) -> Self {
        Self {
            short_name: name.to_string(),
            long_name: name.to_string(),
            ip,
            mac,
            port: ARTNET_PORT,
        }
    }
}

impl EncodePacket for PollReply {
    fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; POLL_REPLY_LEN];

        buf[0..8].copy_from_slice(HEADER);
        buf[8..10].copy_from_slice(&OP_POLL_REPLY.to_le_bytes());
        buf[10..14].copy_from_slice(&self.ip.octets());
        buf[14..16].copy_from_slice(&self.port.to_le_bytes());
        buf[23] = 0xA0; // Status1
        buf[24..26].copy_from_slice(ESTA_CODE);
        write_name(&mut buf[26..26 + SHORT_NAME_LEN], &self.short_name);
        write_name(&mut buf[44..44 + LONG_NAME_LEN], &self.long_name);
        buf[173] = 1; // NumPorts
        buf[174] = 0x0F; // PortTypes[0]: can output DMX
        buf[183] = 0x0F; // GoodOutput[0]
        buf[190] = 0; // SwOut[0]
        buf[201..207].copy_from_slice(&self.mac);
        buf[212] = 0x0C; // Status2

        buf
    }
}

/// Copy `name` into a fixed-width field, truncating; the buffer is already zeroed
fn write_name(field: &mut [u8], name: &str) {
    let bytes = name.as_bytes();
    let len = bytes.len().min(field.len());
    field[..len].copy_from_slice(&bytes[..len]);
}
