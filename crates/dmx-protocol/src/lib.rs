//! Art-Net Protocol Library
//!
//! This crate provides decoding and encoding for the subset of the Art-Net
//! protocol a DMX output node needs:
//!
//! - **ArtDmx** (`0x5000`): one universe of up to 512 DMX channels
//! - **ArtPoll** (`0x2000`): discovery request from a controller
//! - **ArtPollReply** (`0x2100`): fixed 238-byte discovery answer
//!
//! # Architecture
//!
//! Art-Net shares UDP port 6454 with plenty of unrelated traffic, so
//! [`decode`] never fails: anything it does not understand comes back as
//! [`Packet::Ignored`]. The strict [`artnet::parse_packet`] is available when
//! the reason matters.
//!
//! # Example
//!
//! ```rust
//! use dmx_protocol::{decode, EncodePacket, Frame, Packet};
//!
//! let frame = Frame::new(1, 0, 0, vec![255, 0, 0]);
//! let bytes = frame.encode();
//!
//! match decode(&bytes) {
//!     Packet::Dmx(decoded) => assert_eq!(decoded.channels, vec![255, 0, 0]),
//!     other => panic!("unexpected packet: {other:?}"),
//! }
//! ```

pub mod artnet;
pub mod error;

pub use artnet::{
    decode, encode_poll, parse_packet, Frame, Packet, PollReply, ARTNET_PORT, HEADER, MAX_CHANNELS,
    MIN_PROTOCOL_VERSION, OP_DMX, OP_POLL, OP_POLL_REPLY, POLL_REPLY_LEN,
};
pub use error::ParseError;

/// Trait for packets that can be encoded to bytes
pub trait EncodePacket {
    /// Encode this packet to its wire format
    fn encode(&self) -> Vec<u8>;
}
