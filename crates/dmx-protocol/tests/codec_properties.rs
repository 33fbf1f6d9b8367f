//! Property tests for the Art-Net codec
//!
//! - `decode` drops every datagram with a wrong header or an old version
//! - every well-formed ArtDmx layout decodes to exactly the fields it carries
//! - poll replies always have the fixed 238-byte layout

use std::net::Ipv4Addr;

use dmx_protocol::{
    decode, EncodePacket, Frame, Packet, PollReply, HEADER, OP_DMX, OP_POLL, POLL_REPLY_LEN,
};
use proptest::prelude::*;

fn raw_dmx(version: u16, sequence: u8, physical: u8, universe: u16, channels: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(18 + channels.len());
    bytes.extend_from_slice(HEADER);
    bytes.extend_from_slice(&OP_DMX.to_le_bytes());
    bytes.extend_from_slice(&version.to_be_bytes());
    bytes.push(sequence);
    bytes.push(physical);
    bytes.extend_from_slice(&universe.to_le_bytes());
    bytes.extend_from_slice(&(channels.len() as u16).to_be_bytes());
    bytes.extend_from_slice(channels);
    bytes
}

fn opcode() -> impl Strategy<Value = u16> {
    prop_oneof![Just(OP_DMX), Just(OP_POLL), any::<u16>()]
}

proptest! {
    #[test]
    fn wrong_header_is_ignored(
        header in prop::array::uniform8(any::<u8>()).prop_filter("not Art-Net", |h| h != HEADER),
        rest in prop::collection::vec(any::<u8>(), 0..600),
    ) {
        let mut bytes = header.to_vec();
        bytes.extend_from_slice(&rest);
        prop_assert_eq!(decode(&bytes), Packet::Ignored);
    }

    #[test]
    fn old_version_is_ignored(
        version in 0u16..14,
        op in opcode(),
        rest in prop::collection::vec(any::<u8>(), 0..600),
    ) {
        let mut bytes = HEADER.to_vec();
        bytes.extend_from_slice(&op.to_le_bytes());
        bytes.extend_from_slice(&version.to_be_bytes());
        bytes.extend_from_slice(&rest);
        prop_assert_eq!(decode(&bytes), Packet::Ignored);
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..700)) {
        let _ = decode(&bytes);
    }

    #[test]
    fn dmx_fields_recovered(
        version in 14u16..=u16::MAX,
        sequence: u8,
        physical: u8,
        universe: u16,
        channels in prop::collection::vec(any::<u8>(), 0..=512),
    ) {
        let bytes = raw_dmx(version, sequence, physical, universe, &channels);
        let Packet::Dmx(frame) = decode(&bytes) else {
            return Err(TestCaseError::fail("expected DMX frame"));
        };
        prop_assert_eq!(frame.sequence, sequence);
        prop_assert_eq!(frame.physical, physical);
        prop_assert_eq!(frame.universe, universe);
        prop_assert_eq!(frame.length as usize, channels.len());
        prop_assert_eq!(frame.channels, channels);
    }

    #[test]
    fn trailing_bytes_after_channels_are_not_data(
        channels in prop::collection::vec(any::<u8>(), 0..100),
        trailer in prop::collection::vec(any::<u8>(), 1..20),
    ) {
        let mut bytes = raw_dmx(14, 0, 0, 0, &channels);
        bytes.extend_from_slice(&trailer);
        let Packet::Dmx(frame) = decode(&bytes) else {
            return Err(TestCaseError::fail("expected DMX frame"));
        };
        prop_assert_eq!(frame.channels, channels);
    }

    #[test]
    fn encoded_frame_decodes(universe: u16, channels in prop::collection::vec(any::<u8>(), 0..=512)) {
        let frame = Frame::new(9, 0, universe, channels);
        prop_assert_eq!(decode(&frame.encode()), Packet::Dmx(frame));
    }

    #[test]
    fn poll_reply_fixed_offsets(
        name in "[ -~]{0,80}",
        ip: [u8; 4],
        mac: [u8; 6],
    ) {
        let reply = PollReply::new(&name, Ipv4Addr::from(ip), mac);
        let buf = reply.encode();

        prop_assert_eq!(buf.len(), POLL_REPLY_LEN);
        prop_assert_eq!(&buf[8..10], &[0x00, 0x21]);
        prop_assert_eq!(&buf[10..14], &ip);
        prop_assert_eq!(&buf[14..16], &6454u16.to_le_bytes());
        prop_assert_eq!(buf[23], 0xA0);
        prop_assert_eq!(buf[212], 0x0C);
        prop_assert_eq!(&buf[201..207], &mac);

        let short = name.len().min(18);
        prop_assert_eq!(&buf[26..26 + short], &name.as_bytes()[..short]);
        let long = name.len().min(64);
        prop_assert_eq!(&buf[44..44 + long], &name.as_bytes()[..long]);
    }
}
