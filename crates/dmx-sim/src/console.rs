//! Virtual lighting console
//!
//! Holds a 512-channel universe and produces protocol-accurate ArtDmx and
//! ArtPoll datagrams, the way a desk or media server would.

use dmx_protocol::{encode_poll, EncodePacket, Frame, MAX_CHANNELS};
use serde::{Deserialize, Serialize};

/// Configuration for creating a virtual console
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualConsoleConfig {
    /// Universe the console transmits
    pub universe: u16,
    /// Number of channels sent per frame (trailing channels are omitted)
    pub channel_count: usize,
}

impl Default for VirtualConsoleConfig {
    fn default() -> Self {
        Self {
            universe: 0,
            channel_count: MAX_CHANNELS,
        }
    }
}

/// A simulated Art-Net controller
#[derive(Debug, Clone)]
pub struct VirtualConsole {
    universe: u16,
    channels: Vec<u8>,
    sequence: u8,
}

impl VirtualConsole {
    /// Create a console sending all 512 channels of `universe`
    pub fn new(universe: u16) -> Self {
        Self::from_config(VirtualConsoleConfig {
            universe,
            ..VirtualConsoleConfig::default()
        })
    }

    /// Create a console from configuration
    pub fn from_config(config: VirtualConsoleConfig) -> Self {
        Self {
            universe: config.universe,
            channels: vec![0; config.channel_count.min(MAX_CHANNELS)],
            sequence: 0,
        }
    }

    /// Universe this console transmits
    pub fn universe(&self) -> u16 {
        self.universe
    }

    /// Current channel values (index 0 is address 1)
    pub fn channels(&self) -> &[u8] {
        &self.channels
    }

    /// Set the channel at 1-based `address`; out-of-range addresses are ignored
    pub fn set_channel(&mut self, address: usize, value: u8) {
        if let Some(slot) = address
            .checked_sub(1)
            .and_then(|i| self.channels.get_mut(i))
        {
            *slot = value;
        }
    }

    /// Set three consecutive channels starting at 1-based `address`
    pub fn set_rgb(&mut self, address: usize, r: u8, g: u8, b: u8) {
        self.set_channel(address, r);
        self.set_channel(address + 1, g);
        self.set_channel(address + 2, b);
    }

    /// Set every channel to zero
    pub fn blackout(&mut self) {
        self.channels.fill(0);
    }

    /// Frame for the current state, advancing the sequence number
    ///
    /// Sequence runs 1..=255 and wraps back to 1; 0 means "sequencing off"
    /// on the wire and is never produced.
    pub fn frame(&mut self) -> Frame {
        self.sequence = if self.sequence == u8::MAX {
            1
        } else {
            self.sequence + 1
        };
        Frame::new(self.sequence, 0, self.universe, self.channels.clone())
    }

    /// ArtDmx datagram for the current state
    pub fn dmx_packet(&mut self) -> Vec<u8> {
        self.frame().encode()
    }

    /// ArtPoll datagram
    pub fn poll_packet(&self) -> Vec<u8> {
        encode_poll()
    }
}
