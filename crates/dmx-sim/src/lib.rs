//! DMX Bridge Simulation Library
//!
//! This crate provides a simulation layer for exercising the bridge engine
//! without a lighting console or a Hue bridge. It includes:
//!
//! - **VirtualConsole**: Holds a universe and emits protocol-accurate ArtDmx/ArtPoll
//! - **VirtualBridge**: A `LightingBridge` that records every command it receives
//!
//! # Example
//!
//! ```rust
//! use dmx_protocol::{decode, Packet};
//! use dmx_sim::VirtualConsole;
//!
//! let mut console = VirtualConsole::new(0);
//! console.set_rgb(1, 255, 0, 0);
//!
//! let bytes = console.dmx_packet();
//! assert!(matches!(decode(&bytes), Packet::Dmx(_)));
//! ```

pub mod bridge;
pub mod console;

pub use bridge::{AppliedCommand, VirtualBridge, VirtualBridgeConfig};
pub use console::{VirtualConsole, VirtualConsoleConfig};
