//! DMX to Smart Light Engine
//!
//! This crate turns a stream of Art-Net frames for one universe into
//! commands for individual smart lights.
//!
//! # Architecture
//!
//! ```text
//! UDP -> UniverseListener -> mpsc -> scheduler actor -> LightingBridge
//!            |                          |
//!        ArtPollReply             UpdateScheduler
//!                              (FixturePlan + ColorTranslator)
//! ```
//!
//! - **FixturePlan** lays fixtures out in the DMX address space
//! - **ColorTranslator** maps each fixture's channel window to a command
//! - **UpdateScheduler** detects changed windows and enforces the shared
//!   100ms cooldown with a single coalescing retry
//! - **UniverseListener** owns the socket and answers ArtPoll
//!
//! The scheduler is a pure state machine driven by explicit instants; only
//! the actor touches the clock.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashSet;
//! use std::time::Instant;
//!
//! use dmx_engine::{Fixture, FixturePlan, SessionConfig, UpdateScheduler};
//! use dmx_protocol::Frame;
//!
//! let config = SessionConfig::default();
//! let fixtures = vec![Fixture::new("1", "Desk")];
//! let plan = FixturePlan::build(
//!     &fixtures,
//!     &HashSet::new(),
//!     &[],
//!     config.channel_mode.channels_per_fixture(),
//!     config.base_address,
//!     config.transition.uses_channel(),
//! )
//! .unwrap();
//!
//! let mut scheduler = UpdateScheduler::new(plan, &config);
//! let dispatches = scheduler.on_frame(Frame::new(1, 0, 0, vec![255, 0, 0]), Instant::now());
//! assert_eq!(dispatches.len(), 1);
//! ```

pub mod actor;
pub mod bridge;
pub mod color;
pub mod config;
pub mod error;
pub mod fixture_map;
pub mod listener;
pub mod network;
pub mod scheduler;

// Re-export actor types
pub use actor::{run_scheduler_actor, SchedulerCommand};

pub use bridge::{BridgeError, LightingBridge};
pub use color::{map_range, rgb_to_hsv, ColorTranslator, FixtureCommand, LightState};
pub use config::{ChannelMode, SessionConfig, TransitionMode, MAX_START_ADDRESS};
pub use error::EngineError;
pub use fixture_map::{Fixture, FixturePlan, UNIVERSE_SIZE};
pub use listener::{poll_reply_target, UniverseListener, DEFAULT_NODE_NAME};
pub use network::NetworkIdentity;
pub use scheduler::{visit_order, Dispatch, RetryState, UpdateScheduler, COOLDOWN, RETRY_DELAY};
