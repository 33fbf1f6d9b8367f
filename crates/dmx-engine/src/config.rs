//! Session configuration
//!
//! Everything that controls how a DMX universe is mapped onto fixtures is
//! resolved once at start-up into a [`SessionConfig`] and handed to each
//! component that needs it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Highest operator-facing start address
pub const MAX_START_ADDRESS: u16 = 511;

/// Channel layout of each fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelMode {
    /// `R G B`
    #[default]
    Rgb,
    /// `R G B white-temperature white-brightness`
    #[serde(rename = "white")]
    RgbWhite,
    /// `R G B brightness saturation color-temperature`
    Extended,
}

impl ChannelMode {
    /// Number of DMX channels each fixture consumes
    pub fn channels_per_fixture(&self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::RgbWhite => 5,
            Self::Extended => 6,
        }
    }

    /// Whether channels 4/5 drive the white (color temperature) mode
    pub fn white_enabled(&self) -> bool {
        matches!(self, Self::RgbWhite)
    }

    /// Whether channels 4/5/6 override brightness, saturation and temperature
    pub fn extended_enabled(&self) -> bool {
        matches!(self, Self::Extended)
    }

    /// Returns a human-readable name for the mode
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rgb => "rgb",
            Self::RgbWhite => "white",
            Self::Extended => "extended",
        }
    }
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChannelMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rgb" | "3" => Ok(Self::Rgb),
            "white" | "rgbw" | "5" => Ok(Self::RgbWhite),
            "extended" | "6" => Ok(Self::Extended),
            other => Err(EngineError::InvalidConfig(format!(
                "unknown channel mode '{other}' (expected rgb, white or extended)"
            ))),
        }
    }
}

/// How the transition time of each light command is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionMode {
    /// Same transition for every command, in milliseconds
    Fixed(u32),
    /// A dedicated DMX channel ahead of the fixtures; one step is 100ms
    Channel,
}

impl TransitionMode {
    /// Whether a transition channel occupies the first address
    pub fn uses_channel(&self) -> bool {
        matches!(self, Self::Channel)
    }
}

impl Default for TransitionMode {
    fn default() -> Self {
        Self::Fixed(100)
    }
}

impl fmt::Display for TransitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(ms) => write!(f, "{ms}ms"),
            Self::Channel => f.write_str("channel"),
        }
    }
}

impl FromStr for TransitionMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("channel") {
            return Ok(Self::Channel);
        }
        s.parse::<u32>().map(Self::Fixed).map_err(|_| {
            EngineError::InvalidConfig(format!(
                "invalid transition '{s}' (expected milliseconds or 'channel')"
            ))
        })
    }
}

/// Resolved configuration for one bridging session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Art-Net universe to follow
    pub universe: u16,
    /// 1-based DMX start address
    pub base_address: u16,
    /// Channel layout per fixture
    pub channel_mode: ChannelMode,
    /// All-ones RGB enables the colorloop effect
    pub colorloop: bool,
    /// Transition time source
    pub transition: TransitionMode,
    /// Enforce the shared 100ms cooldown between light commands
    pub rate_limit: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            universe: 0,
            base_address: 1,
            channel_mode: ChannelMode::Rgb,
            colorloop: false,
            transition: TransitionMode::default(),
            rate_limit: true,
        }
    }
}

impl SessionConfig {
    /// Check the values that cannot be represented in the type system
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.base_address == 0 || self.base_address > MAX_START_ADDRESS {
            return Err(EngineError::InvalidAddress(self.base_address));
        }
        Ok(())
    }
}
