//! Translation from DMX channel windows to light commands
//!
//! The translator works in the units people think in (hue degrees,
//! percentages, mireds) and leaves rounding to whatever talks to the
//! lighting hardware.

use serde::{Deserialize, Serialize};

use crate::config::{ChannelMode, SessionConfig};

/// Coolest color temperature accepted by the lights
pub const MIRED_MIN: f64 = 153.0;
/// Warmest color temperature accepted by the lights
pub const MIRED_MAX: f64 = 500.0;

/// Linear interpolation of `v` from `[src_lo, src_hi]` to `[dst_lo, dst_hi]`
pub fn map_range(v: f64, src_lo: f64, src_hi: f64, dst_lo: f64, dst_hi: f64) -> f64 {
    dst_lo + (dst_hi - dst_lo) * (v - src_lo) / (src_hi - src_lo)
}

fn byte_to_percent(v: u8) -> f64 {
    map_range(f64::from(v), 0.0, 255.0, 0.0, 100.0)
}

fn byte_to_mired(v: u8) -> f64 {
    map_range(f64::from(v), 0.0, 255.0, MIRED_MIN, MIRED_MAX)
}

/// Convert an RGB triple to `(hue degrees, saturation %, value %)`
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    let saturation = if max == 0.0 { 0.0 } else { delta / max * 100.0 };

    (hue, saturation, max * 100.0)
}

/// Target state of a light
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LightState {
    /// Switch the light off
    Off,
    /// White light at a color temperature
    White {
        /// Color temperature in mireds (153-500)
        mired: f64,
        /// Brightness in percent
        brightness_pct: f64,
    },
    /// Continuous hue cycling
    Colorloop {
        /// Saturation in percent (always 100)
        saturation_pct: f64,
        /// Brightness in percent (always 100)
        brightness_pct: f64,
    },
    /// Solid color
    Color {
        /// Hue in degrees (0-360)
        hue_deg: f64,
        /// Saturation in percent
        saturation_pct: f64,
        /// Brightness in percent
        brightness_pct: f64,
        /// Color temperature override in mireds (extended mode only)
        mired: Option<f64>,
    },
}

impl LightState {
    /// Whether the command turns the light on
    pub fn is_on(&self) -> bool {
        !matches!(self, Self::Off)
    }
}

/// Command sent to one fixture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureCommand {
    /// Transition duration in milliseconds
    pub transition_ms: u32,
    /// Target state
    pub state: LightState,
}

/// Maps one fixture's channel window to a [`FixtureCommand`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTranslator {
    channel_mode: ChannelMode,
    colorloop: bool,
}

impl ColorTranslator {
    /// Create a translator
    pub fn new(channel_mode: ChannelMode, colorloop: bool) -> Self {
        Self {
            channel_mode,
            colorloop,
        }
    }

    /// Create a translator for a session
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.channel_mode, config.colorloop)
    }

    /// Translate a channel window
    ///
    /// Rules, first match wins:
    /// 1. black, and no white component: off
    /// 2. black with white enabled: white at the requested temperature
    /// 3. RGB all 1 with colorloop enabled: colorloop
    /// 4. otherwise: HSV color, with extended overrides when enabled
    pub fn translate(&self, window: &[u8], transition_ms: u32) -> FixtureCommand {
        let channel = |i: usize| window.get(i).copied().unwrap_or(0);
        let (r, g, b) = (channel(0), channel(1), channel(2));
        let black = r == 0 && g == 0 && b == 0;

        let state = if black {
            let white_brightness = self
                .channel_mode
                .white_enabled()
                .then(|| byte_to_percent(channel(4)))
                .filter(|&pct| pct > 0.0);

            match white_brightness {
                Some(brightness_pct) => LightState::White {
                    mired: byte_to_mired(channel(3)),
                    brightness_pct,
                },
                None => LightState::Off,
            }
        } else if self.colorloop && r == 1 && g == 1 && b == 1 {
            LightState::Colorloop {
                saturation_pct: 100.0,
                brightness_pct: 100.0,
            }
        } else {
            let (hue_deg, saturation_pct, brightness_pct) = rgb_to_hsv(r, g, b);
            if self.channel_mode.extended_enabled() {
                LightState::Color {
                    hue_deg,
                    brightness_pct: byte_to_percent(channel(3)),
                    saturation_pct: byte_to_percent(channel(4)),
                    mired: Some(byte_to_mired(channel(5))),
                }
            } else {
                LightState::Color {
                    hue_deg,
                    saturation_pct,
                    brightness_pct,
                    mired: None,
                }
            }
        };

        FixtureCommand {
            transition_ms,
            state,
        }
    }
}
