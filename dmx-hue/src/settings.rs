//! Stored preferences
//!
//! A JSON file written by whatever tool paired the bridge. It is only ever
//! read here; every key is optional.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::Context;
use dmx_engine::{ChannelMode, TransitionMode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Transition as stored on disk: a number of milliseconds or `"channel"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredTransition {
    /// Fixed transition in milliseconds
    Millis(u32),
    /// Named mode (`"channel"`)
    Named(String),
}

impl StoredTransition {
    /// Resolve to a transition mode
    pub fn to_mode(&self) -> anyhow::Result<TransitionMode> {
        match self {
            Self::Millis(ms) => Ok(TransitionMode::Fixed(*ms)),
            Self::Named(name) => Ok(name.parse()?),
        }
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Hue bridge IP address
    #[serde(default)]
    pub bridge: Option<String>,
    /// Hue API username
    #[serde(default)]
    pub user: Option<String>,
    /// 1-based DMX start address
    #[serde(default = "default_dmx_address")]
    pub dmx_address: u16,
    /// Art-Net universe
    #[serde(default)]
    pub universe: u16,
    /// Channel layout per light
    #[serde(default)]
    pub channel_mode: ChannelMode,
    /// All-ones RGB starts the colorloop effect
    #[serde(default)]
    pub colorloop: bool,
    /// Transition time
    #[serde(default)]
    pub transition: Option<StoredTransition>,
    /// Light ids mapped to `true` are left out of the address plan
    #[serde(default)]
    pub disabled_lights: HashMap<String, bool>,
    /// Light ids placed first, in this order
    #[serde(default)]
    pub lights_order: Vec<String>,
    /// Disable the 100ms cooldown
    #[serde(default)]
    pub no_limit: bool,
}

fn default_dmx_address() -> u16 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bridge: None,
            user: None,
            dmx_address: default_dmx_address(),
            universe: 0,
            channel_mode: ChannelMode::default(),
            colorloop: false,
            transition: None,
            disabled_lights: HashMap::new(),
            lights_order: Vec::new(),
            no_limit: false,
        }
    }
}

impl Settings {
    /// Get the XDG config directory for dmx-hue
    /// Uses $XDG_CONFIG_HOME/dmx-hue, falls back to ~/.config/dmx-hue
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("dmx-hue"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("dmx-hue"))
    }

    /// Default settings file path
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load from `path`, or from the default location
    ///
    /// A missing file yields defaults; an unreadable or malformed one is an
    /// error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            debug!("No settings location, using defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid settings in {}", path.display()))
    }

    /// Parse settings JSON
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Ids of lights excluded from the plan
    pub fn disabled_ids(&self) -> HashSet<String> {
        self.disabled_lights
            .iter()
            .filter(|(_, disabled)| **disabled)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Stored transition, defaulting to 100ms
    pub fn transition_mode(&self) -> anyhow::Result<TransitionMode> {
        self.transition
            .as_ref()
            .map_or(Ok(TransitionMode::default()), StoredTransition::to_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.dmx_address, 1);
        assert_eq!(settings.transition_mode().unwrap(), TransitionMode::Fixed(100));
    }

    #[test]
    fn test_full_file() {
        let settings = Settings::from_json(
            r#"{
                "bridge": "192.168.1.10",
                "user": "abc",
                "dmxAddress": 20,
                "universe": 2,
                "channelMode": "extended",
                "colorloop": true,
                "transition": "channel",
                "disabledLights": {"3": true, "4": false},
                "lightsOrder": ["5", "1"],
                "noLimit": true
            }"#,
        )
        .unwrap();

        assert_eq!(settings.bridge.as_deref(), Some("192.168.1.10"));
        assert_eq!(settings.dmx_address, 20);
        assert_eq!(settings.channel_mode, ChannelMode::Extended);
        assert_eq!(settings.transition_mode().unwrap(), TransitionMode::Channel);
        assert_eq!(settings.disabled_ids(), HashSet::from(["3".to_string()]));
        assert_eq!(settings.lights_order, vec!["5", "1"]);
        assert!(settings.no_limit);
    }

    #[test]
    fn test_white_channel_mode() {
        let settings = Settings::from_json(r#"{"channelMode": "white"}"#).unwrap();
        assert_eq!(settings.channel_mode, ChannelMode::RgbWhite);
        assert_eq!(settings.channel_mode, "white".parse().unwrap());
    }

    #[test]
    fn test_numeric_transition() {
        let settings = Settings::from_json(r#"{"transition": 400}"#).unwrap();
        assert_eq!(settings.transition_mode().unwrap(), TransitionMode::Fixed(400));

        let settings = Settings::from_json(r#"{"transition": "fast"}"#).unwrap();
        assert!(settings.transition_mode().is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("dmx-hue-test-does-not-exist.json");
        assert_eq!(Settings::load(Some(&path)).unwrap(), Settings::default());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let path = std::env::temp_dir().join(format!("dmx-hue-test-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        let result = Settings::load(Some(&path));
        std::fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }
}
