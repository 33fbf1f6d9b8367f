//! Command-line arguments

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};
use dmx_engine::{ChannelMode, SessionConfig, TransitionMode};
use dmx_protocol::ARTNET_PORT;

use crate::settings::Settings;

/// Art-Net node driving Philips Hue lights from one DMX universe
///
/// Options override the values stored in the settings file.
#[derive(Debug, Parser)]
#[command(name = "dmx-hue", version, disable_help_flag = true)]
pub struct Args {
    /// Settings file [default: $XDG_CONFIG_HOME/dmx-hue/settings.json]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Host address to listen on
    #[arg(short = 'h', long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// DMX start address (1-511)
    #[arg(short, long)]
    pub address: Option<u16>,

    /// Art-Net universe to follow
    #[arg(short, long)]
    pub universe: Option<u16>,

    /// Transition time in ms, or 'channel' for a dedicated DMX channel (1 step = 100ms)
    #[arg(short, long, value_name = "MS|channel")]
    pub transition: Option<TransitionMode>,

    /// Channels per light: rgb (3), white (5) or extended (6)
    #[arg(short = 'm', long = "mode")]
    pub channel_mode: Option<ChannelMode>,

    /// Setting all RGB channels of a light to 1 starts the colorloop effect
    #[arg(short, long)]
    pub colorloop: bool,

    /// Disable the 100ms rate limit between light commands
    #[arg(short = 'n', long = "no-limit")]
    pub no_limit: bool,

    /// Hue bridge IP address
    #[arg(long)]
    pub bridge: Option<String>,

    /// Hue API username
    #[arg(long)]
    pub user: Option<String>,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

impl Args {
    /// Art-Net socket address
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, ARTNET_PORT)
    }

    /// Merge flags over stored settings into a validated session configuration
    pub fn session_config(&self, settings: &Settings) -> anyhow::Result<SessionConfig> {
        let transition = match self.transition {
            Some(transition) => transition,
            None => settings.transition_mode()?,
        };

        let config = SessionConfig {
            universe: self.universe.unwrap_or(settings.universe),
            base_address: self.address.unwrap_or(settings.dmx_address),
            channel_mode: self.channel_mode.unwrap_or(settings.channel_mode),
            colorloop: self.colorloop || settings.colorloop,
            transition,
            rate_limit: !(self.no_limit || settings.no_limit),
        };

        config.validate().context("invalid DMX options")?;
        Ok(config)
    }

    /// Bridge IP, flag first
    pub fn bridge_ip<'a>(&'a self, settings: &'a Settings) -> Option<&'a str> {
        self.bridge.as_deref().or(settings.bridge.as_deref())
    }

    /// Bridge username, flag first
    pub fn bridge_user<'a>(&'a self, settings: &'a Settings) -> Option<&'a str> {
        self.user.as_deref().or(settings.user.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("dmx-hue").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults_come_from_settings() {
        let settings = Settings {
            dmx_address: 40,
            universe: 3,
            colorloop: true,
            ..Settings::default()
        };
        let config = parse(&[]).session_config(&settings).unwrap();
        assert_eq!(config.base_address, 40);
        assert_eq!(config.universe, 3);
        assert!(config.colorloop);
        assert!(config.rate_limit);
        assert_eq!(config.transition, TransitionMode::Fixed(100));
    }

    #[test]
    fn test_flags_override_settings() {
        let settings = Settings {
            dmx_address: 40,
            ..Settings::default()
        };
        let args = parse(&["-a", "7", "-t", "channel", "-m", "white", "-n", "-u", "2"]);
        let config = args.session_config(&settings).unwrap();
        assert_eq!(config.base_address, 7);
        assert_eq!(config.universe, 2);
        assert_eq!(config.transition, TransitionMode::Channel);
        assert_eq!(config.channel_mode, ChannelMode::RgbWhite);
        assert!(!config.rate_limit);
    }

    #[test]
    fn test_invalid_address_rejected() {
        let args = parse(&["-a", "512"]);
        assert!(args.session_config(&Settings::default()).is_err());
        let args = parse(&["--address", "0"]);
        assert!(args.session_config(&Settings::default()).is_err());
    }

    #[test]
    fn test_host_short_flag() {
        let args = parse(&["-h", "192.168.1.5"]);
        assert_eq!(args.listen_addr(), "192.168.1.5:6454".parse().unwrap());
        assert_eq!(parse(&[]).listen_addr().ip(), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }

    #[test]
    fn test_bad_transition_rejected() {
        let result = Args::try_parse_from(["dmx-hue", "--transition", "slow"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_bridge_flag_over_settings() {
        let settings = Settings {
            bridge: Some("10.0.0.2".into()),
            user: Some("stored".into()),
            ..Settings::default()
        };
        let args = parse(&["--bridge", "10.0.0.9"]);
        assert_eq!(args.bridge_ip(&settings), Some("10.0.0.9"));
        assert_eq!(args.bridge_user(&settings), Some("stored"));
    }
}
