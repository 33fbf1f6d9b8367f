//! Philips Hue bridge client (REST API v1)

use std::collections::HashMap;
use std::time::Duration;

use dmx_engine::{BridgeError, Fixture, FixtureCommand, LightState, LightingBridge};
use serde::{Deserialize, Serialize};
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Body of `PUT /lights/<id>/state`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HueLightState {
    pub on: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bri: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hue: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sat: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ct: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<&'static str>,
    /// Deciseconds
    pub transitiontime: u16,
}

fn percent_to_bri(pct: f64) -> u8 {
    (pct / 100.0 * 254.0).round().clamp(1.0, 254.0) as u8
}

fn percent_to_sat(pct: f64) -> u8 {
    (pct / 100.0 * 254.0).round().clamp(0.0, 254.0) as u8
}

fn degrees_to_hue(deg: f64) -> u16 {
    (deg / 360.0 * 65535.0).round().clamp(0.0, 65535.0) as u16
}

fn mired_to_ct(mired: f64) -> u16 {
    mired.round().clamp(153.0, 500.0) as u16
}

fn millis_to_deciseconds(ms: u32) -> u16 {
    (ms.saturating_add(50) / 100).min(u32::from(u16::MAX)) as u16
}

impl From<&FixtureCommand> for HueLightState {
    fn from(command: &FixtureCommand) -> Self {
        let transitiontime = millis_to_deciseconds(command.transition_ms);
        let on = command.state.is_on();

        match command.state {
            LightState::Off => Self {
                on,
                transitiontime,
                ..Self::default()
            },
            LightState::White {
                mired,
                brightness_pct,
            } => Self {
                on,
                bri: Some(percent_to_bri(brightness_pct)),
                ct: Some(mired_to_ct(mired)),
                effect: Some("none"),
                transitiontime,
                ..Self::default()
            },
            LightState::Colorloop {
                saturation_pct,
                brightness_pct,
            } => Self {
                on,
                bri: Some(percent_to_bri(brightness_pct)),
                sat: Some(percent_to_sat(saturation_pct)),
                effect: Some("colorloop"),
                transitiontime,
                ..Self::default()
            },
            LightState::Color {
                hue_deg,
                saturation_pct,
                brightness_pct,
                mired,
            } => Self {
                on,
                bri: Some(percent_to_bri(brightness_pct)),
                hue: Some(degrees_to_hue(hue_deg)),
                sat: Some(percent_to_sat(saturation_pct)),
                ct: mired.map(mired_to_ct),
                effect: Some("none"),
                transitiontime,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct LightInfo {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponseItem {
    Success {
        #[allow(dead_code)]
        success: serde_json::Value,
    },
    Error {
        error: ApiError,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LightsResponse {
    Lights(HashMap<String, LightInfo>),
    Errors(Vec<ResponseItem>),
}

/// First error in a v1 response array, if any
fn first_error(items: &[ResponseItem]) -> Option<&str> {
    items.iter().find_map(|item| match item {
        ResponseItem::Error { error } => Some(error.description.as_str()),
        ResponseItem::Success { .. } => None,
    })
}

/// Fixtures ordered by numeric light id
fn fixtures_from_lights(lights: HashMap<String, LightInfo>) -> Vec<Fixture> {
    let mut fixtures: Vec<Fixture> = lights
        .into_iter()
        .map(|(id, info)| Fixture::new(id, info.name))
        .collect();
    fixtures.sort_by(|a, b| {
        match (a.id.parse::<u32>(), b.id.parse::<u32>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => a.id.cmp(&b.id),
        }
    });
    fixtures
}

fn transport(e: reqwest::Error) -> BridgeError {
    BridgeError::Transport(e.to_string())
}

/// Hue bridge reached over HTTP
#[derive(Debug, Clone)]
pub struct HueBridge {
    client: reqwest::Client,
    base_url: String,
}

impl HueBridge {
    /// Create a client for the bridge at `ip` using API username `user`
    pub fn new(ip: &str, user: &str) -> Result<Self, BridgeError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(transport)?;

        Ok(Self {
            client,
            base_url: format!("http://{ip}/api/{user}"),
        })
    }

    /// Create a client from stored settings, failing if either value is missing
    pub fn from_parts(ip: Option<&str>, user: Option<&str>) -> Result<Self, BridgeError> {
        let ip = ip.ok_or_else(|| BridgeError::NotConfigured("bridge IP not set".into()))?;
        let user = user.ok_or_else(|| BridgeError::NotConfigured("bridge user not set".into()))?;
        Self::new(ip, user)
    }
}

impl LightingBridge for HueBridge {
    async fn list_fixtures(&self) -> Result<Vec<Fixture>, BridgeError> {
        let url = format!("{}/lights", self.base_url);
        let response: LightsResponse = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;

        match response {
            LightsResponse::Lights(lights) => Ok(fixtures_from_lights(lights)),
            LightsResponse::Errors(items) => Err(BridgeError::Api(
                first_error(&items)
                    .unwrap_or("unexpected response")
                    .to_string(),
            )),
        }
    }

    async fn apply_command(
        &self,
        fixture_id: &str,
        command: &FixtureCommand,
    ) -> Result<(), BridgeError> {
        let url = format!("{}/lights/{}/state", self.base_url, fixture_id);
        let body = HueLightState::from(command);
        debug!("PUT light {} {:?}", fixture_id, body);

        let items: Vec<ResponseItem> = self
            .client
            .put(&url)
            .json(&body)
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;

        match first_error(&items) {
            Some(description) => Err(BridgeError::Api(description.to_string())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn command(state: LightState, transition_ms: u32) -> FixtureCommand {
        FixtureCommand {
            transition_ms,
            state,
        }
    }

    #[test]
    fn test_off_body() {
        let body = HueLightState::from(&command(LightState::Off, 100));
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"on": false, "transitiontime": 1})
        );
    }

    #[test]
    fn test_color_body() {
        let body = HueLightState::from(&command(
            LightState::Color {
                hue_deg: 120.0,
                saturation_pct: 100.0,
                brightness_pct: 50.0,
                mired: None,
            },
            450,
        ));
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "on": true,
                "bri": 127,
                "hue": 21845,
                "sat": 254,
                "effect": "none",
                "transitiontime": 5
            })
        );
    }

    #[test]
    fn test_white_and_colorloop_bodies() {
        let white = HueLightState::from(&command(
            LightState::White {
                mired: 326.5,
                brightness_pct: 0.1,
            },
            0,
        ));
        assert_eq!(white.ct, Some(327));
        assert_eq!(white.bri, Some(1));
        assert_eq!(white.hue, None);
        assert_eq!(white.effect, Some("none"));
        assert_eq!(
            serde_json::to_value(&white).unwrap(),
            json!({"on": true, "bri": 1, "ct": 327, "effect": "none", "transitiontime": 0})
        );

        let colorloop = HueLightState::from(&command(
            LightState::Colorloop {
                saturation_pct: 100.0,
                brightness_pct: 100.0,
            },
            0,
        ));
        assert_eq!(colorloop.effect, Some("colorloop"));
        assert_eq!(colorloop.bri, Some(254));
        assert_eq!(colorloop.sat, Some(254));
    }

    #[test]
    fn test_extended_color_keeps_ct() {
        let body = HueLightState::from(&command(
            LightState::Color {
                hue_deg: 359.9,
                saturation_pct: 0.0,
                brightness_pct: 100.0,
                mired: Some(600.0),
            },
            0,
        ));
        assert_eq!(body.ct, Some(500));
        assert_eq!(body.sat, Some(0));
        assert_eq!(body.hue, Some(65517));
    }

    #[test]
    fn test_transition_rounding() {
        assert_eq!(millis_to_deciseconds(0), 0);
        assert_eq!(millis_to_deciseconds(49), 0);
        assert_eq!(millis_to_deciseconds(150), 2);
        assert_eq!(millis_to_deciseconds(25_500), 255);
        assert_eq!(millis_to_deciseconds(u32::MAX), u16::MAX);
    }

    #[test]
    fn test_lights_sorted_numerically() {
        let response: LightsResponse = serde_json::from_value(json!({
            "10": {"name": "Desk", "type": "Extended color light"},
            "2": {"name": "Hall"},
            "1": {"name": "Lamp"}
        }))
        .unwrap();
        let LightsResponse::Lights(lights) = response else {
            panic!("expected lights");
        };

        let ids: Vec<String> = fixtures_from_lights(lights)
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec!["1", "2", "10"]);
    }

    #[test]
    fn test_error_response() {
        let response: LightsResponse = serde_json::from_value(json!([
            {"error": {"type": 1, "address": "/lights", "description": "unauthorized user"}}
        ]))
        .unwrap();
        let LightsResponse::Errors(items) = response else {
            panic!("expected errors");
        };
        assert_eq!(first_error(&items), Some("unauthorized user"));
    }

    #[test]
    fn test_success_response_has_no_error() {
        let items: Vec<ResponseItem> = serde_json::from_value(json!([
            {"success": {"/lights/1/state/on": true}}
        ]))
        .unwrap();
        assert_eq!(first_error(&items), None);
    }

    proptest! {
        #[test]
        fn prop_color_body_in_api_range(
            hue_deg in 0.0f64..360.0,
            saturation_pct in 0.0f64..=100.0,
            brightness_pct in 0.0f64..=100.0,
            mired in proptest::option::of(100.0f64..700.0),
            transition_ms in any::<u32>(),
        ) {
            let body = HueLightState::from(&command(
                LightState::Color { hue_deg, saturation_pct, brightness_pct, mired },
                transition_ms,
            ));
            let bri = body.bri.unwrap();
            prop_assert!((1..=254).contains(&bri));
            prop_assert!(body.sat.unwrap() <= 254);
            if let Some(ct) = body.ct {
                prop_assert!((153..=500).contains(&ct));
            }
        }
    }

    #[test]
    fn test_missing_settings() {
        assert!(matches!(
            HueBridge::from_parts(None, Some("user")),
            Err(BridgeError::NotConfigured(_))
        ));
    }
}
