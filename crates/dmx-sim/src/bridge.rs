//! Virtual lighting bridge
//!
//! An in-memory [`LightingBridge`] that records every command it receives,
//! stamped with the (possibly paused) tokio clock.

use std::collections::HashSet;

use dmx_engine::{BridgeError, Fixture, FixtureCommand, LightingBridge};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::debug;

/// One command received by the virtual bridge
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedCommand {
    /// Fixture the command was sent to
    pub fixture_id: String,
    /// The command itself
    pub command: FixtureCommand,
    /// When it arrived
    pub at: Instant,
}

/// Configuration for creating a virtual bridge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VirtualBridgeConfig {
    /// Fixtures reported by `list_fixtures`
    pub fixtures: Vec<Fixture>,
    /// Fixture ids whose commands fail
    pub failing: HashSet<String>,
}

/// A simulated lighting bridge
#[derive(Debug, Default)]
pub struct VirtualBridge {
    fixtures: Vec<Fixture>,
    failing: HashSet<String>,
    applied: Mutex<Vec<AppliedCommand>>,
    changed: Notify,
}

impl VirtualBridge {
    /// Create a bridge exposing `fixtures`
    pub fn new(fixtures: Vec<Fixture>) -> Self {
        Self {
            fixtures,
            ..Self::default()
        }
    }

    /// Create a bridge with `count` fixtures named `Light 1..=count`, ids `"1"..`
    pub fn with_lights(count: usize) -> Self {
        Self::new(
            (1..=count)
                .map(|i| Fixture::new(i.to_string(), format!("Light {i}")))
                .collect(),
        )
    }

    /// Create a bridge from configuration
    pub fn from_config(config: VirtualBridgeConfig) -> Self {
        Self {
            fixtures: config.fixtures,
            failing: config.failing,
            ..Self::default()
        }
    }

    /// Make every command for `fixture_id` fail (it is still recorded)
    pub fn fail_on(mut self, fixture_id: impl Into<String>) -> Self {
        self.failing.insert(fixture_id.into());
        self
    }

    /// Fixtures this bridge reports
    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    /// Snapshot of every command received so far
    pub async fn applied(&self) -> Vec<AppliedCommand> {
        self.applied.lock().await.clone()
    }

    /// Commands received for one fixture
    pub async fn applied_to(&self, fixture_id: &str) -> Vec<AppliedCommand> {
        self.applied
            .lock()
            .await
            .iter()
            .filter(|c| c.fixture_id == fixture_id)
            .cloned()
            .collect()
    }

    /// Number of commands received so far
    pub async fn count(&self) -> usize {
        self.applied.lock().await.len()
    }

    /// Wait until at least `n` commands have been received
    pub async fn wait_for(&self, n: usize) {
        loop {
            let notified = self.changed.notified();
            if self.count().await >= n {
                return;
            }
            notified.await;
        }
    }
}

impl LightingBridge for VirtualBridge {
    async fn list_fixtures(&self) -> Result<Vec<Fixture>, BridgeError> {
        Ok(self.fixtures.clone())
    }

    async fn apply_command(
        &self,
        fixture_id: &str,
        command: &FixtureCommand,
    ) -> Result<(), BridgeError> {
        if !self.fixtures.iter().any(|f| f.id == fixture_id) {
            return Err(BridgeError::UnknownFixture(fixture_id.to_string()));
        }

        debug!("Virtual fixture {} <- {:?}", fixture_id, command.state);
        self.applied.lock().await.push(AppliedCommand {
            fixture_id: fixture_id.to_string(),
            command: command.clone(),
            at: Instant::now(),
        });
        self.changed.notify_waiters();

        if self.failing.contains(fixture_id) {
            return Err(BridgeError::Api(format!("fixture {fixture_id} unreachable")));
        }
        Ok(())
    }
}
