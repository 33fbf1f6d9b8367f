//! Lighting bridge collaborator
//!
//! The engine never talks to lights directly. Whatever owns the lights
//! (a Hue bridge, a simulator) implements [`LightingBridge`] and the
//! scheduler actor hands it one [`FixtureCommand`] per changed fixture.

use std::future::Future;

use thiserror::Error;

use crate::color::FixtureCommand;
use crate::fixture_map::Fixture;

/// Errors reported by a lighting bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Bridge address or credentials missing
    #[error("lighting bridge not configured: {0}")]
    NotConfigured(String),

    /// Request could not be delivered
    #[error("transport error: {0}")]
    Transport(String),

    /// Bridge answered with an error
    #[error("bridge rejected request: {0}")]
    Api(String),

    /// Fixture id unknown to the bridge
    #[error("unknown fixture: {0}")]
    UnknownFixture(String),
}

/// Something that owns fixtures and can change their state
///
/// Implementations must be cheap to share: the scheduler actor keeps one
/// behind an `Arc` and calls [`LightingBridge::apply_command`] from spawned
/// tasks without waiting for the result.
pub trait LightingBridge: Send + Sync + 'static {
    /// Fixtures available on the bridge, in the bridge's natural order
    fn list_fixtures(&self) -> impl Future<Output = Result<Vec<Fixture>, BridgeError>> + Send;

    /// Apply a command to one fixture
    fn apply_command(
        &self,
        fixture_id: &str,
        command: &FixtureCommand,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}
