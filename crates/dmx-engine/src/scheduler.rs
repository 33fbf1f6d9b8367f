//! Rate-limited, coalescing update scheduler
//!
//! [`UpdateScheduler`] is a pure state machine: it is fed frames and the
//! current instant, and answers with the light commands to send right now.
//! Time never advances on its own here; the actor in [`crate::actor`] owns
//! the clock and the retry timer.
//!
//! All fixtures share one cooldown. At most one command leaves per
//! [`COOLDOWN`] window; anything blocked is picked up by a single pending
//! retry that re-runs the newest frame. A new frame always cancels the
//! pending retry before it is evaluated.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use dmx_protocol::Frame;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::color::{ColorTranslator, FixtureCommand};
use crate::config::{SessionConfig, TransitionMode};
use crate::fixture_map::FixturePlan;

/// Minimum spacing between two light commands, across all fixtures
pub const COOLDOWN: Duration = Duration::from_millis(100);
/// Delay before a blocked frame is re-evaluated
pub const RETRY_DELAY: Duration = Duration::from_millis(100);

/// A command ready to be sent to one fixture
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    /// Target fixture
    pub fixture_id: String,
    /// What to send
    pub command: FixtureCommand,
}

/// Whether a re-evaluation is scheduled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryState {
    /// Nothing scheduled
    Idle,
    /// `frame` is re-evaluated at `due`
    RetryPending { due: Instant, frame: Frame },
}

/// Permutation of `0..count` used as the fixture visiting order
///
/// Shuffled per frame so a saturated cooldown does not starve the same
/// fixtures every time.
pub fn visit_order<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..count).collect();
    order.shuffle(rng);
    order
}

/// Turns frames into fixture commands under the shared cooldown
#[derive(Debug)]
pub struct UpdateScheduler<R = StdRng> {
    plan: FixturePlan,
    translator: ColorTranslator,
    transition: TransitionMode,
    rate_limit: bool,
    /// Last dispatched window per fixture id
    fixture_state: HashMap<String, Vec<u8>>,
    last_dispatch: Option<Instant>,
    retry: RetryState,
    rng: R,
}

impl UpdateScheduler<StdRng> {
    /// Create a scheduler with an OS-seeded visiting order
    pub fn new(plan: FixturePlan, config: &SessionConfig) -> Self {
        Self::with_rng(plan, config, StdRng::from_os_rng())
    }
}

impl<R: Rng> UpdateScheduler<R> {
    /// Create a scheduler with an explicit random source
    pub fn with_rng(plan: FixturePlan, config: &SessionConfig, rng: R) -> Self {
        Self {
            plan,
            translator: ColorTranslator::from_config(config),
            transition: config.transition,
            rate_limit: config.rate_limit,
            fixture_state: HashMap::new(),
            last_dispatch: None,
            retry: RetryState::Idle,
            rng,
        }
    }

    /// The address plan being served
    pub fn plan(&self) -> &FixturePlan {
        &self.plan
    }

    /// Current retry state
    pub fn retry_state(&self) -> &RetryState {
        &self.retry
    }

    /// When the pending retry is due, if any
    pub fn next_retry(&self) -> Option<Instant> {
        match &self.retry {
            RetryState::Idle => None,
            RetryState::RetryPending { due, .. } => Some(*due),
        }
    }

    /// Instant of the most recent dispatch
    pub fn last_dispatch(&self) -> Option<Instant> {
        self.last_dispatch
    }

    /// Last window dispatched to a fixture
    pub fn fixture_state(&self, fixture_id: &str) -> Option<&[u8]> {
        self.fixture_state.get(fixture_id).map(Vec::as_slice)
    }

    /// Handle a new frame for the followed universe
    pub fn on_frame(&mut self, frame: Frame, now: Instant) -> Vec<Dispatch> {
        if let RetryState::RetryPending { .. } = self.retry {
            trace!("New frame cancels pending retry");
        }
        self.retry = RetryState::Idle;
        self.evaluate(frame, now)
    }

    /// Re-run the pending frame; a no-op when nothing is pending
    pub fn on_retry(&mut self, now: Instant) -> Vec<Dispatch> {
        match std::mem::replace(&mut self.retry, RetryState::Idle) {
            RetryState::Idle => Vec::new(),
            RetryState::RetryPending { frame, .. } => {
                trace!("Retrying blocked frame {}", frame.sequence);
                self.evaluate(frame, now)
            }
        }
    }

    fn transition_ms(&self, frame: &Frame) -> u32 {
        match self.transition {
            TransitionMode::Fixed(ms) => ms,
            TransitionMode::Channel => self
                .plan
                .transition_index()
                .and_then(|i| frame.channels.get(i))
                .map_or(0, |&raw| u32::from(raw) * 100),
        }
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        !self.rate_limit
            || self
                .last_dispatch
                .map_or(true, |last| now.saturating_duration_since(last) >= COOLDOWN)
    }

    fn evaluate(&mut self, frame: Frame, now: Instant) -> Vec<Dispatch> {
        let transition_ms = self.transition_ms(&frame);
        let order = visit_order(self.plan.len(), &mut self.rng);

        let mut dispatches = Vec::new();
        let mut blocked = false;

        for i in order {
            let fixture = &self.plan.fixtures()[i];
            let Some(window) = frame.channels.get(self.plan.window_range(i)) else {
                trace!(
                    "Frame carries {} channels, fixture {} not covered",
                    frame.channels.len(),
                    fixture.id
                );
                continue;
            };

            let unchanged = self
                .fixture_state
                .get(&fixture.id)
                .is_some_and(|previous| previous.as_slice() == window);
            if unchanged {
                continue;
            }

            if !self.cooldown_elapsed(now) {
                blocked = true;
                continue;
            }

            let command = self.translator.translate(window, transition_ms);
            debug!("Fixture {} ({}) -> {:?}", fixture.id, fixture.name, command);

            self.last_dispatch = Some(now);
            self.fixture_state.insert(fixture.id.clone(), window.to_vec());
            dispatches.push(Dispatch {
                fixture_id: fixture.id.clone(),
                command,
            });
        }

        if blocked {
            let due = now + RETRY_DELAY;
            trace!("Cooldown active, retry scheduled");
            self.retry = RetryState::RetryPending { due, frame };
        }

        dispatches
    }
}
