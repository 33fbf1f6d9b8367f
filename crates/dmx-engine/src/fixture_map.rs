//! DMX address allocation for fixtures
//!
//! A [`FixturePlan`] lays the enabled fixtures out contiguously after the
//! start address:
//!
//! ```text
//! base            base+1          base+1+cpf
//!  |  transition  |  fixture 0 ... |  fixture 1 ... |
//! ```
//!
//! The transition slot is only present when a transition channel is
//! configured. Addresses are 1-based for operators; every slicing helper
//! here returns 0-based indices into the frame's channel buffer.

use std::collections::HashSet;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::MAX_START_ADDRESS;
use crate::error::EngineError;

/// Size of the DMX address space
pub const UNIVERSE_SIZE: usize = 512;

/// A controllable light as reported by the lighting bridge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fixture {
    /// Bridge-assigned identifier
    pub id: String,
    /// Display name
    pub name: String,
}

impl Fixture {
    /// Create a fixture
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Ordered fixtures with their address allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixturePlan {
    fixtures: Vec<Fixture>,
    base_address: u16,
    channels_per_fixture: usize,
    has_transition_channel: bool,
    trimmed: usize,
}

impl FixturePlan {
    /// Order, filter and trim fixtures into an address plan
    ///
    /// Fixtures listed in `preferred_order` come first (in that order),
    /// followed by the remaining ones in bridge order. Disabled fixtures
    /// and unknown ids are skipped. If the plan would run past channel 512,
    /// fixtures are dropped from the tail.
    pub fn build(
        all_fixtures: &[Fixture],
        disabled_ids: &HashSet<String>,
        preferred_order: &[String],
        channels_per_fixture: usize,
        base_address: u16,
        has_transition_channel: bool,
    ) -> Result<Self, EngineError> {
        if base_address == 0 || base_address > MAX_START_ADDRESS {
            return Err(EngineError::InvalidAddress(base_address));
        }
        if channels_per_fixture == 0 {
            return Err(EngineError::InvalidConfig(
                "fixtures must use at least one channel".into(),
            ));
        }

        let mut placed: HashSet<&str> = HashSet::new();
        let mut fixtures = Vec::with_capacity(all_fixtures.len());

        let preferred = preferred_order
            .iter()
            .filter_map(|id| all_fixtures.iter().find(|f| &f.id == id));

        for fixture in preferred.chain(all_fixtures.iter()) {
            if disabled_ids.contains(&fixture.id) || !placed.insert(fixture.id.as_str()) {
                continue;
            }
            fixtures.push(fixture.clone());
        }

        let mut plan = Self {
            fixtures,
            base_address,
            channels_per_fixture,
            has_transition_channel,
            trimmed: 0,
        };

        let overflow = plan.last_address().saturating_sub(UNIVERSE_SIZE);
        if overflow > 0 {
            let remove = overflow
                .div_ceil(channels_per_fixture)
                .min(plan.fixtures.len());
            let keep = plan.fixtures.len() - remove;
            plan.fixtures.truncate(keep);
            plan.trimmed = remove;
            warn!(
                "Not enough DMX channels: {} fixture(s) unavailable from address {}",
                remove,
                plan.last_address() + 1
            );
        }

        Ok(plan)
    }

    /// Fixtures in address order
    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    /// Number of mapped fixtures
    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    /// Whether no fixture is mapped
    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    /// 1-based start address
    pub fn base_address(&self) -> u16 {
        self.base_address
    }

    /// Channels consumed by each fixture
    pub fn channels_per_fixture(&self) -> usize {
        self.channels_per_fixture
    }

    /// Whether the first address carries the transition time
    pub fn has_transition_channel(&self) -> bool {
        self.has_transition_channel
    }

    /// Fixtures dropped because the universe ran out of channels
    pub fn trimmed(&self) -> usize {
        self.trimmed
    }

    /// Address the first trimmed fixture would have started at
    pub fn first_unavailable_address(&self) -> Option<usize> {
        (self.trimmed > 0).then(|| self.last_address() + 1)
    }

    /// Total channels used, including the transition channel
    pub fn total_channels(&self) -> usize {
        self.channels_per_fixture * self.fixtures.len() + usize::from(self.has_transition_channel)
    }

    /// Last 1-based address used by the plan (base - 1 when empty)
    pub fn last_address(&self) -> usize {
        usize::from(self.base_address) + self.total_channels() - 1
    }

    /// 0-based channel index of the transition byte
    pub fn transition_index(&self) -> Option<usize> {
        self.has_transition_channel
            .then(|| usize::from(self.base_address) - 1)
    }

    /// 1-based address of the first channel of fixture `i`
    pub fn address_of(&self, i: usize) -> usize {
        usize::from(self.base_address)
            + usize::from(self.has_transition_channel)
            + i * self.channels_per_fixture
    }

    /// 0-based channel indices of fixture `i`'s window
    pub fn window_range(&self, i: usize) -> Range<usize> {
        let start = self.address_of(i) - 1;
        start..start + self.channels_per_fixture
    }

    /// Human-readable address table, one row per used slot
    pub fn mapping(&self) -> Vec<(usize, String)> {
        let mut rows = Vec::with_capacity(self.fixtures.len() + 1);
        if self.has_transition_channel {
            rows.push((usize::from(self.base_address), "transition time".to_string()));
        }
        for (i, fixture) in self.fixtures.iter().enumerate() {
            rows.push((self.address_of(i), fixture.name.clone()));
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures(n: usize) -> Vec<Fixture> {
        (1..=n)
            .map(|i| Fixture::new(i.to_string(), format!("Light {i}")))
            .collect()
    }

    fn ids(plan: &FixturePlan) -> Vec<&str> {
        plan.fixtures().iter().map(|f| f.id.as_str()).collect()
    }

    #[test]
    fn test_natural_order() {
        let plan = FixturePlan::build(&fixtures(3), &HashSet::new(), &[], 3, 1, false).unwrap();
        assert_eq!(ids(&plan), vec!["1", "2", "3"]);
        assert_eq!(plan.window_range(0), 0..3);
        assert_eq!(plan.window_range(2), 6..9);
        assert_eq!(plan.total_channels(), 9);
    }

    #[test]
    fn test_preferred_order_then_rest() {
        let order = vec!["3".to_string(), "missing".to_string(), "1".to_string()];
        let plan = FixturePlan::build(&fixtures(4), &HashSet::new(), &order, 3, 1, false).unwrap();
        assert_eq!(ids(&plan), vec!["3", "1", "2", "4"]);
    }

    #[test]
    fn test_duplicate_preferred_ids_placed_once() {
        let order = vec!["2".to_string(), "2".to_string()];
        let plan = FixturePlan::build(&fixtures(3), &HashSet::new(), &order, 3, 1, false).unwrap();
        assert_eq!(ids(&plan), vec!["2", "1", "3"]);
    }

    #[test]
    fn test_disabled_skipped() {
        let disabled: HashSet<String> = ["2".to_string()].into_iter().collect();
        let order = vec!["2".to_string(), "3".to_string()];
        let plan = FixturePlan::build(&fixtures(3), &disabled, &order, 3, 1, false).unwrap();
        assert_eq!(ids(&plan), vec!["3", "1"]);
    }

    #[test]
    fn test_transition_channel_shifts_windows() {
        let plan = FixturePlan::build(&fixtures(2), &HashSet::new(), &[], 5, 10, true).unwrap();
        assert_eq!(plan.transition_index(), Some(9));
        assert_eq!(plan.address_of(0), 11);
        assert_eq!(plan.window_range(0), 10..15);
        assert_eq!(plan.window_range(1), 15..20);
        assert_eq!(plan.last_address(), 20);
        assert_eq!(
            plan.mapping(),
            vec![
                (10, "transition time".to_string()),
                (11, "Light 1".to_string()),
                (16, "Light 2".to_string()),
            ]
        );
    }

    #[test]
    fn test_exact_fit_not_trimmed() {
        // 510 + 3 - 1 = 512
        let plan = FixturePlan::build(&fixtures(1), &HashSet::new(), &[], 3, 510, false).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.trimmed(), 0);
        assert_eq!(plan.last_address(), 512);
        assert_eq!(plan.first_unavailable_address(), None);
    }

    #[test]
    fn test_overflow_trims_tail() {
        // 500 + 1 + 6*3 - 1 = 518 -> overflow 6 -> drop 2 fixtures
        let plan = FixturePlan::build(&fixtures(6), &HashSet::new(), &[], 3, 500, true).unwrap();
        assert_eq!(ids(&plan), vec!["1", "2", "3", "4"]);
        assert_eq!(plan.trimmed(), 2);
        assert!(plan.last_address() <= UNIVERSE_SIZE);
        assert_eq!(plan.first_unavailable_address(), Some(513));
    }

    #[test]
    fn test_overflow_rounds_up() {
        // 505 + 2*6 - 1 = 516 -> overflow 4 -> drop 1 fixture of 6 channels
        let plan = FixturePlan::build(&fixtures(2), &HashSet::new(), &[], 6, 505, false).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.last_address(), 510);
        assert_eq!(plan.first_unavailable_address(), Some(511));
    }

    #[test]
    fn test_invalid_address() {
        assert!(matches!(
            FixturePlan::build(&fixtures(1), &HashSet::new(), &[], 3, 0, false),
            Err(EngineError::InvalidAddress(0))
        ));
        assert!(FixturePlan::build(&fixtures(1), &HashSet::new(), &[], 3, 512, false).is_err());
        assert!(FixturePlan::build(&fixtures(1), &HashSet::new(), &[], 0, 1, false).is_err());
    }

    #[test]
    fn test_empty_plan() {
        let plan = FixturePlan::build(&[], &HashSet::new(), &[], 3, 1, false).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.total_channels(), 0);
        assert_eq!(plan.last_address(), 0);
    }
}
