//! Widget configuration and guest/room scenarios.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::allocation::{Guest, RoomTemplate};
use crate::error::ScenarioError;
use crate::logging::Logger;
use crate::metrics::WidgetMetrics;

/// How the controller corrects a count that exceeds capacity or the guests left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Use the largest count that still fits.
    #[default]
    ClampToBoundary,
    /// Snap back to 1 adult / 0 children, capped to what fits.
    FallbackToDefault,
}

/// Knobs for the allocation controller.
#[derive(Clone)]
pub struct WidgetConfig {
    pub policy: ValidationPolicy,
    /// Lowest count the adult stepper offers.
    pub adult_min: u32,
    /// Lowest count the child stepper offers.
    pub child_min: u32,
    /// Optional structured logger for allocation events.
    pub logger: Option<Logger>,
    /// Optional counters shared with the runtime.
    pub metrics: Option<Arc<Mutex<WidgetMetrics>>>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            policy: ValidationPolicy::default(),
            adult_min: 1,
            child_min: 0,
            logger: None,
            metrics: None,
        }
    }
}

impl WidgetConfig {
    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Mutex<WidgetMetrics>>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// A party plus the rooms on offer, as supplied by the host page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationScenario {
    pub guest: Guest,
    pub rooms: Vec<RoomTemplate>,
    #[serde(default)]
    pub policy: ValidationPolicy,
}

impl AllocationScenario {
    pub fn new(guest: Guest, rooms: Vec<RoomTemplate>) -> Self {
        Self {
            guest,
            rooms,
            policy: ValidationPolicy::default(),
        }
    }

    /// Four adults and two children over three rooms of four.
    pub fn sample() -> Self {
        Self::new(
            Guest::new(4, 2),
            vec![
                RoomTemplate::new(1000, 200, 100, 4),
                RoomTemplate::new(0, 500, 500, 4),
                RoomTemplate::new(500, 300, 200, 4),
            ],
        )
    }

    /// Sixteen adults, more than one pass of the default allocator can seat.
    pub fn large_party() -> Self {
        Self::new(
            Guest::new(16, 0),
            vec![
                RoomTemplate::new(500, 500, 300, 4),
                RoomTemplate::new(500, 500, 300, 4),
                RoomTemplate::new(0, 500, 300, 8),
                RoomTemplate::new(500, 1000, 600, 2),
            ],
        )
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = serde_json::from_str(raw)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.rooms.is_empty() {
            return Err(ScenarioError::NoRooms);
        }
        if let Some(index) = self.rooms.iter().position(|room| room.capacity == 0) {
            return Err(ScenarioError::ZeroCapacity { index });
        }
        Ok(())
    }
}
