//! Planner configuration.
//!
//! Settings can be built in code or loaded from TOML:
//!
//! ```
//! use u_platform::config::{OptimizerMode, PlannerConfig};
//!
//! let config = PlannerConfig::from_toml_str(r#"
//!     mode = "ilp"
//!     time_limit_seconds = 10
//!
//!     [greedy]
//!     max_attempts = 80
//! "#).unwrap();
//!
//! assert_eq!(config.mode, OptimizerMode::Ilp);
//! assert_eq!(config.greedy.max_attempts, 80);
//! assert_eq!(config.greedy.delay_step_minutes, 2);
//! ```
//!
//! Operational constants that are not tunable (headway, slot size, ILP
//! objective weights) live here as `pub const`s.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::MAX_DELAY_MINUTES;

/// Default exact-solver shift window, in slots (3 hours).
pub const DEFAULT_MAX_SHIFT_SLOTS: u32 = 36;

/// Minimum gap between a departure and the next arrival on a platform (min).
pub const MIN_HEADWAY_MINUTES: f64 = 5.0;
/// Buffer added when suggesting a delay to clear a platform overlap (min).
pub const PLATFORM_BUFFER_MINUTES: f64 = 2.0;
/// Width of one ILP time slot (min).
pub const SLOT_MINUTES: i64 = 5;
/// Slots in the one-day ILP horizon.
pub const SLOTS_PER_DAY: u32 = 288;
/// ILP objective weight on delay minutes.
pub const DELAY_WEIGHT: f64 = 1.0;
/// ILP objective weight on shared-cell assignment indicators.
pub const CONFLICT_WEIGHT: f64 = 10.0;
/// Minutes in the utilization window.
pub const OPERATING_DAY_MINUTES: f64 = 24.0 * 60.0;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which scheduler strategy to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerMode {
    #[default]
    Greedy,
    Ilp,
}

/// Top-level planner settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Scheduler strategy.
    pub mode: OptimizerMode,
    /// Wall-clock limit for the exact solver.
    pub time_limit_seconds: u64,
    /// Caps how many slots past its scheduled slot a train may be moved by
    /// the exact solver. `None` allows the rest of the day.
    pub max_shift_slots: Option<u32>,
    /// Default number of recommendations returned.
    pub recommendation_limit: usize,
    /// Greedy heuristic settings.
    pub greedy: GreedyConfig,
}

/// Greedy heuristic settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreedyConfig {
    /// Placement attempts per train before it is reported unplaceable.
    pub max_attempts: u32,
    /// Minutes a train is pushed back when every platform is busy.
    pub delay_step_minutes: i64,
    /// Accumulated delay at which a train's priority is escalated.
    pub escalation_threshold_minutes: i64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            mode: OptimizerMode::Greedy,
            time_limit_seconds: 30,
            // Three hours of shift per train. Keeps the model at roughly an
            // eighth of the full-day size; `None` restores the whole day.
            max_shift_slots: Some(DEFAULT_MAX_SHIFT_SLOTS),
            recommendation_limit: 10,
            greedy: GreedyConfig::default(),
        }
    }
}

impl Default for GreedyConfig {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            delay_step_minutes: 2,
            escalation_threshold_minutes: 10,
        }
    }
}

impl PlannerConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not valid TOML,
    /// or fails [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the scheduler strategy.
    pub fn with_mode(mut self, mode: OptimizerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the exact solver time limit.
    pub fn with_time_limit_seconds(mut self, seconds: u64) -> Self {
        self.time_limit_seconds = seconds;
        self
    }

    /// Sets the exact solver shift window.
    pub fn with_max_shift_slots(mut self, slots: Option<u32>) -> Self {
        self.max_shift_slots = slots;
        self
    }

    /// Sets the greedy settings.
    pub fn with_greedy(mut self, greedy: GreedyConfig) -> Self {
        self.greedy = greedy;
        self
    }

    /// Exact solver time limit as a `Duration`.
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_seconds)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_limit_seconds == 0 {
            return Err(ConfigError::Invalid(
                "time_limit_seconds must be positive".into(),
            ));
        }
        self.greedy.validate()
    }
}

impl GreedyConfig {
    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be positive".into()));
        }
        if !(1..=MAX_DELAY_MINUTES).contains(&self.delay_step_minutes) {
            return Err(ConfigError::Invalid(format!(
                "delay_step_minutes must be in 1..={MAX_DELAY_MINUTES}"
            )));
        }
        if !(1..=MAX_DELAY_MINUTES).contains(&self.escalation_threshold_minutes) {
            return Err(ConfigError::Invalid(format!(
                "escalation_threshold_minutes must be in 1..={MAX_DELAY_MINUTES}"
            )));
        }
        Ok(())
    }
}
