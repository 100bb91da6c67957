//! Controller overrides and injected delays.
//!
//! Both are inputs supplied by a caller outside the schedulers:
//! - an [`Overrides`] map forces a train onto a platform (hard constraint);
//! - a [`DelaySet`] shifts a train's timetable before assignment.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Train;

/// Largest delay a train can carry, in minutes.
///
/// Scheduling covers a single service day, so a shift beyond one day has no
/// platform to land on.
pub const MAX_DELAY_MINUTES: i64 = 24 * 60;

/// Forced platform per train ID.
pub type Overrides = HashMap<String, u32>;

/// Active delay per train ID.
pub type DelaySet = HashMap<String, ActiveDelay>;

/// Cause of an injected delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayKind {
    Breakdown,
    Weather,
    Signal,
    Passenger,
    Maintenance,
    /// Delay applied from an accepted recommendation.
    Recommendation,
    /// Domain-specific cause.
    Custom(String),
}

/// A delay currently applied to a train.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveDelay {
    /// Cause category.
    pub kind: DelayKind,
    /// Minutes the timetable is shifted by.
    pub minutes: i64,
    /// Free-text explanation.
    pub reason: String,
}

impl DelayKind {
    /// Lowercase label used in rationale strings.
    pub fn label(&self) -> &str {
        match self {
            Self::Breakdown => "breakdown",
            Self::Weather => "weather",
            Self::Signal => "signal",
            Self::Passenger => "passenger",
            Self::Maintenance => "maintenance",
            Self::Recommendation => "recommendation",
            Self::Custom(name) => name,
        }
    }
}

impl ActiveDelay {
    /// Creates a delay with a default reason.
    pub fn new(kind: DelayKind, minutes: i64) -> Self {
        let reason = format!("{} delay", kind.label());
        Self {
            kind,
            minutes,
            reason,
        }
    }

    /// Sets the reason text.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}

/// Returns the trains with their active delays applied.
///
/// Trains without a delay are cloned unchanged; the input is never mutated.
pub fn apply_delays(trains: &[Train], delays: &DelaySet) -> Vec<Train> {
    trains
        .iter()
        .map(|t| match delays.get(&t.id) {
            Some(delay) => t.shifted(delay.minutes),
            None => t.clone(),
        })
        .collect()
}
