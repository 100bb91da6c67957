//! Conflict model.
//!
//! Conflicts are derived from a schedule by the detector and recomputed
//! for every schedule; they are never authoritative state.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A safety or operational problem found in a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Unique conflict identifier.
    pub id: String,
    /// Conflict category.
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    /// Station where the conflict occurs.
    pub station_id: String,
    /// Platform, for platform-level conflicts.
    pub platform: Option<u32>,
    /// Trains involved, in arrival order.
    pub trains_involved: Vec<String>,
    /// Human-readable explanation.
    pub root_cause: String,
    /// How urgent the conflict is.
    pub severity: Severity,
    /// Advisory remediation texts (never executed).
    pub suggested_actions: Vec<String>,
}

/// Conflict category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Two trains occupy the same platform at the same time.
    PlatformOverlap,
    /// The gap between consecutive trains on a platform is below minimum headway.
    HeadwayViolation,
    /// A lower-priority train arrives shortly before a higher-priority one.
    PriorityConflict,
}

/// Conflict severity, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Conflict {
    /// Creates a conflict with a fresh ID and no suggested actions.
    pub fn new(
        kind: ConflictKind,
        station_id: impl Into<String>,
        trains_involved: Vec<String>,
        severity: Severity,
        root_cause: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            station_id: station_id.into(),
            platform: None,
            trains_involved,
            root_cause: root_cause.into(),
            severity,
            suggested_actions: Vec::new(),
        }
    }

    /// Sets the platform.
    pub fn on_platform(mut self, platform: u32) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Sets the suggested actions.
    pub fn with_actions(mut self, actions: Vec<String>) -> Self {
        self.suggested_actions = actions;
        self
    }

    /// Whether `train_id` takes part in this conflict.
    pub fn involves(&self, train_id: &str) -> bool {
        self.trains_involved.iter().any(|t| t == train_id)
    }

    /// The pair of involved trains, if exactly two are involved.
    pub fn pair(&self) -> Option<(&str, &str)> {
        match self.trains_involved.as_slice() {
            [first, second] => Some((first.as_str(), second.as_str())),
            _ => None,
        }
    }
}

impl ConflictKind {
    /// All kinds, in reporting order.
    pub const ALL: [ConflictKind; 3] = [
        ConflictKind::PlatformOverlap,
        ConflictKind::HeadwayViolation,
        ConflictKind::PriorityConflict,
    ];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlatformOverlap => "platform_overlap",
            Self::HeadwayViolation => "headway_violation",
            Self::PriorityConflict => "priority_conflict",
        }
    }
}

impl Severity {
    /// All severities, most urgent first.
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
