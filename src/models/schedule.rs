//! Schedule (solution) model.
//!
//! A schedule is the result of one scheduler invocation: one placement per
//! train, either a committed platform/time entry or an explicit
//! "unplaceable" record, plus the provenance of the run.
//!
//! Entries are immutable snapshots; rescheduling produces a new `Schedule`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::train::minutes_between;

/// A train's committed platform and time window at its origin station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Scheduled train ID.
    pub train_id: String,
    /// Station where the platform is assigned.
    pub station_id: String,
    /// Assigned platform (1-based).
    pub assigned_platform: u32,
    /// Planned arrival.
    pub actual_arrival: NaiveDateTime,
    /// Planned departure.
    pub actual_departure: NaiveDateTime,
    /// Human-readable rationale. Advisory only, never parsed.
    pub reason: String,
}

/// Outcome for one train in a scheduling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Placement {
    /// The train received a platform and time window.
    Placed(ScheduleEntry),
    /// The train could not be placed in this run.
    Unplaceable {
        train_id: String,
        reason: UnplacedReason,
    },
}

/// Why a train was left without a platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnplacedReason {
    /// The train's origin station is not in the station list.
    UnknownStation(String),
    /// The placement loop ran out of attempts.
    AttemptsExhausted { attempts: u32, delay_minutes: i64 },
    /// The solver returned no assignment for this train.
    NoSolverAssignment,
}

/// Final status reported by an exact solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverStatus {
    Optimal,
    TimedOut,
    Infeasible,
    Error(String),
}

/// Which strategy produced a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Provenance {
    /// Greedy heuristic, requested directly.
    Greedy,
    /// Exact solver result.
    Ilp { status: SolverStatus },
    /// Greedy heuristic run after the exact solver did not finish optimally.
    GreedyFallback { status: SolverStatus },
}

/// A complete scheduling result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Per-train outcomes, in processing order.
    pub placements: Vec<Placement>,
    /// Strategy that produced this schedule.
    pub provenance: Provenance,
}

impl ScheduleEntry {
    /// Creates a new entry with an empty rationale.
    pub fn new(
        train_id: impl Into<String>,
        station_id: impl Into<String>,
        assigned_platform: u32,
        actual_arrival: NaiveDateTime,
        actual_departure: NaiveDateTime,
    ) -> Self {
        Self {
            train_id: train_id.into(),
            station_id: station_id.into(),
            assigned_platform,
            actual_arrival,
            actual_departure,
            reason: String::new(),
        }
    }

    /// Sets the rationale.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Platform occupation in minutes.
    #[inline]
    pub fn dwell_minutes(&self) -> f64 {
        minutes_between(self.actual_arrival, self.actual_departure)
    }

    /// Whether this entry's occupation intersects `[arrival, departure)`.
    #[inline]
    pub fn overlaps(&self, arrival: NaiveDateTime, departure: NaiveDateTime) -> bool {
        !(departure <= self.actual_arrival || arrival >= self.actual_departure)
    }
}

impl Placement {
    /// Train ID of this placement.
    pub fn train_id(&self) -> &str {
        match self {
            Self::Placed(entry) => &entry.train_id,
            Self::Unplaceable { train_id, .. } => train_id,
        }
    }

    /// The committed entry, if placed.
    pub fn entry(&self) -> Option<&ScheduleEntry> {
        match self {
            Self::Placed(entry) => Some(entry),
            Self::Unplaceable { .. } => None,
        }
    }
}

impl Schedule {
    /// Creates an empty schedule with the given provenance.
    pub fn new(provenance: Provenance) -> Self {
        Self {
            placements: Vec::new(),
            provenance,
        }
    }

    /// Builds a schedule from committed entries only.
    pub fn from_entries(entries: Vec<ScheduleEntry>, provenance: Provenance) -> Self {
        Self {
            placements: entries.into_iter().map(Placement::Placed).collect(),
            provenance,
        }
    }

    /// Adds a placement.
    pub fn push(&mut self, placement: Placement) {
        self.placements.push(placement);
    }

    /// Committed entries, in processing order.
    pub fn entries(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.placements.iter().filter_map(Placement::entry)
    }

    /// Clones the committed entries into a vector.
    pub fn to_entries(&self) -> Vec<ScheduleEntry> {
        self.entries().cloned().collect()
    }

    /// Trains that could not be placed, with the reason.
    pub fn unplaced(&self) -> impl Iterator<Item = (&str, &UnplacedReason)> {
        self.placements.iter().filter_map(|p| match p {
            Placement::Unplaceable { train_id, reason } => Some((train_id.as_str(), reason)),
            Placement::Placed(_) => None,
        })
    }

    /// Finds the entry for a train.
    pub fn entry_for_train(&self, train_id: &str) -> Option<&ScheduleEntry> {
        self.entries().find(|e| e.train_id == train_id)
    }

    /// Number of committed entries.
    pub fn entry_count(&self) -> usize {
        self.entries().count()
    }

    /// Number of unplaceable trains.
    pub fn unplaced_count(&self) -> usize {
        self.unplaced().count()
    }

    /// Whether every train received a platform.
    pub fn is_complete(&self) -> bool {
        self.unplaced_count() == 0
    }

    /// Whether the exact solver was abandoned for the greedy heuristic.
    pub fn fell_back(&self) -> bool {
        matches!(self.provenance, Provenance::GreedyFallback { .. })
    }
}

/// Entries grouped by `(station, platform)`, each group sorted by arrival.
pub fn entries_by_platform<'a, I>(entries: I) -> HashMap<(&'a str, u32), Vec<&'a ScheduleEntry>>
where
    I: IntoIterator<Item = &'a ScheduleEntry>,
{
    let mut groups: HashMap<(&str, u32), Vec<&ScheduleEntry>> = HashMap::new();
    for e in entries {
        groups
            .entry((e.station_id.as_str(), e.assigned_platform))
            .or_default()
            .push(e);
    }
    for group in groups.values_mut() {
        group.sort_by_key(|e| e.actual_arrival);
    }
    groups
}

/// Platforms at `station_id` whose entries leave `[arrival, departure)` free.
pub fn free_platforms<'a, I>(
    entries: I,
    station_id: &str,
    platforms: u32,
    arrival: NaiveDateTime,
    departure: NaiveDateTime,
) -> Vec<u32>
where
    I: IntoIterator<Item = &'a ScheduleEntry> + Clone,
{
    (1..=platforms)
        .filter(|&p| {
            !entries.clone().into_iter().any(|e| {
                e.station_id == station_id
                    && e.assigned_platform == p
                    && e.overlaps(arrival, departure)
            })
        })
        .collect()
}
