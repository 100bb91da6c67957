//! Conflict detection over a candidate schedule.
//!
//! # Algorithm
//!
//! Entries are grouped by station (stations unknown to the detector are
//! skipped) and sorted by arrival. Then, per station:
//!
//! 1. Per platform, each consecutive pair is checked for overlap
//!    (previous departure after next arrival) and for a gap below the
//!    minimum headway. An overlapping pair reports both.
//! 2. Station-wide, each consecutive pair is checked for a priority
//!    inversion: a lower-priority train arriving first, within 30 minutes.
//!
//! # Complexity
//! O(n log n) for n entries.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;

use crate::config::{MIN_HEADWAY_MINUTES, PLATFORM_BUFFER_MINUTES};
use crate::models::{minutes_between, Conflict, ConflictKind, ScheduleEntry, Severity, Station, Train};

use super::ImpactReport;

/// Arrival separation within which a priority inversion is reported (min).
pub const PRIORITY_WINDOW_MINUTES: f64 = 30.0;

/// Inspects schedules for platform, headway and priority problems.
#[derive(Debug, Clone)]
pub struct ConflictDetector<'a> {
    trains: HashMap<&'a str, &'a Train>,
    stations: &'a [Station],
}

fn hhmm(t: NaiveDateTime) -> String {
    t.format("%H:%M").to_string()
}

/// Severity of a platform overlap by its length.
pub fn overlap_severity(overlap_minutes: f64) -> Severity {
    if overlap_minutes > 10.0 {
        Severity::Critical
    } else if overlap_minutes > 5.0 {
        Severity::High
    } else if overlap_minutes > 2.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

impl<'a> ConflictDetector<'a> {
    /// Creates a detector for the given timetable and stations.
    pub fn new(trains: &'a [Train], stations: &'a [Station]) -> Self {
        Self {
            trains: trains.iter().map(|t| (t.id.as_str(), t)).collect(),
            stations,
        }
    }

    /// Finds every conflict in `entries`.
    ///
    /// Conflicts are reported station by station in station-list order;
    /// within a station: overlaps, then headway violations, then priority
    /// conflicts.
    pub fn detect<'e, I>(&self, entries: I) -> Vec<Conflict>
    where
        I: IntoIterator<Item = &'e ScheduleEntry>,
    {
        let mut by_station: HashMap<&str, Vec<&ScheduleEntry>> = HashMap::new();
        for e in entries {
            by_station.entry(e.station_id.as_str()).or_default().push(e);
        }

        let mut conflicts = Vec::new();
        for station in self.stations {
            let Some(entries) = by_station.get_mut(station.id.as_str()) else {
                continue;
            };
            entries.sort_by_key(|e| e.actual_arrival);

            let mut by_platform: BTreeMap<u32, Vec<&ScheduleEntry>> = BTreeMap::new();
            for &e in entries.iter() {
                by_platform.entry(e.assigned_platform).or_default().push(e);
            }

            for (&platform, group) in &by_platform {
                for pair in group.windows(2) {
                    if let Some(c) = self.check_overlap(&station.id, platform, pair[0], pair[1]) {
                        conflicts.push(c);
                    }
                }
            }
            for (&platform, group) in &by_platform {
                for pair in group.windows(2) {
                    if let Some(c) = self.check_headway(&station.id, platform, pair[0], pair[1]) {
                        conflicts.push(c);
                    }
                }
            }
            for pair in entries.windows(2) {
                if let Some(c) = self.check_priority(&station.id, pair[0], pair[1]) {
                    conflicts.push(c);
                }
            }
        }
        conflicts
    }

    /// Aggregates conflicts into an impact report.
    pub fn summarize(&self, conflicts: &[Conflict]) -> ImpactReport {
        ImpactReport::from_conflicts(conflicts)
    }

    fn check_overlap(
        &self,
        station_id: &str,
        platform: u32,
        current: &ScheduleEntry,
        next: &ScheduleEntry,
    ) -> Option<Conflict> {
        if current.actual_departure <= next.actual_arrival {
            return None;
        }
        let overlap = minutes_between(next.actual_arrival, current.actual_departure);

        Some(
            Conflict::new(
                ConflictKind::PlatformOverlap,
                station_id,
                vec![current.train_id.clone(), next.train_id.clone()],
                overlap_severity(overlap),
                format!(
                    "Platform {platform} double-booked: {} departure ({}) overlaps with {} arrival ({}) by {overlap:.1} minutes",
                    current.train_id,
                    hhmm(current.actual_departure),
                    next.train_id,
                    hhmm(next.actual_arrival),
                ),
            )
            .on_platform(platform)
            .with_actions(vec![
                format!("Move {} to available platform", next.train_id),
                format!(
                    "Delay {} by {:.0} minutes",
                    next.train_id,
                    overlap + PLATFORM_BUFFER_MINUTES
                ),
                format!("Expedite {} departure", current.train_id),
            ]),
        )
    }

    fn check_headway(
        &self,
        station_id: &str,
        platform: u32,
        current: &ScheduleEntry,
        next: &ScheduleEntry,
    ) -> Option<Conflict> {
        let headway = minutes_between(current.actual_departure, next.actual_arrival);
        if headway >= MIN_HEADWAY_MINUTES {
            return None;
        }
        let severity = if headway < 2.0 {
            Severity::High
        } else {
            Severity::Medium
        };

        Some(
            Conflict::new(
                ConflictKind::HeadwayViolation,
                station_id,
                vec![current.train_id.clone(), next.train_id.clone()],
                severity,
                format!(
                    "Insufficient headway on Platform {platform}: only {headway:.1} minutes between {} departure and {} arrival (minimum {MIN_HEADWAY_MINUTES} minutes required)",
                    current.train_id, next.train_id,
                ),
            )
            .on_platform(platform)
            .with_actions(vec![
                format!(
                    "Delay {} by {:.0} minutes",
                    next.train_id,
                    MIN_HEADWAY_MINUTES - headway + 1.0
                ),
                format!("Move {} to different platform", next.train_id),
                format!(
                    "Expedite {} departure by {:.0} minutes",
                    current.train_id,
                    MIN_HEADWAY_MINUTES - headway
                ),
            ]),
        )
    }

    fn check_priority(
        &self,
        station_id: &str,
        current: &ScheduleEntry,
        next: &ScheduleEntry,
    ) -> Option<Conflict> {
        let first = self.trains.get(current.train_id.as_str())?;
        let second = self.trains.get(next.train_id.as_str())?;

        if first.priority >= second.priority || current.actual_arrival >= next.actual_arrival {
            return None;
        }
        let separation = minutes_between(current.actual_arrival, next.actual_arrival);
        if separation > PRIORITY_WINDOW_MINUTES {
            return None;
        }
        let severity = if separation > 15.0 {
            Severity::Medium
        } else {
            Severity::High
        };

        Some(
            Conflict::new(
                ConflictKind::PriorityConflict,
                station_id,
                vec![current.train_id.clone(), next.train_id.clone()],
                severity,
                format!(
                    "Priority inversion: {} (priority {}) scheduled before {} (priority {}) with only {separation:.1} minutes separation",
                    current.train_id, first.priority, next.train_id, second.priority,
                ),
            )
            .with_actions(vec![
                format!(
                    "Swap arrival order of {} and {}",
                    current.train_id, next.train_id
                ),
                format!("Delay {} to after {}", current.train_id, next.train_id),
                format!(
                    "Move {} to different platform to allow {} priority",
                    current.train_id, next.train_id
                ),
            ]),
        )
    }
}
