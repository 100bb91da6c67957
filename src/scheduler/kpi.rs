//! Schedule quality metrics (KPIs).
//!
//! Computes operational indicators from a completed schedule and the
//! timetable it was built from, and compares two schedules.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Delay | max(0, actual arrival - timetabled arrival) per placed train |
//! | Total / Average Delay | Sum over placed trains; average over all trains |
//! | Maximum Delay | Largest single delay |
//! | On-Time Rate | Fraction of trains delayed by at most 2 minutes |
//! | Platform Utilization | Busy minutes / 1440 per (station, platform) |
//!
//! Delays are always measured against the unshifted timetable, so injected
//! delays count.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::OPERATING_DAY_MINUTES;
use crate::models::{Schedule, ScheduleEntry, Train};

/// Trains delayed by at most this many minutes count as on time.
pub const ON_TIME_TOLERANCE_MINUTES: f64 = 2.0;

/// Schedule performance indicators.
///
/// All time values are in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleKpi {
    /// Trains in the timetable.
    pub train_count: usize,
    /// Trains that received a platform.
    pub scheduled_count: usize,
    /// Sum of delays across placed trains.
    pub total_delay_minutes: f64,
    /// Total delay divided by the number of trains.
    pub average_delay_minutes: f64,
    /// Largest delay of any single train.
    pub max_delay_minutes: f64,
    /// Placed trains within the on-time tolerance.
    pub on_time_count: usize,
    /// Placed trains beyond the on-time tolerance.
    pub delayed_count: usize,
    /// Fraction of trains on time (0.0..1.0).
    pub on_time_rate: f64,
    /// Average delay per station.
    pub delay_by_station: BTreeMap<String, f64>,
    /// Average delay per train type.
    pub delay_by_train_type: BTreeMap<String, f64>,
    /// Per-platform load, ordered by station then platform.
    pub platform_load: Vec<PlatformLoad>,
}

/// Occupation of one platform over the operating day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformLoad {
    pub station_id: String,
    pub platform: u32,
    /// Trains assigned.
    pub trains: usize,
    /// Minutes occupied.
    pub busy_minutes: f64,
    /// Busy minutes / 1440, capped at 1.
    pub utilization: f64,
}

/// Change to one train between two schedules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainChange {
    pub train_id: String,
    pub old_platform: Option<u32>,
    pub new_platform: Option<u32>,
    pub old_arrival: Option<NaiveDateTime>,
    pub new_arrival: Option<NaiveDateTime>,
    /// New delay minus old delay (min). Positive = later.
    pub delay_change: f64,
}

/// Differences between two schedules of the same timetable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDelta {
    /// Trains whose platform or arrival changed, in timetable order.
    pub changes: Vec<TrainChange>,
    /// Total delay after minus total delay before (min).
    pub total_delay_change: f64,
}

fn delay_of(entry: &ScheduleEntry, train: &Train) -> f64 {
    train.delay_minutes(entry.actual_arrival).max(0.0)
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl ScheduleKpi {
    /// Computes KPIs from a schedule and its input trains.
    ///
    /// # Arguments
    /// * `schedule` - The schedule to evaluate.
    /// * `trains` - The timetable (for scheduled arrivals and train types).
    pub fn calculate(schedule: &Schedule, trains: &[Train]) -> Self {
        let by_id: HashMap<&str, &Train> = trains.iter().map(|t| (t.id.as_str(), t)).collect();

        let mut total_delay = 0.0;
        let mut max_delay: f64 = 0.0;
        let mut on_time_count = 0;
        let mut delayed_count = 0;
        let mut scheduled_count = 0;
        let mut by_station: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let mut by_type: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let mut load: BTreeMap<(String, u32), (usize, f64)> = BTreeMap::new();

        for entry in schedule.entries() {
            let slot = load
                .entry((entry.station_id.clone(), entry.assigned_platform))
                .or_insert((0, 0.0));
            slot.0 += 1;
            slot.1 += entry.dwell_minutes();

            let Some(train) = by_id.get(entry.train_id.as_str()) else {
                continue;
            };
            scheduled_count += 1;

            let delay = delay_of(entry, train);
            total_delay += delay;
            max_delay = max_delay.max(delay);
            if delay <= ON_TIME_TOLERANCE_MINUTES {
                on_time_count += 1;
            } else {
                delayed_count += 1;
            }

            by_station
                .entry(entry.station_id.clone())
                .or_default()
                .push(delay);
            by_type
                .entry(train.train_type.clone())
                .or_default()
                .push(delay);
        }

        let train_count = trains.len();
        let (average_delay, on_time_rate) = if train_count == 0 {
            (0.0, 1.0)
        } else {
            (
                total_delay / train_count as f64,
                on_time_count as f64 / train_count as f64,
            )
        };

        let platform_load = load
            .into_iter()
            .map(|((station_id, platform), (count, busy))| PlatformLoad {
                station_id,
                platform,
                trains: count,
                busy_minutes: busy,
                utilization: (busy / OPERATING_DAY_MINUTES).min(1.0),
            })
            .collect();

        Self {
            train_count,
            scheduled_count,
            total_delay_minutes: total_delay,
            average_delay_minutes: average_delay,
            max_delay_minutes: max_delay,
            on_time_count,
            delayed_count,
            on_time_rate,
            delay_by_station: by_station
                .into_iter()
                .map(|(k, v)| (k, average(&v)))
                .collect(),
            delay_by_train_type: by_type
                .into_iter()
                .map(|(k, v)| (k, average(&v)))
                .collect(),
            platform_load,
        }
    }

    /// Whether the schedule meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_delay_minutes: f64, min_on_time_rate: f64) -> bool {
        self.max_delay_minutes <= max_delay_minutes && self.on_time_rate >= min_on_time_rate
    }
}

impl ScheduleDelta {
    /// Compares two schedules built from `trains`.
    pub fn between(before: &Schedule, after: &Schedule, trains: &[Train]) -> Self {
        let mut changes = Vec::new();
        let mut delay_before = 0.0;
        let mut delay_after = 0.0;

        for train in trains {
            let old = before.entry_for_train(&train.id);
            let new = after.entry_for_train(&train.id);

            let old_delay = old.map(|e| delay_of(e, train)).unwrap_or(0.0);
            let new_delay = new.map(|e| delay_of(e, train)).unwrap_or(0.0);
            delay_before += old_delay;
            delay_after += new_delay;

            let changed = match (old, new) {
                (Some(o), Some(n)) => {
                    o.assigned_platform != n.assigned_platform
                        || o.actual_arrival != n.actual_arrival
                }
                (None, None) => false,
                _ => true,
            };
            if changed {
                changes.push(TrainChange {
                    train_id: train.id.clone(),
                    old_platform: old.map(|e| e.assigned_platform),
                    new_platform: new.map(|e| e.assigned_platform),
                    old_arrival: old.map(|e| e.actual_arrival),
                    new_arrival: new.map(|e| e.actual_arrival),
                    delay_change: new_delay - old_delay,
                });
            }
        }

        Self {
            changes,
            total_delay_change: delay_after - delay_before,
        }
    }

    /// IDs of trains whose plan changed.
    pub fn changed_trains(&self) -> Vec<String> {
        self.changes.iter().map(|c| c.train_id.clone()).collect()
    }

    /// Trains that ended up later than before.
    pub fn delayed_count(&self) -> usize {
        self.changes.iter().filter(|c| c.delay_change > 0.0).count()
    }

    /// Returns the delta without the given train.
    pub fn excluding(mut self, train_id: &str) -> Self {
        self.changes.retain(|c| c.train_id != train_id);
        self
    }

    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}
