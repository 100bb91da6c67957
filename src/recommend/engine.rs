//! Recommendation generation.
//!
//! # Algorithm
//!
//! 1. Conflict-targeted actions, one group per detected conflict.
//! 2. Optimization actions for trains delayed by more than 15 minutes.
//! 3. Load-balancing actions for platforms busier than 80% of the day.
//! 4. Score, rank and truncate (see [`super::scoring`]).
//!
//! Recommendations are advisory; nothing here mutates the schedule.

use std::collections::HashMap;

use tracing::debug;

use super::scoring::{rank, score_recommendations};
use crate::config::{MIN_HEADWAY_MINUTES, OPERATING_DAY_MINUTES};
use crate::conflicts::ConflictDetector;
use crate::models::{
    free_platforms, minutes_between, ActionKind, Conflict, ConflictKind, Recommendation,
    Schedule, ScheduleEntry, Station, Train,
};

/// Delay above which a train gets a platform-move suggestion (min).
pub const EXCESSIVE_DELAY_MINUTES: f64 = 15.0;
/// Utilization above which a platform is considered overloaded.
pub const OVERLOAD_UTILIZATION: f64 = 0.8;
/// Utilization below which a platform can take more trains.
pub const SPARE_UTILIZATION: f64 = 0.6;

const OVERLAP_BUFFER_MINUTES: f64 = 5.0;
const HEADWAY_BUFFER_MINUTES: f64 = 2.0;
const PRIORITY_SWAP_DELAY_MINUTES: i64 = 10;
const MAX_MOVE_REDUCTION_MINUTES: f64 = 10.0;
const REBALANCE_REDUCTION_MINUTES: f64 = 5.0;
const REBALANCE_PER_PLATFORM: usize = 2;

/// Proposes ranked corrective actions for a schedule.
#[derive(Debug, Clone)]
pub struct RecommendationEngine<'a> {
    trains: &'a [Train],
    stations: &'a [Station],
    by_train: HashMap<&'a str, &'a Train>,
    by_station: HashMap<&'a str, &'a Station>,
}

impl<'a> RecommendationEngine<'a> {
    /// Creates an engine for the given timetable and stations.
    pub fn new(trains: &'a [Train], stations: &'a [Station]) -> Self {
        Self {
            trains,
            stations,
            by_train: trains.iter().map(|t| (t.id.as_str(), t)).collect(),
            by_station: stations.iter().map(|s| (s.id.as_str(), s)).collect(),
        }
    }

    /// Returns at most `max` recommendations, best first.
    ///
    /// When `conflicts` is `None` they are detected from `schedule` first.
    pub fn recommend(
        &self,
        schedule: &Schedule,
        conflicts: Option<&[Conflict]>,
        max: usize,
    ) -> Vec<Recommendation> {
        let entries: Vec<&ScheduleEntry> = schedule.entries().collect();
        let detected;
        let conflicts: &[Conflict] = match conflicts {
            Some(c) => c,
            None => {
                detected = ConflictDetector::new(self.trains, self.stations)
                    .detect(entries.iter().copied());
                &detected[..]
            }
        };

        let mut recs = Vec::new();
        for conflict in conflicts {
            match conflict.kind {
                ConflictKind::PlatformOverlap => recs.extend(self.resolve_overlap(&entries, conflict)),
                ConflictKind::HeadwayViolation => {
                    recs.extend(self.resolve_headway(&entries, conflict))
                }
                ConflictKind::PriorityConflict => recs.extend(self.resolve_priority(conflict)),
            }
        }
        recs.extend(self.reduce_delays(&entries));
        recs.extend(self.rebalance(&entries));

        let generated = recs.len();
        score_recommendations(&mut recs);
        let ranked = rank(recs, max);

        debug!(
            event = "recommendations_generated",
            conflicts = conflicts.len(),
            generated,
            returned = ranked.len()
        );
        ranked
    }

    fn find<'e>(entries: &[&'e ScheduleEntry], train_id: &str) -> Option<&'e ScheduleEntry> {
        entries.iter().copied().find(|e| e.train_id == train_id)
    }

    fn free_platforms_for(&self, entries: &[&ScheduleEntry], station_id: &str, entry: &ScheduleEntry) -> Vec<u32> {
        match self.by_station.get(station_id) {
            Some(station) => free_platforms(
                entries.iter().copied(),
                station_id,
                station.platforms,
                entry.actual_arrival,
                entry.actual_departure,
            ),
            None => Vec::new(),
        }
    }

    fn resolve_overlap(&self, entries: &[&ScheduleEntry], conflict: &Conflict) -> Vec<Recommendation> {
        let mut recs = Vec::new();
        let Some((first_id, second_id)) = conflict.pair() else {
            return recs;
        };
        let (Some(first), Some(second)) = (Self::find(entries, first_id), Self::find(entries, second_id)) else {
            return recs;
        };
        if !self.by_station.contains_key(conflict.station_id.as_str()) {
            return recs;
        }
        let from = conflict.platform.unwrap_or(second.assigned_platform);

        for platform in self.free_platforms_for(entries, &conflict.station_id, second) {
            if Some(platform) == conflict.platform {
                continue;
            }
            recs.push(
                Recommendation::new(
                    ActionKind::ChangePlatform,
                    second_id,
                    format!("Move {second_id} from Platform {from} to Platform {platform}"),
                )
                .at_station(&conflict.station_id)
                .to_platform(platform)
                .with_cost_benefit(0.0, 1, 0.8),
            );
        }

        let overlap = minutes_between(second.actual_arrival, first.actual_departure);
        let delay = (overlap + OVERLAP_BUFFER_MINUTES) as i64;
        recs.push(
            Recommendation::new(
                ActionKind::DelayTrain,
                second_id,
                format!("Delay {second_id} by {delay} minutes to avoid platform conflict"),
            )
            .at_station(&conflict.station_id)
            .with_delay(delay)
            .with_cost_benefit(-(delay as f64), 1, 0.6),
        );
        recs
    }

    fn resolve_headway(&self, entries: &[&ScheduleEntry], conflict: &Conflict) -> Vec<Recommendation> {
        let mut recs = Vec::new();
        let Some((first_id, second_id)) = conflict.pair() else {
            return recs;
        };
        let (Some(first), Some(second)) = (Self::find(entries, first_id), Self::find(entries, second_id)) else {
            return recs;
        };

        let headway = minutes_between(first.actual_departure, second.actual_arrival);
        let delay = (MIN_HEADWAY_MINUTES - headway + HEADWAY_BUFFER_MINUTES) as i64;
        recs.push(
            Recommendation::new(
                ActionKind::DelayTrain,
                second_id,
                format!("Delay {second_id} by {delay} minutes to ensure safe headway"),
            )
            .at_station(&conflict.station_id)
            .with_delay(delay)
            .with_cost_benefit(-(delay as f64), 1, 0.7),
        );

        for platform in self.free_platforms_for(entries, &conflict.station_id, second) {
            if Some(platform) == conflict.platform {
                continue;
            }
            recs.push(
                Recommendation::new(
                    ActionKind::ChangePlatform,
                    second_id,
                    format!("Move {second_id} to Platform {platform} to avoid headway conflict"),
                )
                .at_station(&conflict.station_id)
                .to_platform(platform)
                .with_cost_benefit(0.0, 1, 0.9),
            );
        }
        recs
    }

    fn resolve_priority(&self, conflict: &Conflict) -> Option<Recommendation> {
        let (first_id, second_id) = conflict.pair()?;
        let first = self.by_train.get(first_id)?;
        let second = self.by_train.get(second_id)?;

        let (high, low) = if first.priority > second.priority {
            (first_id, second_id)
        } else {
            (second_id, first_id)
        };

        Some(
            Recommendation::new(
                ActionKind::SwapPriority,
                low,
                format!("Give priority to {high} by delaying {low}"),
            )
            .at_station(&conflict.station_id)
            .with_delay(PRIORITY_SWAP_DELAY_MINUTES)
            .with_cost_benefit(0.0, 1, 0.8),
        )
    }

    /// One platform move per heavily delayed train, to the first platform
    /// free during its timetabled window.
    fn reduce_delays(&self, entries: &[&ScheduleEntry]) -> Vec<Recommendation> {
        let mut recs = Vec::new();
        for &entry in entries {
            let Some(train) = self.by_train.get(entry.train_id.as_str()) else {
                continue;
            };
            let delay = train.delay_minutes(entry.actual_arrival);
            if delay <= EXCESSIVE_DELAY_MINUTES {
                continue;
            }
            let Some(station) = self.by_station.get(entry.station_id.as_str()) else {
                continue;
            };

            let target = free_platforms(
                entries.iter().copied(),
                &entry.station_id,
                station.platforms,
                train.scheduled_arrival,
                train.scheduled_departure,
            )
            .into_iter()
            .find(|&p| p != entry.assigned_platform);

            if let Some(platform) = target {
                let reduction = delay.min(MAX_MOVE_REDUCTION_MINUTES);
                recs.push(
                    Recommendation::new(
                        ActionKind::MoveTrain,
                        &entry.train_id,
                        format!("Move {} to Platform {platform} to reduce delay", entry.train_id),
                    )
                    .at_station(&entry.station_id)
                    .to_platform(platform)
                    .with_cost_benefit(reduction, 0, 0.6)
                    .with_delay_change(-reduction),
                );
            }
        }
        recs
    }

    /// Moves up to two trains off each overloaded platform.
    fn rebalance(&self, entries: &[&ScheduleEntry]) -> Vec<Recommendation> {
        let mut recs = Vec::new();
        for station in self.stations {
            let usage = platform_utilization(entries, station);

            for (i, &util) in usage.iter().enumerate() {
                if util <= OVERLOAD_UTILIZATION {
                    continue;
                }
                let platform = i as u32 + 1;
                let Some(alt) = usage
                    .iter()
                    .enumerate()
                    .find(|&(j, &u)| j != i && u < SPARE_UTILIZATION)
                    .map(|(j, _)| j as u32 + 1)
                else {
                    continue;
                };

                let on_platform = entries
                    .iter()
                    .filter(|e| e.station_id == station.id && e.assigned_platform == platform)
                    .take(REBALANCE_PER_PLATFORM);
                for entry in on_platform {
                    recs.push(
                        Recommendation::new(
                            ActionKind::MoveTrain,
                            &entry.train_id,
                            format!(
                                "Move {} from overloaded Platform {platform} to Platform {alt}",
                                entry.train_id
                            ),
                        )
                        .at_station(&station.id)
                        .to_platform(alt)
                        .with_cost_benefit(REBALANCE_REDUCTION_MINUTES, 0, 0.5),
                    );
                }
            }
        }
        recs
    }
}

/// Busy fraction of the day for each platform of `station`, index 0 = P1.
pub fn platform_utilization(entries: &[&ScheduleEntry], station: &Station) -> Vec<f64> {
    let mut busy = vec![0.0; station.platforms as usize];
    for e in entries {
        if e.station_id == station.id && station.has_platform(e.assigned_platform) {
            busy[e.assigned_platform as usize - 1] += e.dwell_minutes();
        }
    }
    busy.into_iter()
        .map(|minutes| (minutes / OPERATING_DAY_MINUTES).min(1.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::train::fixtures::at;
    use crate::models::Provenance;

    fn schedule(entries: Vec<ScheduleEntry>) -> Schedule {
        Schedule::from_entries(entries, Provenance::Greedy)
    }

    #[test]
    fn test_overlap_recommendations() {
        let stations = vec![Station::new("S1", 2)];
        let trains = vec![
            Train::new("A", "S1", at(8, 0), at(8, 10)),
            Train::new("B", "S1", at(8, 1), at(8, 11)),
        ];
        let s = schedule(vec![
            ScheduleEntry::new("A", "S1", 1, at(8, 0), at(8, 10)),
            ScheduleEntry::new("B", "S1", 1, at(8, 1), at(8, 11)),
        ]);

        let recs = RecommendationEngine::new(&trains, &stations).recommend(&s, None, 10);
        assert_eq!(recs.len(), 4);

        assert_eq!(recs[0].action, ActionKind::ChangePlatform);
        assert_eq!(recs[0].description, "Move B from Platform 1 to Platform 2");
        assert_eq!(recs[0].new_platform, Some(2));
        assert!((recs[0].score() - 1.0).abs() < 1e-10);

        assert_eq!(recs[1].action, ActionKind::ChangePlatform);
        assert_eq!(recs[1].description, "Move B to Platform 2 to avoid headway conflict");

        assert_eq!(recs[2].action, ActionKind::DelayTrain);
        assert_eq!(recs[2].delay_minutes, Some(16));
        assert!((recs[2].score() - 0.6).abs() < 1e-10);

        assert_eq!(recs[3].delay_minutes, Some(14));
        assert!((recs[3].cost_benefit.delay_reduction + 14.0).abs() < 1e-10);
        assert!((recs[3].impact.total_delay_change - 14.0).abs() < 1e-10);
        assert!((recs[3].score() - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_truncation() {
        let stations = vec![Station::new("S1", 2)];
        let trains = vec![
            Train::new("A", "S1", at(8, 0), at(8, 10)),
            Train::new("B", "S1", at(8, 1), at(8, 11)),
        ];
        let s = schedule(vec![
            ScheduleEntry::new("A", "S1", 1, at(8, 0), at(8, 10)),
            ScheduleEntry::new("B", "S1", 1, at(8, 1), at(8, 11)),
        ]);
        let recs = RecommendationEngine::new(&trains, &stations).recommend(&s, None, 2);
        assert_eq!(recs.len(), 2);
    }

    #[test]
    fn test_priority_swap() {
        let stations = vec![Station::new("S1", 2)];
        let trains = vec![
            Train::new("SLOW", "S1", at(8, 0), at(8, 5)).with_priority(1),
            Train::new("FAST", "S1", at(8, 10), at(8, 15)).with_priority(5),
        ];
        let s = schedule(vec![
            ScheduleEntry::new("SLOW", "S1", 1, at(8, 0), at(8, 5)),
            ScheduleEntry::new("FAST", "S1", 2, at(8, 10), at(8, 15)),
        ]);

        let recs = RecommendationEngine::new(&trains, &stations).recommend(&s, None, 10);
        assert_eq!(recs.len(), 1);
        let r = &recs[0];
        assert_eq!(r.action, ActionKind::SwapPriority);
        assert_eq!(r.train_id, "SLOW");
        assert_eq!(r.delay_minutes, Some(10));
        assert_eq!(r.description, "Give priority to FAST by delaying SLOW");
        // 0.8 + 0.1 + 0.1
        assert!((r.score() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_excessive_delay_move() {
        let stations = vec![Station::new("S1", 3)];
        let trains = vec![
            Train::new("X", "S1", at(8, 0), at(8, 10)),
            Train::new("Y", "S1", at(8, 0), at(8, 10)),
        ];
        let s = schedule(vec![
            ScheduleEntry::new("Y", "S1", 2, at(8, 0), at(8, 10)),
            ScheduleEntry::new("X", "S1", 1, at(8, 20), at(8, 30)),
        ]);

        let none: Vec<Conflict> = Vec::new();
        let recs = RecommendationEngine::new(&trains, &stations).recommend(&s, Some(none.as_slice()), 10);
        assert_eq!(recs.len(), 1);
        let r = &recs[0];
        assert_eq!(r.action, ActionKind::MoveTrain);
        assert_eq!(r.train_id, "X");
        assert_eq!(r.new_platform, Some(3));
        assert!((r.cost_benefit.delay_reduction - 10.0).abs() < 1e-10);
        assert!((r.impact.total_delay_change + 10.0).abs() < 1e-10);
        // 0.6 + 0.2 + 0.1
        assert!((r.score() - 0.9).abs() < 1e-10);
    }

    #[test]
    fn test_rebalance_overloaded_platform() {
        let stations = vec![Station::new("S1", 2)];
        let trains = vec![
            Train::new("T1", "S1", at(0, 0), at(10, 0)),
            Train::new("T2", "S1", at(10, 0), at(20, 0)),
        ];
        let s = schedule(vec![
            ScheduleEntry::new("T1", "S1", 1, at(0, 0), at(10, 0)),
            ScheduleEntry::new("T2", "S1", 1, at(10, 0), at(20, 0)),
        ]);

        let entries: Vec<&ScheduleEntry> = s.entries().collect();
        let usage = platform_utilization(&entries, &stations[0]);
        assert!((usage[0] - 1200.0 / 1440.0).abs() < 1e-10);
        assert_eq!(usage[1], 0.0);

        let none: Vec<Conflict> = Vec::new();
        let recs = RecommendationEngine::new(&trains, &stations).recommend(&s, Some(none.as_slice()), 10);
        assert_eq!(recs.len(), 2);
        for r in &recs {
            assert_eq!(r.action, ActionKind::MoveTrain);
            assert_eq!(r.new_platform, Some(2));
            assert!(r.description.contains("overloaded Platform 1"));
            assert!((r.cost_benefit.delay_reduction - 5.0).abs() < 1e-10);
            assert!((r.score() - 0.6).abs() < 1e-10);
        }
    }

    #[test]
    fn test_clean_schedule_has_no_recommendations() {
        let stations = vec![Station::new("S1", 2)];
        let trains = vec![Train::new("A", "S1", at(8, 0), at(8, 10))];
        let s = schedule(vec![ScheduleEntry::new("A", "S1", 1, at(8, 0), at(8, 10))]);
        assert!(RecommendationEngine::new(&trains, &stations)
            .recommend(&s, None, 10)
            .is_empty());
    }
}
