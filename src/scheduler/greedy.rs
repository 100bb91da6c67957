//! Priority-driven greedy platform scheduler.
//!
//! # Algorithm
//!
//! 1. Apply active delays, shifting each train's timetable window.
//! 2. Order trains: overridden trains first (by arrival), then the rest by
//!    descending priority and ascending arrival.
//! 3. For each train, start at its candidate platform (override, else a
//!    valid preferred platform, else 1) and test whether the window is free.
//! 4. When occupied, try the next platform. When every platform is busy,
//!    push the window back by the delay step and restart at platform 1.
//!    Overridden trains stay on their forced platform and only move in time.
//! 5. Once the accumulated delay reaches the escalation threshold, the
//!    train's effective priority is raised by one, it is requeued and the
//!    pending queue is re-sorted. This happens at most once per train;
//!    delay and attempts carry over.
//! 6. A train still unplaced after the attempt budget is reported as
//!    [`UnplacedReason::AttemptsExhausted`].
//!
//! # Complexity
//! O(n * a * k) where n=trains, a=attempt budget, k=entries per platform.

use std::collections::{HashMap, VecDeque};

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, info, warn};

use super::Scheduler;
use crate::config::GreedyConfig;
use crate::models::{
    apply_delays, ActiveDelay, DelaySet, Overrides, Placement, Provenance, Schedule,
    ScheduleEntry, Station, Train, UnplacedReason, MAX_DELAY_MINUTES,
};

/// Greedy first-fit platform scheduler.
///
/// # Example
///
/// ```
/// use u_platform::models::{DelaySet, Overrides, Station, Train};
/// use u_platform::scheduler::{GreedyScheduler, Scheduler};
/// use chrono::NaiveDate;
///
/// let day = NaiveDate::from_ymd_opt(2025, 9, 14).unwrap();
/// let at = |h, m| day.and_hms_opt(h, m, 0).unwrap();
///
/// let stations = vec![Station::new("S1", 1)];
/// let trains = vec![
///     Train::new("A", "S1", at(8, 0), at(8, 10)),
///     Train::new("B", "S1", at(8, 1), at(8, 11)),
/// ];
///
/// let schedule = GreedyScheduler::new().optimize(
///     &trains,
///     &stations,
///     &Overrides::new(),
///     &DelaySet::new(),
/// );
/// let b = schedule.entry_for_train("B").unwrap();
/// assert_eq!(b.actual_arrival, at(8, 11));
/// ```
#[derive(Debug, Clone, Default)]
pub struct GreedyScheduler {
    config: GreedyConfig,
}

/// A committed occupation of one platform.
#[derive(Debug, Clone)]
struct Occupation {
    arrival: NaiveDateTime,
    departure: NaiveDateTime,
    train_id: String,
}

/// Per-train placement state; survives requeueing.
#[derive(Debug)]
struct Pending {
    train: Train,
    forced: Option<u32>,
    effective_priority: i32,
    escalated: bool,
    attempts: u32,
    delay: i64,
    worked_around: Vec<String>,
}

enum Attempt {
    Placed(ScheduleEntry),
    Escalate(Pending),
    Exhausted(Pending),
}

impl Pending {
    fn sort_key(&self) -> (u8, i64, NaiveDateTime) {
        match self.forced {
            Some(_) => (0, 0, self.train.scheduled_arrival),
            None => (
                1,
                -i64::from(self.effective_priority),
                self.train.scheduled_arrival,
            ),
        }
    }

    /// Current window, including accumulated delay.
    fn window(&self) -> (NaiveDateTime, NaiveDateTime) {
        let shift = Duration::minutes(self.delay.min(MAX_DELAY_MINUTES));
        (
            self.train.scheduled_arrival + shift,
            self.train.scheduled_departure + shift,
        )
    }

    fn candidate_platform(&self, station: &Station) -> u32 {
        if let Some(p) = self.forced {
            return p;
        }
        match self.train.platform_pref {
            Some(p) if station.has_platform(p) => p,
            _ => 1,
        }
    }

    fn record_blocker(&mut self, train_id: &str) {
        if !self.worked_around.iter().any(|t| t == train_id) {
            self.worked_around.push(train_id.to_string());
        }
    }
}

impl GreedyScheduler {
    /// Creates a scheduler with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scheduler with the given settings.
    pub fn with_config(config: GreedyConfig) -> Self {
        Self { config }
    }

    /// Returns the settings.
    pub fn config(&self) -> &GreedyConfig {
        &self.config
    }

    /// Assigns every train to a platform at its origin station.
    pub fn schedule(
        &self,
        trains: &[Train],
        stations: &[Station],
        overrides: &Overrides,
        delays: &DelaySet,
    ) -> Schedule {
        info!(
            event = "greedy_start",
            trains = trains.len(),
            stations = stations.len(),
            overrides = overrides.len(),
            delays = delays.len()
        );

        let by_id: HashMap<&str, &Station> = stations.iter().map(|s| (s.id.as_str(), s)).collect();
        let mut queue = self.initial_queue(trains, &by_id, overrides, delays);
        let mut occupancy: HashMap<(String, u32), Vec<Occupation>> = HashMap::new();
        let mut schedule = Schedule::new(Provenance::Greedy);

        while let Some(pending) = queue.pop_front() {
            let Some(station) = by_id.get(pending.train.origin.as_str()).copied() else {
                warn!(
                    event = "unknown_station",
                    train_id = %pending.train.id,
                    station_id = %pending.train.origin,
                    "station not found for train"
                );
                schedule.push(Placement::Unplaceable {
                    train_id: pending.train.id.clone(),
                    reason: UnplacedReason::UnknownStation(pending.train.origin.clone()),
                });
                continue;
            };

            match self.place(pending, station, &occupancy, delays) {
                Attempt::Placed(entry) => {
                    debug!(
                        event = "train_assigned",
                        train_id = %entry.train_id,
                        station_id = %entry.station_id,
                        platform = entry.assigned_platform,
                        reason = %entry.reason
                    );
                    occupancy
                        .entry((entry.station_id.clone(), entry.assigned_platform))
                        .or_default()
                        .push(Occupation {
                            arrival: entry.actual_arrival,
                            departure: entry.actual_departure,
                            train_id: entry.train_id.clone(),
                        });
                    schedule.push(Placement::Placed(entry));
                }
                Attempt::Escalate(mut pending) => {
                    pending.escalated = true;
                    pending.effective_priority += 1;
                    debug!(
                        event = "priority_escalated",
                        train_id = %pending.train.id,
                        delay_minutes = pending.delay,
                        effective_priority = pending.effective_priority
                    );
                    queue.push_front(pending);
                    queue.make_contiguous().sort_by_key(Pending::sort_key);
                }
                Attempt::Exhausted(pending) => {
                    warn!(
                        event = "train_unplaceable",
                        train_id = %pending.train.id,
                        attempts = pending.attempts,
                        delay_minutes = pending.delay,
                        "attempt budget exhausted"
                    );
                    schedule.push(Placement::Unplaceable {
                        train_id: pending.train.id.clone(),
                        reason: UnplacedReason::AttemptsExhausted {
                            attempts: pending.attempts,
                            delay_minutes: pending.delay,
                        },
                    });
                }
            }
        }

        info!(
            event = "greedy_complete",
            placed = schedule.entry_count(),
            unplaced = schedule.unplaced_count()
        );
        schedule
    }

    fn initial_queue(
        &self,
        trains: &[Train],
        stations: &HashMap<&str, &Station>,
        overrides: &Overrides,
        delays: &DelaySet,
    ) -> VecDeque<Pending> {
        let mut pending: Vec<Pending> = apply_delays(trains, delays)
            .into_iter()
            .map(|train| {
                let forced = overrides.get(&train.id).copied().filter(|&p| {
                    match stations.get(train.origin.as_str()) {
                        Some(station) if !station.has_platform(p) => {
                            warn!(
                                event = "override_ignored",
                                train_id = %train.id,
                                platform = p,
                                platforms = station.platforms,
                                "override platform outside station range"
                            );
                            false
                        }
                        _ => true,
                    }
                });
                Pending {
                    effective_priority: train.priority,
                    train,
                    forced,
                    escalated: false,
                    attempts: 0,
                    delay: 0,
                    worked_around: Vec::new(),
                }
            })
            .collect();
        pending.sort_by_key(Pending::sort_key);
        pending.into()
    }

    /// Runs the placement loop for one train from its candidate platform.
    fn place(
        &self,
        mut pending: Pending,
        station: &Station,
        occupancy: &HashMap<(String, u32), Vec<Occupation>>,
        delays: &DelaySet,
    ) -> Attempt {
        let mut platform = pending.candidate_platform(station);

        while pending.attempts < self.config.max_attempts {
            pending.attempts += 1;
            let (arrival, departure) = pending.window();

            let blocker = occupancy
                .get(&(station.id.clone(), platform))
                .and_then(|slots| {
                    slots
                        .iter()
                        .find(|o| !(departure <= o.arrival || arrival >= o.departure))
                });

            let Some(blocker) = blocker else {
                let reason = self.rationale(&pending, platform, delays.get(&pending.train.id));
                return Attempt::Placed(
                    ScheduleEntry::new(&pending.train.id, &station.id, platform, arrival, departure)
                        .with_reason(reason),
                );
            };
            pending.record_blocker(&blocker.train_id);

            let shifted = if pending.forced.is_some() {
                true
            } else {
                platform += 1;
                if platform > station.platforms {
                    platform = 1;
                    true
                } else {
                    false
                }
            };

            if shifted {
                pending.delay = pending.delay.saturating_add(self.config.delay_step_minutes);
                if !pending.escalated && pending.delay >= self.config.escalation_threshold_minutes {
                    return Attempt::Escalate(pending);
                }
            }
        }

        Attempt::Exhausted(pending)
    }

    fn rationale(&self, pending: &Pending, platform: u32, delay: Option<&ActiveDelay>) -> String {
        let mut bits = Vec::new();
        let train = &pending.train;

        bits.push(match (pending.forced, train.platform_pref) {
            (Some(_), _) => format!("OVERRIDE: fixed to P{platform} by controller"),
            (None, Some(pref)) if pref == platform => format!("assigned to preferred P{platform}"),
            (None, Some(pref)) => format!("moved from P{pref} to P{platform}"),
            (None, None) => format!("assigned to P{platform}"),
        });

        if pending.delay > 0 {
            bits.push(format!("delayed {} min", pending.delay.min(MAX_DELAY_MINUTES)));
            if !pending.worked_around.is_empty() {
                bits.push(format!(
                    "resolved conflicts with {}",
                    pending.worked_around.join(", ")
                ));
            }
        }
        if pending.escalated {
            bits.push(format!(
                "priority escalated to {}",
                pending.effective_priority
            ));
        }
        if let Some(d) = delay {
            bits.push(format!(
                "DELAY: {} delay applied ({} min)",
                d.kind.label(),
                d.minutes
            ));
        }
        if pending.attempts > 1 {
            bits.push(format!("{} attempts", pending.attempts));
        }

        bits.join(", ")
    }
}

impl Scheduler for GreedyScheduler {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn optimize(
        &self,
        trains: &[Train],
        stations: &[Station],
        overrides: &Overrides,
        delays: &DelaySet,
    ) -> Schedule {
        self.schedule(trains, stations, overrides, delays)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::train::fixtures::at;
    use crate::models::{entries_by_platform, DelayKind};
    use proptest::prelude::*;

    fn run(trains: &[Train], stations: &[Station]) -> Schedule {
        GreedyScheduler::new().optimize(trains, stations, &Overrides::new(), &DelaySet::new())
    }

    fn overrides(pairs: &[(&str, u32)]) -> Overrides {
        pairs.iter().map(|(t, p)| (t.to_string(), *p)).collect()
    }

    #[test]
    fn test_disjoint_trains_keep_timetable() {
        let stations = vec![Station::new("S1", 2)];
        let trains = vec![
            Train::new("A", "S1", at(8, 0), at(8, 10)),
            Train::new("B", "S1", at(9, 0), at(9, 10)),
        ];
        let s = run(&trains, &stations);

        assert!(s.is_complete());
        for e in s.entries() {
            assert_eq!(e.assigned_platform, 1);
            assert_eq!(e.reason, "assigned to P1");
        }
        assert_eq!(s.entry_for_train("B").unwrap().actual_arrival, at(9, 0));
    }

    #[test]
    fn test_second_platform_used_before_delay() {
        let stations = vec![Station::new("S1", 2)];
        let trains = vec![
            Train::new("A", "S1", at(8, 0), at(8, 10)),
            Train::new("B", "S1", at(8, 1), at(8, 11)),
        ];
        let s = run(&trains, &stations);

        let b = s.entry_for_train("B").unwrap();
        assert_eq!(b.assigned_platform, 2);
        assert_eq!(b.actual_arrival, at(8, 1));
        assert_eq!(b.reason, "assigned to P2, 2 attempts");
    }

    #[test]
    fn test_single_platform_delays_and_escalates() {
        let stations = vec![Station::new("S1", 1)];
        let trains = vec![
            Train::new("A", "S1", at(8, 0), at(8, 10)),
            Train::new("B", "S1", at(8, 1), at(8, 11)),
        ];
        let s = run(&trains, &stations);

        assert!(s.is_complete());
        let b = s.entry_for_train("B").unwrap();
        assert_eq!(b.assigned_platform, 1);
        assert_eq!(b.actual_arrival, at(8, 11));
        assert_eq!(b.actual_departure, at(8, 21));
        assert!(b.reason.contains("delayed 10 min"));
        assert!(b.reason.contains("resolved conflicts with A"));
        assert!(b.reason.contains("priority escalated to 1"));
        assert!(b.reason.ends_with("6 attempts"));
    }

    #[test]
    fn test_oversized_delay_step_stays_within_one_day() {
        let stations = vec![Station::new("S1", 1)];
        let trains = vec![
            Train::new("A", "S1", at(8, 0), at(8, 10)),
            Train::new("B", "S1", at(8, 1), at(8, 11)),
        ];
        let config = GreedyConfig {
            delay_step_minutes: i64::MAX,
            ..GreedyConfig::default()
        };
        let s = GreedyScheduler::with_config(config).optimize(
            &trains,
            &stations,
            &Overrides::new(),
            &DelaySet::new(),
        );

        let b = s.entry_for_train("B").unwrap();
        assert_eq!(b.actual_arrival, at(8, 1) + Duration::minutes(MAX_DELAY_MINUTES));
        assert_eq!(b.dwell_minutes(), 10.0);
    }

    #[test]
    fn test_priority_ordering() {
        let stations = vec![Station::new("S1", 1)];
        let trains = vec![
            Train::new("LOW", "S1", at(8, 0), at(8, 10)).with_priority(1),
            Train::new("HIGH", "S1", at(8, 5), at(8, 15)).with_priority(5),
        ];
        let s = run(&trains, &stations);

        assert_eq!(s.placements[0].train_id(), "HIGH");
        assert_eq!(s.entry_for_train("HIGH").unwrap().actual_arrival, at(8, 5));
        // LOW must wait until HIGH leaves
        assert!(s.entry_for_train("LOW").unwrap().actual_arrival >= at(8, 15));
    }

    #[test]
    fn test_preferred_platform() {
        let stations = vec![Station::new("S1", 3)];
        let trains = vec![
            Train::new("A", "S1", at(8, 0), at(8, 10)).with_preferred_platform(3),
            Train::new("B", "S1", at(8, 2), at(8, 12)).with_preferred_platform(3),
        ];
        let s = run(&trains, &stations);

        assert_eq!(s.entry_for_train("A").unwrap().reason, "assigned to preferred P3");
        // P3 is the last platform, so the search wraps to P1 with a delay step.
        let b = s.entry_for_train("B").unwrap();
        assert_eq!(b.assigned_platform, 1);
        assert_eq!(b.actual_arrival, at(8, 4));
        assert_eq!(
            b.reason,
            "moved from P3 to P1, delayed 2 min, resolved conflicts with A, 2 attempts"
        );
    }

    #[test]
    fn test_preferred_platform_out_of_range_falls_back_to_first() {
        let stations = vec![Station::new("S1", 2)];
        let trains = vec![Train::new("A", "S1", at(8, 0), at(8, 10)).with_preferred_platform(7)];
        let s = run(&trains, &stations);
        assert_eq!(s.entry_for_train("A").unwrap().assigned_platform, 1);
    }

    #[test]
    fn test_override_is_respected_and_processed_first() {
        let stations = vec![Station::new("S1", 3)];
        let trains = vec![
            Train::new("VIP", "S1", at(8, 0), at(8, 10)).with_priority(9),
            Train::new("OVR", "S1", at(8, 5), at(8, 15)),
        ];
        let s = GreedyScheduler::new().optimize(
            &trains,
            &stations,
            &overrides(&[("OVR", 1)]),
            &DelaySet::new(),
        );

        assert_eq!(s.placements[0].train_id(), "OVR");
        let ovr = s.entry_for_train("OVR").unwrap();
        assert_eq!(ovr.assigned_platform, 1);
        assert_eq!(ovr.reason, "OVERRIDE: fixed to P1 by controller");
        assert_eq!(s.entry_for_train("VIP").unwrap().assigned_platform, 2);
    }

    #[test]
    fn test_override_only_shifts_in_time() {
        let stations = vec![Station::new("S1", 3)];
        let trains = vec![
            Train::new("A", "S1", at(8, 0), at(8, 10)),
            Train::new("B", "S1", at(8, 0), at(8, 10)),
        ];
        let s = GreedyScheduler::new().optimize(
            &trains,
            &stations,
            &overrides(&[("A", 2), ("B", 2)]),
            &DelaySet::new(),
        );

        let b = s.entry_for_train("B").unwrap();
        assert_eq!(b.assigned_platform, 2);
        assert_eq!(b.actual_arrival, at(8, 10));
    }

    #[test]
    fn test_out_of_range_override_ignored() {
        let stations = vec![Station::new("S1", 2)];
        let trains = vec![Train::new("A", "S1", at(8, 0), at(8, 10))];
        let s = GreedyScheduler::new().optimize(
            &trains,
            &stations,
            &overrides(&[("A", 5)]),
            &DelaySet::new(),
        );
        assert_eq!(s.entry_for_train("A").unwrap().assigned_platform, 1);
    }

    #[test]
    fn test_unknown_station_is_unplaceable() {
        let stations = vec![Station::new("S1", 2)];
        let trains = vec![
            Train::new("A", "S1", at(8, 0), at(8, 10)),
            Train::new("X", "NOWHERE", at(8, 0), at(8, 10)),
        ];
        let s = run(&trains, &stations);

        assert_eq!(s.entry_count(), 1);
        let (id, reason) = s.unplaced().next().unwrap();
        assert_eq!(id, "X");
        assert_eq!(reason, &UnplacedReason::UnknownStation("NOWHERE".into()));
    }

    #[test]
    fn test_attempt_budget_exhausted() {
        let stations = vec![Station::new("S1", 1)];
        let trains = vec![
            Train::new("BLOCK", "S1", at(6, 0), at(12, 0)).with_priority(5),
            Train::new("LATE", "S1", at(8, 0), at(8, 10)),
        ];
        let s = run(&trains, &stations);

        assert!(s.entry_for_train("LATE").is_none());
        let (id, reason) = s.unplaced().next().unwrap();
        assert_eq!(id, "LATE");
        assert_eq!(
            reason,
            &UnplacedReason::AttemptsExhausted {
                attempts: 50,
                delay_minutes: 100
            }
        );
    }

    #[test]
    fn test_custom_attempt_budget() {
        let stations = vec![Station::new("S1", 1)];
        let trains = vec![
            Train::new("A", "S1", at(8, 0), at(8, 10)),
            Train::new("B", "S1", at(8, 0), at(8, 10)),
        ];
        let config = GreedyConfig {
            max_attempts: 3,
            ..GreedyConfig::default()
        };
        let s = GreedyScheduler::with_config(config).optimize(
            &trains,
            &stations,
            &Overrides::new(),
            &DelaySet::new(),
        );
        assert_eq!(s.unplaced_count(), 1);
    }

    #[test]
    fn test_active_delay_shifts_window() {
        let stations = vec![Station::new("S1", 1)];
        let trains = vec![Train::new("A", "S1", at(8, 0), at(8, 10))];
        let mut delays = DelaySet::new();
        delays.insert("A".into(), ActiveDelay::new(DelayKind::Breakdown, 60));

        let s = GreedyScheduler::new().optimize(&trains, &stations, &Overrides::new(), &delays);
        let a = s.entry_for_train("A").unwrap();
        assert_eq!(a.actual_arrival, at(9, 0));
        assert_eq!(a.actual_departure, at(9, 10));
        assert!(a.reason.contains("DELAY: breakdown delay applied (60 min)"));
    }

    #[test]
    fn test_escalation_requeues_ahead_of_pending() {
        // C would take the 08:11 window on P1 if B were not requeued first.
        let stations = vec![Station::new("S1", 1)];
        let trains = vec![
            Train::new("A", "S1", at(8, 0), at(8, 10)).with_priority(3),
            Train::new("B", "S1", at(8, 1), at(8, 11)).with_priority(2),
            Train::new("C", "S1", at(8, 11), at(8, 20)).with_priority(2),
        ];
        let s = run(&trains, &stations);
        let order: Vec<_> = s.placements.iter().map(Placement::train_id).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
        assert_eq!(s.entry_for_train("B").unwrap().actual_arrival, at(8, 11));
        assert!(s.entry_for_train("C").unwrap().actual_arrival >= at(8, 21));
    }

    #[test]
    fn test_deterministic() {
        let stations = vec![Station::new("S1", 2)];
        let trains: Vec<Train> = (0..8)
            .map(|i| Train::new(format!("T{i}"), "S1", at(8, i * 3), at(8, i * 3 + 12)))
            .collect();
        let a = run(&trains, &stations);
        let b = run(&trains, &stations);
        assert_eq!(a, b);
    }

    fn arb_trains() -> impl Strategy<Value = Vec<Train>> {
        prop::collection::vec((0u32..600, 1u32..40, 0i32..5, 0u32..4), 1..12).prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (start, dwell, prio, pref))| {
                    let arrival = at(6, 0) + Duration::minutes(i64::from(start));
                    let t = Train::new(format!("T{i}"), "S1", arrival, arrival + Duration::minutes(i64::from(dwell)))
                        .with_priority(prio);
                    if pref > 0 {
                        t.with_preferred_platform(pref)
                    } else {
                        t
                    }
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_greedy_invariants(trains in arb_trains(), platforms in 1u32..4) {
            let stations = vec![Station::new("S1", platforms)];
            let s = run(&trains, &stations);

            prop_assert_eq!(s.placements.len(), trains.len());
            for e in s.entries() {
                let t = trains.iter().find(|t| t.id == e.train_id).unwrap();
                prop_assert!(e.assigned_platform >= 1 && e.assigned_platform <= platforms);
                prop_assert_eq!(e.actual_departure - e.actual_arrival, t.dwell());
                prop_assert!(e.actual_arrival >= t.scheduled_arrival);
            }
            for group in entries_by_platform(s.entries()).values() {
                for pair in group.windows(2) {
                    prop_assert!(pair[0].actual_departure <= pair[1].actual_arrival);
                }
            }
        }
    }
}
