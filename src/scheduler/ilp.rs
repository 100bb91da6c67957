//! Exact platform scheduler (integer linear program).
//!
//! # Formulation
//!
//! The day is split into 288 slots of 5 minutes.
//!
//! Variables:
//! - `x[t, p, s]` binary: train `t` arrives on platform `p` in slot `s`
//! - `d[t] >= 0`: delay of train `t` in minutes
//!
//! Objective:
//! ```text
//! min  1.0 * sum(d[t]) + 10.0 * sum(x in cells shared by several trains)
//! ```
//!
//! Constraints:
//! 1. `sum(x[t, *, *]) = 1` for each train
//! 2. `sum(x[*, p, s]) <= 1` per (station, platform, slot)
//! 3. overridden trains only have variables on their forced platform
//! 4. `d[t] >= (s - scheduled_slot(t)) * 5 * x[t, p, s]`
//! 5. `sum(x[*, p, s]) + sum(x[*, p, s + 1]) <= 1` (adjacent-slot headway)
//!
//! Candidate slots start at the train's scheduled slot and extend at most
//! `max_shift_slots` slots later.
//!
//! # Solving
//! Built with `good_lp` on the pure-Rust `microlp` backend. The solve runs
//! on a worker thread; the caller waits at most the time limit and reports
//! [`SolverStatus::TimedOut`] otherwise. `optimize` falls back to the
//! greedy scheduler for the whole run on any non-optimal status.
//!
//! `microlp` cannot be interrupted, so a timed-out worker keeps running
//! detached until its solve finishes and then exits; its result is dropped.
//! Each abandoned worker is logged as `solver_abandoned`. Callers that issue
//! many solves against a tight limit (a feasibility check runs one solve per
//! platform) can accumulate such workers and should size
//! `time_limit_seconds` and `max_shift_slots` accordingly.

use std::collections::{BTreeMap, HashMap};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use good_lp::{
    constraint, default_solver, variable, Constraint, Expression, ProblemVariables,
    ResolutionError, Solution, SolverModel, Variable,
};
use tracing::{debug, info, warn};

use super::{GreedyScheduler, Scheduler};
use crate::config::{
    PlannerConfig, CONFLICT_WEIGHT, DELAY_WEIGHT, SLOTS_PER_DAY, SLOT_MINUTES,
};
use crate::models::{
    apply_delays, minutes_between, DelaySet, Overrides, Placement, Provenance, Schedule,
    ScheduleEntry, SolverStatus, Station, Train, UnplacedReason,
};

/// Result of one exact solve.
#[derive(Debug, Clone, PartialEq)]
pub struct IlpSolution {
    /// Final solver status.
    pub status: SolverStatus,
    /// Per-train outcomes. Empty unless `status` is `Optimal`.
    pub placements: Vec<Placement>,
}

/// Exact scheduler with a greedy fallback.
#[derive(Debug, Clone)]
pub struct IlpScheduler {
    time_limit: Duration,
    max_shift_slots: Option<u32>,
    fallback: GreedyScheduler,
}

/// Variables owned by one train.
#[derive(Debug, Clone)]
struct Candidate {
    train: usize,
    station: usize,
    platforms: Vec<u32>,
    first_slot: u32,
    last_slot: u32,
}

/// Chosen (platform, slot) per candidate, in candidate order.
type Assignment = Vec<Option<(u32, u32)>>;

/// Slot index of a wall-clock time.
fn slot_of(time: NaiveDateTime) -> u32 {
    time.time().num_seconds_from_midnight() / 60 / SLOT_MINUTES as u32
}

/// Midnight of `time`'s day plus `slot` slots.
fn slot_start(time: NaiveDateTime, slot: u32) -> NaiveDateTime {
    time.date().and_time(NaiveTime::MIN) + chrono::Duration::minutes(i64::from(slot) * SLOT_MINUTES)
}

impl Default for IlpScheduler {
    fn default() -> Self {
        Self::from_config(&PlannerConfig::default())
    }
}

impl IlpScheduler {
    /// Creates a scheduler with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scheduler from planner settings.
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self {
            time_limit: config.time_limit(),
            max_shift_slots: config.max_shift_slots,
            fallback: GreedyScheduler::with_config(config.greedy.clone()),
        }
    }

    /// Sets the wall-clock limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = limit;
        self
    }

    /// Sets the candidate slot window.
    pub fn with_max_shift_slots(mut self, slots: Option<u32>) -> Self {
        self.max_shift_slots = slots;
        self
    }

    /// Sets the fallback scheduler.
    pub fn with_fallback(mut self, fallback: GreedyScheduler) -> Self {
        self.fallback = fallback;
        self
    }

    /// Builds and solves the program without falling back.
    pub fn solve(
        &self,
        trains: &[Train],
        stations: &[Station],
        overrides: &Overrides,
        delays: &DelaySet,
    ) -> IlpSolution {
        let shifted = apply_delays(trains, delays);
        let station_index: HashMap<&str, usize> = stations
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.as_str(), i))
            .collect();

        let mut candidates = Vec::new();
        for (i, train) in shifted.iter().enumerate() {
            let Some(&si) = station_index.get(train.origin.as_str()) else {
                warn!(
                    event = "unknown_station",
                    train_id = %train.id,
                    station_id = %train.origin,
                    "station not found for train"
                );
                continue;
            };
            let station = &stations[si];
            let platforms: Vec<u32> = match overrides.get(&train.id) {
                Some(&p) => station.platform_numbers().filter(|&n| n == p).collect(),
                None => station.platform_numbers().collect(),
            };
            let first_slot = slot_of(train.scheduled_arrival).min(SLOTS_PER_DAY - 1);
            let last_slot = match self.max_shift_slots {
                Some(shift) => first_slot.saturating_add(shift).min(SLOTS_PER_DAY - 1),
                None => SLOTS_PER_DAY - 1,
            };

            if platforms.is_empty() {
                warn!(
                    event = "ilp_no_candidates",
                    train_id = %train.id,
                    station_id = %station.id,
                    "no platform can host train"
                );
                return IlpSolution {
                    status: SolverStatus::Infeasible,
                    placements: Vec::new(),
                };
            }

            candidates.push(Candidate {
                train: i,
                station: si,
                platforms,
                first_slot,
                last_slot,
            });
        }

        info!(
            event = "ilp_start",
            trains = candidates.len(),
            time_limit_ms = self.time_limit.as_millis() as u64
        );

        let assignment = if candidates.is_empty() {
            Ok(Vec::new())
        } else {
            self.run_with_limit(candidates.clone())
        };

        let chosen = match assignment {
            Ok(chosen) => chosen,
            Err(status) => {
                warn!(event = "ilp_not_optimal", status = ?status);
                return IlpSolution {
                    status,
                    placements: Vec::new(),
                };
            }
        };

        let by_train: HashMap<usize, Option<(u32, u32)>> = candidates
            .iter()
            .zip(chosen)
            .map(|(c, choice)| (c.train, choice))
            .collect();

        let placements = shifted
            .iter()
            .enumerate()
            .map(|(i, train)| match by_train.get(&i) {
                None => Placement::Unplaceable {
                    train_id: train.id.clone(),
                    reason: UnplacedReason::UnknownStation(train.origin.clone()),
                },
                Some(None) => Placement::Unplaceable {
                    train_id: train.id.clone(),
                    reason: UnplacedReason::NoSolverAssignment,
                },
                Some(Some((platform, slot))) => {
                    Placement::Placed(Self::entry(train, *platform, *slot, delays))
                }
            })
            .collect();

        info!(event = "ilp_complete", status = "optimal");
        IlpSolution {
            status: SolverStatus::Optimal,
            placements,
        }
    }

    fn entry(train: &Train, platform: u32, slot: u32, delays: &DelaySet) -> ScheduleEntry {
        let arrival = slot_start(train.scheduled_arrival, slot).max(train.scheduled_arrival);
        let departure = arrival + train.dwell();
        let delay = minutes_between(train.scheduled_arrival, arrival);

        let mut reason = format!("ILP optimized to P{platform}");
        if delay > 0.0 {
            reason.push_str(&format!(", delayed {delay:.1}min"));
        }
        if let Some(d) = delays.get(&train.id) {
            reason.push_str(&format!(
                ", DELAY: {} delay applied ({} min)",
                d.kind.label(),
                d.minutes
            ));
        }

        debug!(
            event = "train_assigned",
            train_id = %train.id,
            platform,
            slot,
            delay_minutes = delay
        );
        ScheduleEntry::new(&train.id, &train.origin, platform, arrival, departure).with_reason(reason)
    }

    /// Solves on a worker thread, waiting at most the time limit.
    fn run_with_limit(&self, candidates: Vec<Candidate>) -> Result<Assignment, SolverStatus> {
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("ilp-solver".into())
            .spawn(move || {
                // The receiver is gone after a timeout.
                let _ = tx.send(solve_model(&candidates));
            });
        if let Err(e) = spawned {
            return Err(SolverStatus::Error(format!("failed to start solver: {e}")));
        }

        match rx.recv_timeout(self.time_limit) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(
                    event = "solver_abandoned",
                    time_limit_ms = self.time_limit.as_millis() as u64,
                    "worker left running after timeout"
                );
                Err(SolverStatus::TimedOut)
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(SolverStatus::Error("solver thread terminated".into()))
            }
        }
    }
}

fn sum(vars: &[Variable]) -> Expression {
    vars.iter().fold(Expression::from(0.0), |acc, v| acc + *v)
}

fn solve_model(candidates: &[Candidate]) -> Result<Assignment, SolverStatus> {
    let mut vars = ProblemVariables::new();
    let mut cells: BTreeMap<(usize, u32, u32), Vec<Variable>> = BTreeMap::new();
    let mut per_train: Vec<Vec<(u32, u32, Variable)>> = Vec::with_capacity(candidates.len());
    let mut constraints: Vec<Constraint> = Vec::new();
    let mut objective = Expression::from(0.0);

    for c in candidates {
        let delay = vars.add(variable().min(0.0));
        objective += DELAY_WEIGHT * delay;

        let mut own = Vec::new();
        for &platform in &c.platforms {
            for slot in c.first_slot..=c.last_slot {
                let x = vars.add(variable().binary());
                cells.entry((c.station, platform, slot)).or_default().push(x);
                own.push((platform, slot, x));

                let slot_delay = f64::from(slot - c.first_slot) * SLOT_MINUTES as f64;
                if slot_delay > 0.0 {
                    constraints.push(constraint!(delay >= slot_delay * x));
                }
            }
        }
        let own_vars: Vec<Variable> = own.iter().map(|&(_, _, x)| x).collect();
        constraints.push(constraint!(sum(&own_vars) == 1.0));
        per_train.push(own);
    }

    for (&(station, platform, slot), cell) in &cells {
        if cell.len() > 1 {
            if slot < SLOTS_PER_DAY - 1 {
                objective += CONFLICT_WEIGHT * sum(cell);
            }
            constraints.push(constraint!(sum(cell) <= 1.0));
        }
        if let Some(next) = cells.get(&(station, platform, slot + 1)) {
            constraints.push(constraint!(sum(cell) + sum(next) <= 1.0));
        }
    }

    let mut model = vars.minimise(objective).using(default_solver);
    for c in constraints {
        model.add_constraint(c);
    }

    let solution = model.solve().map_err(|e| match e {
        ResolutionError::Infeasible => SolverStatus::Infeasible,
        other => SolverStatus::Error(other.to_string()),
    })?;

    Ok(per_train
        .iter()
        .map(|own| {
            own.iter()
                .find(|&&(_, _, x)| solution.value(x) > 0.5)
                .map(|&(platform, slot, _)| (platform, slot))
        })
        .collect())
}

impl Scheduler for IlpScheduler {
    fn name(&self) -> &'static str {
        "ilp"
    }

    fn optimize(
        &self,
        trains: &[Train],
        stations: &[Station],
        overrides: &Overrides,
        delays: &DelaySet,
    ) -> Schedule {
        let solution = self.solve(trains, stations, overrides, delays);
        if solution.status == SolverStatus::Optimal {
            return Schedule {
                placements: solution.placements,
                provenance: Provenance::Ilp {
                    status: SolverStatus::Optimal,
                },
            };
        }

        warn!(
            event = "ilp_fallback",
            status = ?solution.status,
            "falling back to greedy scheduler"
        );
        let mut schedule = self.fallback.schedule(trains, stations, overrides, delays);
        schedule.provenance = Provenance::GreedyFallback {
            status: solution.status,
        };
        schedule
    }
}
