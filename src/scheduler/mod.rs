//! Platform schedulers and KPI evaluation.
//!
//! Two interchangeable strategies assign trains to platforms at their
//! origin station:
//!
//! # Algorithms
//!
//! - [`GreedyScheduler`]: priority-driven first-fit with time shifting and
//!   priority escalation. Fast, not optimal.
//! - [`IlpScheduler`]: time-indexed integer program minimizing delay plus a
//!   shared-slot penalty, with an explicit solver status and a greedy
//!   fallback recorded in the schedule's provenance.
//!
//! # KPI
//!
//! [`ScheduleKpi`] computes delay, on-time and utilization metrics;
//! [`ScheduleDelta`] compares two schedules train by train.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4
//! - Lusby et al. (2011), "Railway track allocation: models and methods"

mod greedy;
mod ilp;
mod kpi;

pub use greedy::GreedyScheduler;
pub use ilp::{IlpScheduler, IlpSolution};
pub use kpi::{PlatformLoad, ScheduleDelta, ScheduleKpi, TrainChange, ON_TIME_TOLERANCE_MINUTES};

use std::fmt::Debug;

use crate::config::{OptimizerMode, PlannerConfig};
use crate::models::{DelaySet, Overrides, Schedule, Station, Train};

/// A platform assignment strategy.
///
/// Implementations hold only configuration, so one instance can serve
/// concurrent callers.
pub trait Scheduler: Send + Sync + Debug {
    /// Short strategy name for logs.
    fn name(&self) -> &'static str;

    /// Assigns every train to a platform at its origin station.
    ///
    /// Active delays shift a train's timetable before assignment; overrides
    /// pin a train to a platform. Trains that cannot be placed appear as
    /// [`Placement::Unplaceable`](crate::models::Placement::Unplaceable).
    fn optimize(
        &self,
        trains: &[Train],
        stations: &[Station],
        overrides: &Overrides,
        delays: &DelaySet,
    ) -> Schedule;
}

/// Returns the scheduler selected by `config.mode`.
pub fn for_mode(config: &PlannerConfig) -> Box<dyn Scheduler> {
    match config.mode {
        OptimizerMode::Greedy => Box::new(GreedyScheduler::with_config(config.greedy.clone())),
        OptimizerMode::Ilp => Box::new(IlpScheduler::from_config(config)),
    }
}
