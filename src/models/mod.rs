//! Platform scheduling domain models.
//!
//! Provides the data types shared by the schedulers, the conflict detector
//! and the recommendation engine. All types are plain data with serde
//! support; behavior lives in the components that consume them.
//!
//! # Domain Mappings
//!
//! | u-platform | Railway operations |
//! |------------|--------------------|
//! | Station | Station with numbered platforms |
//! | Train | Timetabled arrival/departure at an origin station |
//! | ScheduleEntry | Platform + time window committed for a train |
//! | Conflict | Double-booking, short headway, priority inversion |
//! | Recommendation | Proposed platform move or delay |

mod conflict;
mod disruption;
mod recommendation;
mod schedule;
mod station;
pub(crate) mod train;

pub use conflict::{Conflict, ConflictKind, Severity};
pub use disruption::{
    apply_delays, ActiveDelay, DelayKind, DelaySet, Overrides, MAX_DELAY_MINUTES,
};
pub use recommendation::{ActionKind, CostBenefit, Impact, Recommendation};
pub use schedule::{
    entries_by_platform, free_platforms, Placement, Provenance, Schedule, ScheduleEntry,
    SolverStatus, UnplacedReason,
};
pub use station::Station;
pub use train::{minutes_between, Train};
