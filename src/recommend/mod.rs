//! Ranked corrective actions for a schedule.
//!
//! # Sources
//!
//! | Source | Trigger | Actions |
//! |--------|---------|---------|
//! | Platform overlap | detected conflict | change platform, delay |
//! | Headway violation | detected conflict | delay, change platform |
//! | Priority conflict | detected conflict | swap priority (delay lower train 10 min) |
//! | Excessive delay | train delayed > 15 min | move train |
//! | Overloaded platform | utilization > 80% | move train |
//!
//! Recommendations are advisory; applying one is the caller's decision
//! (see [`crate::session::DispatchSession::apply_recommendation`]).

mod engine;
mod scoring;

pub use engine::{
    platform_utilization, RecommendationEngine, EXCESSIVE_DELAY_MINUTES, OVERLOAD_UTILIZATION,
    SPARE_UTILIZATION,
};
pub use scoring::{adjusted_score, rank, score_recommendations};

use crate::models::{Recommendation, Schedule, Station, Train};

/// Detects conflicts in `schedule` and returns at most `max` ranked
/// recommendations.
pub fn generate_recommendations(
    trains: &[Train],
    stations: &[Station],
    schedule: &Schedule,
    max: usize,
) -> Vec<Recommendation> {
    RecommendationEngine::new(trains, stations).recommend(schedule, None, max)
}
