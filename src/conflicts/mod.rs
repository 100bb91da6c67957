//! Conflict detection and impact analysis.
//!
//! Conflicts are derived from a schedule on demand and never stored as
//! authoritative state. Three kinds are detected:
//!
//! | Kind | Condition | Severity |
//! |------|-----------|----------|
//! | Platform overlap | previous departure > next arrival on a platform | by overlap: >10 critical, >5 high, >2 medium, else low |
//! | Headway violation | gap < 5 min on a platform | <2 high, else medium |
//! | Priority conflict | lower priority arrives first, within 30 min | <=15 high, else medium |

mod detector;
mod impact;

pub use detector::{overlap_severity, ConflictDetector, PRIORITY_WINDOW_MINUTES};
pub use impact::{delay_risk, ImpactReport, KindCounts, SeverityCounts};

use tracing::debug;

use crate::models::{Conflict, Schedule, Station, Train};

/// Detects conflicts in `schedule` and summarizes their impact.
pub fn detect_conflicts(
    trains: &[Train],
    stations: &[Station],
    schedule: &Schedule,
) -> (Vec<Conflict>, ImpactReport) {
    let detector = ConflictDetector::new(trains, stations);
    let conflicts = detector.detect(schedule.entries());
    let impact = detector.summarize(&conflicts);
    debug!(
        event = "conflicts_detected",
        total = impact.total_conflicts,
        critical = impact.by_severity.critical,
        high = impact.by_severity.high,
        safety_score = impact.safety_score
    );
    (conflicts, impact)
}
