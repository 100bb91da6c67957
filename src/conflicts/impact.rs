//! Aggregate impact of a set of conflicts.
//!
//! # Scores
//!
//! | Score | Definition |
//! |-------|-----------|
//! | Delay risk | overlap: 10 (critical) or 5; headway: 5; priority: 3 (min) |
//! | Safety | max(0, 1 - 0.3 * critical - 0.2 * high) |
//! | Efficiency | max(0, 1 - 0.1 * total) |

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::MIN_HEADWAY_MINUTES;
use crate::models::{Conflict, ConflictKind, Severity};

/// Conflict counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Conflict counts per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCounts {
    pub platform_overlap: usize,
    pub headway_violation: usize,
    pub priority_conflict: usize,
}

/// Summary of how badly a schedule is affected by its conflicts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactReport {
    pub total_conflicts: usize,
    pub by_severity: SeverityCounts,
    pub by_type: KindCounts,
    /// Distinct trains involved in any conflict, sorted.
    pub affected_trains: Vec<String>,
    pub affected_train_count: usize,
    /// Estimated minutes of delay needed to resolve everything.
    pub estimated_delay_risk_minutes: f64,
    /// 1.0 = no critical/high conflicts.
    pub safety_score: f64,
    /// 1.0 = no conflicts at all.
    pub efficiency_score: f64,
}

impl SeverityCounts {
    /// Count for one severity.
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    fn bump(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }
}

impl KindCounts {
    /// Count for one kind.
    pub fn get(&self, kind: ConflictKind) -> usize {
        match kind {
            ConflictKind::PlatformOverlap => self.platform_overlap,
            ConflictKind::HeadwayViolation => self.headway_violation,
            ConflictKind::PriorityConflict => self.priority_conflict,
        }
    }

    fn bump(&mut self, kind: ConflictKind) {
        match kind {
            ConflictKind::PlatformOverlap => self.platform_overlap += 1,
            ConflictKind::HeadwayViolation => self.headway_violation += 1,
            ConflictKind::PriorityConflict => self.priority_conflict += 1,
        }
    }
}

/// Minutes of delay a single conflict is expected to cost.
pub fn delay_risk(conflict: &Conflict) -> f64 {
    match conflict.kind {
        ConflictKind::PlatformOverlap if conflict.severity == Severity::Critical => 10.0,
        ConflictKind::PlatformOverlap => 5.0,
        ConflictKind::HeadwayViolation => MIN_HEADWAY_MINUTES,
        ConflictKind::PriorityConflict => 3.0,
    }
}

impl ImpactReport {
    /// Aggregates `conflicts`.
    pub fn from_conflicts(conflicts: &[Conflict]) -> Self {
        let mut by_severity = SeverityCounts::default();
        let mut by_type = KindCounts::default();
        let mut affected = BTreeSet::new();
        let mut risk = 0.0;

        for c in conflicts {
            by_severity.bump(c.severity);
            by_type.bump(c.kind);
            affected.extend(c.trains_involved.iter().cloned());
            risk += delay_risk(c);
        }

        let total = conflicts.len();
        let safety = 1.0 - (by_severity.critical as f64 * 0.3 + by_severity.high as f64 * 0.2);
        let efficiency = 1.0 - total as f64 * 0.1;

        Self {
            total_conflicts: total,
            by_severity,
            by_type,
            affected_train_count: affected.len(),
            affected_trains: affected.into_iter().collect(),
            estimated_delay_risk_minutes: risk,
            safety_score: safety.max(0.0),
            efficiency_score: efficiency.max(0.0),
        }
    }

    /// Whether no conflict was found.
    pub fn is_clean(&self) -> bool {
        self.total_conflicts == 0
    }
}

impl Default for ImpactReport {
    fn default() -> Self {
        Self::from_conflicts(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conflict(kind: ConflictKind, severity: Severity, trains: &[&str]) -> Conflict {
        Conflict::new(
            kind,
            "S1",
            trains.iter().map(|t| t.to_string()).collect(),
            severity,
            "",
        )
    }

    #[test]
    fn test_empty_report() {
        let r = ImpactReport::default();
        assert!(r.is_clean());
        assert!((r.safety_score - 1.0).abs() < 1e-10);
        assert!((r.efficiency_score - 1.0).abs() < 1e-10);
        assert!((r.estimated_delay_risk_minutes - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_report_counts_and_scores() {
        let conflicts = vec![
            conflict(ConflictKind::PlatformOverlap, Severity::Critical, &["A", "B"]),
            conflict(ConflictKind::PlatformOverlap, Severity::High, &["B", "C"]),
            conflict(ConflictKind::HeadwayViolation, Severity::High, &["A", "B"]),
            conflict(ConflictKind::PriorityConflict, Severity::Medium, &["C", "D"]),
        ];
        let r = ImpactReport::from_conflicts(&conflicts);

        assert_eq!(r.total_conflicts, 4);
        assert_eq!(r.by_severity.get(Severity::Critical), 1);
        assert_eq!(r.by_severity.get(Severity::High), 2);
        assert_eq!(r.by_severity.get(Severity::Medium), 1);
        assert_eq!(r.by_type.get(ConflictKind::PlatformOverlap), 2);
        assert_eq!(r.affected_trains, vec!["A", "B", "C", "D"]);
        assert_eq!(r.affected_train_count, 4);
        // 10 + 5 + 5 + 3
        assert!((r.estimated_delay_risk_minutes - 23.0).abs() < 1e-10);
        // 1 - 0.3 - 0.4
        assert!((r.safety_score - 0.3).abs() < 1e-10);
        assert!((r.efficiency_score - 0.6).abs() < 1e-10);
    }

    #[test]
    fn test_scores_floor_at_zero() {
        let conflicts: Vec<Conflict> = (0..12)
            .map(|_| conflict(ConflictKind::PlatformOverlap, Severity::Critical, &["A", "B"]))
            .collect();
        let r = ImpactReport::from_conflicts(&conflicts);
        assert_eq!(r.safety_score, 0.0);
        assert_eq!(r.efficiency_score, 0.0);
        assert_eq!(r.affected_train_count, 2);
    }
}
