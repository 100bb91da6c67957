//! Recommendation scoring and ranking.
//!
//! Starting from each recommendation's base `cost_score`:
//!
//! | Condition | Adjustment |
//! |-----------|-----------|
//! | total delay change < 0 | +0.2 |
//! | total delay change > 10 | -0.3 |
//! | per conflict resolved | +0.1 |
//! | exactly one affected train | +0.1 |
//! | more than three affected trains | -0.2 |
//!
//! The result is clamped to `[0, 1]`.

use std::cmp::Ordering;

use crate::models::Recommendation;

/// Adjusted score for one recommendation.
pub fn adjusted_score(rec: &Recommendation) -> f64 {
    let mut score = rec.cost_benefit.cost_score;

    let delay_change = rec.impact.total_delay_change;
    if delay_change < 0.0 {
        score += 0.2;
    } else if delay_change > 10.0 {
        score -= 0.3;
    }

    score += f64::from(rec.cost_benefit.conflicts_resolved) * 0.1;

    match rec.impact.affected_trains.len() {
        1 => score += 0.1,
        n if n > 3 => score -= 0.2,
        _ => {}
    }

    score.clamp(0.0, 1.0)
}

/// Replaces each base score with its adjusted score.
pub fn score_recommendations(recs: &mut [Recommendation]) {
    for rec in recs.iter_mut() {
        rec.cost_benefit.cost_score = adjusted_score(rec);
    }
}

/// Sorts by score, best first, keeping generation order among ties, and
/// keeps at most `max`.
pub fn rank(mut recs: Vec<Recommendation>, max: usize) -> Vec<Recommendation> {
    recs.sort_by(|a, b| b.score().partial_cmp(&a.score()).unwrap_or(Ordering::Equal));
    recs.truncate(max);
    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActionKind;

    fn rec(train: &str, base: f64) -> Recommendation {
        Recommendation::new(ActionKind::MoveTrain, train, format!("Move {train}"))
            .with_cost_benefit(0.0, 0, base)
    }

    #[test]
    fn test_local_change_beats_wide_change() {
        let local = rec("T1", 0.6);
        let wide = rec("T2", 0.6).with_affected(vec![
            "T2".into(),
            "T3".into(),
            "T4".into(),
            "T5".into(),
        ]);

        let mut recs = vec![wide, local];
        score_recommendations(&mut recs);
        let ranked = rank(recs, 10);

        assert_eq!(ranked[0].train_id, "T1");
        assert!((ranked[0].score() - 0.7).abs() < 1e-10);
        assert!((ranked[1].score() - 0.4).abs() < 1e-10);
    }

    #[test]
    fn test_delay_adjustments() {
        let reducing = rec("T1", 0.5).with_delay_change(-5.0);
        let costly = rec("T1", 0.5).with_delay(14).with_cost_benefit(-14.0, 1, 0.6);

        // 0.5 + 0.2 + 0.1
        assert!((adjusted_score(&reducing) - 0.8).abs() < 1e-10);
        // 0.6 - 0.3 + 0.1 + 0.1
        assert!((adjusted_score(&costly) - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_clamped() {
        let great = rec("T1", 0.9).with_cost_benefit(0.0, 3, 0.9);
        assert_eq!(adjusted_score(&great), 1.0);

        let poor = rec("T1", 0.1)
            .with_delay(30)
            .with_affected(vec!["a".into(), "b".into(), "c".into(), "d".into()]);
        assert_eq!(adjusted_score(&poor), 0.0);
    }

    #[test]
    fn test_rank_is_stable_and_truncates() {
        let recs = vec![rec("A", 0.5), rec("B", 0.9), rec("C", 0.5), rec("D", 0.1)];
        let ranked = rank(recs, 3);
        let ids: Vec<_> = ranked.iter().map(|r| r.train_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A", "C"]);
    }
}
