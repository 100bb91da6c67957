//! Recommendation model.
//!
//! A recommendation is a proposed corrective action with a cost-benefit
//! estimate. Recommendations are derived per schedule and ranked by
//! `cost_benefit.cost_score`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A proposed corrective action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Unique recommendation identifier.
    pub id: String,
    /// What kind of action is proposed.
    #[serde(rename = "action_type")]
    pub action: ActionKind,
    /// Human-readable description.
    pub description: String,
    /// Train the action applies to.
    pub train_id: String,
    /// Station where the action applies.
    pub station_id: Option<String>,
    /// Target platform for platform moves.
    pub new_platform: Option<u32>,
    /// Delay to apply, in minutes.
    pub delay_minutes: Option<i64>,
    /// Estimated benefit and ranking score.
    pub cost_benefit: CostBenefit,
    /// Estimated effect on the rest of the schedule.
    pub impact: Impact,
}

/// Kind of corrective action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Move a train to another platform to reduce delay or load.
    MoveTrain,
    /// Hold a train back by some minutes.
    DelayTrain,
    /// Let a higher-priority train go first by delaying the lower one.
    SwapPriority,
    /// Move a train to another platform to clear a conflict.
    ChangePlatform,
}

/// Cost-benefit estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBenefit {
    /// Minutes of delay removed (negative when delay is added).
    pub delay_reduction: f64,
    /// Number of conflicts the action clears.
    pub conflicts_resolved: u32,
    /// Ranking score in `[0, 1]` (higher = better).
    pub cost_score: f64,
}

/// Estimated effect on the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    /// Trains whose plan changes.
    pub affected_trains: Vec<String>,
    /// Net change in total delay, in minutes (negative = improvement).
    pub total_delay_change: f64,
}

impl Recommendation {
    /// Creates a recommendation affecting only `train_id`.
    pub fn new(action: ActionKind, train_id: impl Into<String>, description: impl Into<String>) -> Self {
        let train_id = train_id.into();
        Self {
            id: Uuid::new_v4().to_string(),
            action,
            description: description.into(),
            impact: Impact {
                affected_trains: vec![train_id.clone()],
                total_delay_change: 0.0,
            },
            train_id,
            station_id: None,
            new_platform: None,
            delay_minutes: None,
            cost_benefit: CostBenefit {
                delay_reduction: 0.0,
                conflicts_resolved: 0,
                cost_score: 0.5,
            },
        }
    }

    /// Sets the station.
    pub fn at_station(mut self, station_id: impl Into<String>) -> Self {
        self.station_id = Some(station_id.into());
        self
    }

    /// Sets the target platform.
    pub fn to_platform(mut self, platform: u32) -> Self {
        self.new_platform = Some(platform);
        self
    }

    /// Sets the delay to apply; the impact records the added delay.
    pub fn with_delay(mut self, minutes: i64) -> Self {
        self.delay_minutes = Some(minutes);
        self.impact.total_delay_change = minutes as f64;
        self
    }

    /// Sets the cost-benefit estimate.
    pub fn with_cost_benefit(mut self, delay_reduction: f64, conflicts_resolved: u32, cost_score: f64) -> Self {
        self.cost_benefit = CostBenefit {
            delay_reduction,
            conflicts_resolved,
            cost_score,
        };
        self
    }

    /// Overrides the net delay change.
    pub fn with_delay_change(mut self, minutes: f64) -> Self {
        self.impact.total_delay_change = minutes;
        self
    }

    /// Replaces the affected train list.
    pub fn with_affected(mut self, trains: Vec<String>) -> Self {
        self.impact.affected_trains = trains;
        self
    }

    /// Ranking score.
    #[inline]
    pub fn score(&self) -> f64 {
        self.cost_benefit.cost_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommendation_builder() {
        let r = Recommendation::new(ActionKind::DelayTrain, "T2", "Delay T2 by 9 minutes")
            .at_station("S1")
            .with_delay(9)
            .with_cost_benefit(-9.0, 1, 0.6);

        assert_eq!(r.train_id, "T2");
        assert_eq!(r.station_id.as_deref(), Some("S1"));
        assert_eq!(r.delay_minutes, Some(9));
        assert_eq!(r.impact.affected_trains, vec!["T2".to_string()]);
        assert!((r.impact.total_delay_change - 9.0).abs() < 1e-10);
        assert!((r.score() - 0.6).abs() < 1e-10);
    }

    #[test]
    fn test_wire_names() {
        let r = Recommendation::new(ActionKind::ChangePlatform, "T1", "Move").to_platform(3);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["action_type"], "change_platform");
        assert_eq!(json["new_platform"], 3);
    }
}
