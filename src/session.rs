//! Stateful dispatch context.
//!
//! A [`DispatchSession`] owns a timetable, its stations, the controller's
//! overrides and the active delays, together with the schedules derived
//! from them. Operations that change the inputs re-optimize and append an
//! [`OptimizationStep`] to the history. `simulate_override`,
//! `check_feasibility` and `simulate` work on copies and leave the session
//! untouched.
//!
//! # Feasibility
//!
//! | Status | Condition |
//! |--------|-----------|
//! | rejected | safety < 0.5, or more than 2 new conflicts |
//! | warning | safety < 0.7, or any new conflict |
//! | ok | otherwise |
//!
//! Impact score: `min(1, 0.2 * affected + 0.1 * |delay change|)`, where a
//! train is affected when its delay moves by more than one minute.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{OptimizerMode, PlannerConfig};
use crate::conflicts::detect_conflicts;
use crate::error::{PlannerError, Result};
use crate::models::{
    ActionKind, ActiveDelay, Conflict, DelayKind, DelaySet, Overrides, Recommendation, Schedule,
    Station, Train, MAX_DELAY_MINUTES,
};
use crate::recommend::RecommendationEngine;
use crate::scheduler::{for_mode, GreedyScheduler, ScheduleDelta, ScheduleKpi, Scheduler, TrainChange};
use crate::validation::{validate_input, validate_override};

/// Recommendations returned with a scenario simulation.
pub const SCENARIO_RECOMMENDATIONS: usize = 5;
/// Breakdown delay when the scenario gives none (min).
pub const DEFAULT_BREAKDOWN_MINUTES: i64 = 60;
/// Weather delay when the scenario gives none (min).
pub const DEFAULT_WEATHER_MINUTES: i64 = 15;
/// Trains hit by a weather scenario, in timetable order.
pub const WEATHER_AFFECTED_TRAINS: usize = 3;

const AFFECTED_DELAY_MINUTES: f64 = 1.0;

/// A controller request to pin a train to a platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRequest {
    pub train_id: String,
    pub station_id: String,
    pub new_platform: u32,
}

impl OverrideRequest {
    pub fn new(train_id: impl Into<String>, station_id: impl Into<String>, new_platform: u32) -> Self {
        Self {
            train_id: train_id.into(),
            station_id: station_id.into(),
            new_platform,
        }
    }
}

/// One entry of the optimization history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationStep {
    /// 1-based run number.
    pub step: usize,
    /// Operation that caused the run.
    pub trigger: String,
    pub mode: OptimizerMode,
    /// Whether the exact solver fell back to greedy.
    pub fell_back: bool,
    pub overrides_applied: usize,
    pub active_delays: usize,
    /// Trains whose plan differs from the previous run.
    pub changes: Vec<TrainChange>,
    pub unplaced: usize,
}

/// Outcome of an applied or simulated override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideReport {
    pub train_id: String,
    pub platform: u32,
    /// Rationale recorded for the overridden train.
    pub reason: String,
    /// Changes to every other train.
    pub delta: ScheduleDelta,
    pub schedule: Schedule,
}

impl OverrideReport {
    /// Other trains whose platform or arrival changed.
    pub fn affected_trains(&self) -> Vec<String> {
        self.delta.changed_trains()
    }
}

/// Outcome of a delay injection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayReport {
    pub train_id: String,
    pub applied_delay: i64,
    /// Other trains whose platform or arrival changed.
    pub affected_trains: Vec<String>,
    /// Added delay across the other trains (min).
    pub total_delay_impact: f64,
}

/// Verdict of a feasibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeasibilityStatus {
    Ok,
    Warning,
    Rejected,
}

/// Another platform that does no worse than the proposed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub platform: u32,
    pub conflicts: usize,
    pub safety_score: f64,
    pub description: String,
}

/// Safety and impact assessment of a proposed override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityReport {
    pub status: FeasibilityStatus,
    pub safety_score: f64,
    pub impact_score: f64,
    /// Conflicts in the simulated schedule.
    pub conflicts: Vec<Conflict>,
    pub alternatives: Vec<Alternative>,
    pub delay_impact_minutes: f64,
    pub affected_trains: Vec<String>,
    pub reasons: Vec<String>,
}

/// A what-if disruption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scenario_type", rename_all = "snake_case")]
pub enum Scenario {
    /// Delay one train.
    Delay { train_id: String, minutes: i64 },
    /// A breakdown holding one train back.
    Breakdown {
        train_id: String,
        minutes: Option<i64>,
    },
    /// Weather slowing the first trains of the timetable.
    Weather { minutes: Option<i64> },
    /// Temporarily change one train's priority.
    Priority { train_id: String, priority: i32 },
}

/// Change in conflict indicators between the current and predicted schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiDelta {
    /// Change in estimated delay risk (min).
    pub total_delay_change: f64,
    pub conflicts_change: i64,
    pub safety_score_change: f64,
    /// Trains involved in a predicted conflict.
    pub affected_trains: usize,
}

/// Predicted effect of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub scenario_id: String,
    pub scenario: Scenario,
    pub predicted_schedule: Schedule,
    pub kpi_delta: KpiDelta,
    pub conflicts_before: Vec<Conflict>,
    pub conflicts_after: Vec<Conflict>,
    pub recommendations: Vec<Recommendation>,
}

/// Owns the dispatch inputs and the schedules derived from them.
///
/// # Example
///
/// ```
/// use u_platform::models::{Station, Train};
/// use u_platform::session::{DispatchSession, OverrideRequest};
/// use chrono::NaiveDate;
///
/// let day = NaiveDate::from_ymd_opt(2025, 9, 14).unwrap();
/// let at = |h, m| day.and_hms_opt(h, m, 0).unwrap();
///
/// let mut session = DispatchSession::new(
///     vec![
///         Train::new("A", "S1", at(8, 0), at(8, 10)),
///         Train::new("B", "S1", at(8, 0), at(8, 10)),
///     ],
///     vec![Station::new("S1", 2)],
/// )
/// .unwrap();
///
/// session.optimize();
/// let report = session.apply_override(&OverrideRequest::new("A", "S1", 2)).unwrap();
/// assert_eq!(report.affected_trains(), vec!["B".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct DispatchSession {
    trains: Vec<Train>,
    stations: Vec<Station>,
    config: PlannerConfig,
    overrides: Overrides,
    delays: DelaySet,
    baseline: Option<Schedule>,
    current: Option<Schedule>,
    history: Vec<OptimizationStep>,
}

impl DispatchSession {
    /// Creates a session after validating the inputs.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::Validation`] with every problem found.
    pub fn new(trains: Vec<Train>, stations: Vec<Station>) -> Result<Self> {
        validate_input(&trains, &stations).map_err(PlannerError::Validation)?;
        Ok(Self {
            trains,
            stations,
            config: PlannerConfig::default(),
            overrides: Overrides::new(),
            delays: DelaySet::new(),
            baseline: None,
            current: None,
            history: Vec::new(),
        })
    }

    /// Replaces the planner settings; cached schedules are dropped.
    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self.baseline = None;
        self.current = None;
        self
    }

    pub fn trains(&self) -> &[Train] {
        &self.trains
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    pub fn delays(&self) -> &DelaySet {
        &self.delays
    }

    pub fn history(&self) -> &[OptimizationStep] {
        &self.history
    }

    /// Latest optimized schedule; `None` until the first run.
    pub fn schedule(&self) -> Option<&Schedule> {
        self.current.as_ref()
    }

    /// Greedy schedule without overrides or delays, computed once.
    pub fn baseline(&mut self) -> &Schedule {
        let Self {
            baseline,
            config,
            trains,
            stations,
            ..
        } = self;
        baseline.get_or_insert_with(|| {
            let schedule = GreedyScheduler::with_config(config.greedy.clone()).optimize(
                trains.as_slice(),
                stations.as_slice(),
                &Overrides::new(),
                &DelaySet::new(),
            );
            info!(
                event = "baseline_created",
                entries = schedule.entry_count(),
                unplaced = schedule.unplaced_count()
            );
            schedule
        })
    }

    /// Re-optimizes with the current overrides and delays.
    pub fn optimize(&mut self) -> &Schedule {
        let schedule = self.run(&self.trains, &self.overrides, &self.delays);
        self.commit(schedule, "optimize")
    }

    /// Pins a train to a platform and re-optimizes.
    ///
    /// # Errors
    ///
    /// Unknown station, unknown train, or a platform outside the station's
    /// range. The session is unchanged on error.
    pub fn apply_override(&mut self, req: &OverrideRequest) -> Result<OverrideReport> {
        info!(
            event = "override_requested",
            train_id = %req.train_id,
            station_id = %req.station_id,
            platform = req.new_platform
        );
        if let Err(e) = validate_override(
            &req.train_id,
            &req.station_id,
            req.new_platform,
            &self.trains,
            &self.stations,
        ) {
            warn!(event = "override_failed", train_id = %req.train_id, error = %e);
            return Err(e);
        }
        if self.current.is_none() {
            self.optimize();
        }

        let report = self.simulate_override(req)?;
        self.overrides.insert(req.train_id.clone(), req.new_platform);

        for change in &report.delta.changes {
            if change.delay_change > 0.0 {
                warn!(
                    event = "override_displaced",
                    train_id = %change.train_id,
                    old_platform = ?change.old_platform,
                    new_platform = ?change.new_platform,
                    delay_change = change.delay_change
                );
            } else {
                info!(
                    event = "override_rebalanced",
                    train_id = %change.train_id,
                    old_platform = ?change.old_platform,
                    new_platform = ?change.new_platform
                );
            }
        }

        self.commit(report.schedule.clone(), "override");
        info!(
            event = "override_applied",
            train_id = %req.train_id,
            platform = req.new_platform,
            affected = report.delta.changes.len()
        );
        Ok(report)
    }

    /// Computes what [`apply_override`](Self::apply_override) would do.
    pub fn simulate_override(&self, req: &OverrideRequest) -> Result<OverrideReport> {
        validate_override(
            &req.train_id,
            &req.station_id,
            req.new_platform,
            &self.trains,
            &self.stations,
        )?;

        let before = self.current_or_run();
        let mut overrides = self.overrides.clone();
        overrides.insert(req.train_id.clone(), req.new_platform);
        let after = self.run(&self.trains, &overrides, &self.delays);

        let delta = ScheduleDelta::between(&before, &after, &self.trains).excluding(&req.train_id);
        let reason = after
            .entry_for_train(&req.train_id)
            .map(|e| e.reason.clone())
            .unwrap_or_else(|| "re-optimized".to_string());

        Ok(OverrideReport {
            train_id: req.train_id.clone(),
            platform: req.new_platform,
            reason,
            delta,
            schedule: after,
        })
    }

    /// Assesses a proposed override without applying it.
    pub fn check_feasibility(&self, req: &OverrideRequest) -> Result<FeasibilityReport> {
        validate_override(
            &req.train_id,
            &req.station_id,
            req.new_platform,
            &self.trains,
            &self.stations,
        )?;
        let station = self.station(&req.station_id)?;

        let current = self.current_or_run();
        let mut proposed = self.overrides.clone();
        proposed.insert(req.train_id.clone(), req.new_platform);
        let simulated = self.run(&self.trains, &proposed, &self.delays);

        let (current_conflicts, _) = detect_conflicts(&self.trains, &self.stations, &current);
        let (conflicts, impact) = detect_conflicts(&self.trains, &self.stations, &simulated);
        let before = current_conflicts.len();
        let after = conflicts.len();
        let safety_score = impact.safety_score;

        let current_delays = self.delays_by_train(&current);
        let simulated_delays = self.delays_by_train(&simulated);
        let delay_change =
            simulated_delays.values().sum::<f64>() - current_delays.values().sum::<f64>();

        let affected_trains: Vec<String> = current_delays
            .keys()
            .chain(simulated_delays.keys())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter(|id| {
                let old = current_delays.get(*id).copied().unwrap_or(0.0);
                let new = simulated_delays.get(*id).copied().unwrap_or(0.0);
                (new - old).abs() > AFFECTED_DELAY_MINUTES
            })
            .map(|id| id.to_string())
            .collect();

        let mut alternatives = Vec::new();
        for platform in station.platform_numbers().filter(|&p| p != req.new_platform) {
            let mut overrides = self.overrides.clone();
            overrides.insert(req.train_id.clone(), platform);
            let schedule = self.run(&self.trains, &overrides, &self.delays);

            if schedule.unplaced_count() > simulated.unplaced_count() {
                warn!(
                    event = "alternative_rejected",
                    train_id = %req.train_id,
                    platform,
                    unplaced = schedule.unplaced_count()
                );
                continue;
            }
            let (alt_conflicts, alt_impact) = detect_conflicts(&self.trains, &self.stations, &schedule);
            if alt_conflicts.len() <= after {
                alternatives.push(Alternative {
                    platform,
                    conflicts: alt_conflicts.len(),
                    safety_score: alt_impact.safety_score,
                    description: format!(
                        "Alternative: Platform {platform} with {} conflicts",
                        alt_conflicts.len()
                    ),
                });
            }
        }

        let status = if safety_score < 0.5 || after > before + 2 {
            FeasibilityStatus::Rejected
        } else if safety_score < 0.7 || after > before {
            FeasibilityStatus::Warning
        } else {
            FeasibilityStatus::Ok
        };
        let impact_score = (affected_trains.len() as f64 * 0.2 + delay_change.abs() * 0.1).min(1.0);

        let mut reasons = Vec::new();
        if after > before {
            reasons.push(format!("Would create {} additional conflicts", after - before));
        }
        if delay_change > 10.0 {
            reasons.push(format!("Would increase total delays by {delay_change:.1} minutes"));
        }
        if safety_score < 0.7 {
            reasons.push("Safety concerns due to platform conflicts".to_string());
        }
        if affected_trains.len() > 3 {
            reasons.push(format!("Would affect {} other trains", affected_trains.len()));
        }
        if reasons.is_empty() {
            reasons.push("Override appears feasible with minimal impact".to_string());
        }

        Ok(FeasibilityReport {
            status,
            safety_score,
            impact_score,
            conflicts,
            alternatives,
            delay_impact_minutes: delay_change,
            affected_trains,
            reasons,
        })
    }

    /// Records a delay for a train and re-optimizes.
    ///
    /// # Errors
    ///
    /// Unknown train, or minutes outside `0..=MAX_DELAY_MINUTES`.
    pub fn inject_delay(&mut self, train_id: &str, delay: ActiveDelay) -> Result<DelayReport> {
        self.check_delay(train_id, delay.minutes)?;
        let before = self.current_snapshot();

        info!(
            event = "delay_injected",
            train_id,
            kind = delay.kind.label(),
            minutes = delay.minutes,
            reason = %delay.reason
        );
        let applied_delay = delay.minutes;
        self.delays.insert(train_id.to_string(), delay);

        let schedule = self.run(&self.trains, &self.overrides, &self.delays);
        let delta = ScheduleDelta::between(&before, &schedule, &self.trains).excluding(train_id);
        self.commit(schedule, "delay");

        let total_delay_impact: f64 = delta.changes.iter().map(|c| c.delay_change).sum();
        info!(
            event = "delay_optimized",
            train_id,
            affected = delta.changes.len(),
            total_delay_impact
        );

        Ok(DelayReport {
            train_id: train_id.to_string(),
            applied_delay,
            affected_trains: delta.changed_trains(),
            total_delay_impact,
        })
    }

    /// Removes every active delay and re-optimizes. Returns how many were
    /// cleared.
    pub fn clear_delays(&mut self) -> usize {
        let cleared = self.delays.len();
        self.delays.clear();
        let schedule = self.run(&self.trains, &self.overrides, &self.delays);
        self.commit(schedule, "clear_delays");
        info!(event = "delays_cleared", cleared);
        cleared
    }

    /// Turns a recommendation into an override or a delay and re-optimizes.
    ///
    /// Platform actions become overrides; delay and priority-swap actions
    /// become [`DelayKind::Recommendation`] delays.
    pub fn apply_recommendation(&mut self, rec: &Recommendation) -> Result<&Schedule> {
        let train = self
            .trains
            .iter()
            .find(|t| t.id == rec.train_id)
            .ok_or_else(|| PlannerError::UnknownTrain(rec.train_id.clone()))?;

        match rec.action {
            ActionKind::ChangePlatform | ActionKind::MoveTrain => {
                let platform = rec
                    .new_platform
                    .ok_or_else(|| PlannerError::NotApplicable(rec.id.clone()))?;
                let station_id = rec.station_id.as_deref().unwrap_or(&train.origin);
                validate_override(&rec.train_id, station_id, platform, &self.trains, &self.stations)?;
                self.overrides.insert(rec.train_id.clone(), platform);
            }
            ActionKind::DelayTrain | ActionKind::SwapPriority => {
                let minutes = rec
                    .delay_minutes
                    .ok_or_else(|| PlannerError::NotApplicable(rec.id.clone()))?;
                self.check_delay(&rec.train_id, minutes)?;
                self.delays.insert(
                    rec.train_id.clone(),
                    ActiveDelay::new(DelayKind::Recommendation, minutes)
                        .with_reason(format!("Applied recommendation: {}", rec.description)),
                );
            }
        }

        info!(
            event = "recommendation_applied",
            recommendation_id = %rec.id,
            description = %rec.description
        );
        let schedule = self.run(&self.trains, &self.overrides, &self.delays);
        Ok(self.commit(schedule, "recommendation"))
    }

    /// Predicts the effect of a scenario without changing the session.
    pub fn simulate(&self, scenario: &Scenario) -> Result<SimulationReport> {
        let mut trains = self.trains.clone();
        let mut delays = self.delays.clone();

        match scenario {
            Scenario::Delay { train_id, minutes } => {
                self.check_delay(train_id, *minutes)?;
                delays.insert(
                    train_id.clone(),
                    ActiveDelay::new(DelayKind::Custom("simulated".into()), *minutes)
                        .with_reason("Simulated delay scenario"),
                );
            }
            Scenario::Breakdown { train_id, minutes } => {
                let minutes = minutes.unwrap_or(DEFAULT_BREAKDOWN_MINUTES);
                self.check_delay(train_id, minutes)?;
                delays.insert(
                    train_id.clone(),
                    ActiveDelay::new(DelayKind::Breakdown, minutes)
                        .with_reason("Simulated train breakdown"),
                );
            }
            Scenario::Weather { minutes } => {
                let minutes = minutes.unwrap_or(DEFAULT_WEATHER_MINUTES);
                for train in self.trains.iter().take(WEATHER_AFFECTED_TRAINS) {
                    self.check_delay(&train.id, minutes)?;
                    delays.insert(
                        train.id.clone(),
                        ActiveDelay::new(DelayKind::Weather, minutes)
                            .with_reason("Simulated weather delay"),
                    );
                }
            }
            Scenario::Priority { train_id, priority } => {
                let train = trains
                    .iter_mut()
                    .find(|t| &t.id == train_id)
                    .ok_or_else(|| PlannerError::UnknownTrain(train_id.clone()))?;
                train.priority = *priority;
            }
        }

        let predicted = self.run(&trains, &self.overrides, &delays);
        let current = self.current_or_run();
        let (conflicts_before, impact_before) = detect_conflicts(&self.trains, &self.stations, &current);
        let (conflicts_after, impact_after) = detect_conflicts(&trains, &self.stations, &predicted);

        let kpi_delta = KpiDelta {
            total_delay_change: impact_after.estimated_delay_risk_minutes
                - impact_before.estimated_delay_risk_minutes,
            conflicts_change: conflicts_after.len() as i64 - conflicts_before.len() as i64,
            safety_score_change: impact_after.safety_score - impact_before.safety_score,
            affected_trains: impact_after.affected_train_count,
        };
        let recommendations = RecommendationEngine::new(&trains, &self.stations).recommend(
            &predicted,
            Some(conflicts_after.as_slice()),
            SCENARIO_RECOMMENDATIONS,
        );

        let scenario_id = Uuid::new_v4().to_string();
        info!(
            event = "scenario_simulated",
            scenario_id = %scenario_id,
            conflicts_change = kpi_delta.conflicts_change,
            recommendations = recommendations.len()
        );

        Ok(SimulationReport {
            scenario_id,
            scenario: scenario.clone(),
            predicted_schedule: predicted,
            kpi_delta,
            conflicts_before,
            conflicts_after,
            recommendations,
        })
    }

    /// Clears overrides, cached schedules and history. Active delays stay.
    pub fn reset(&mut self) {
        let cleared = self.overrides.len();
        self.overrides.clear();
        self.baseline = None;
        self.current = None;
        self.history.clear();
        info!(event = "session_reset", cleared_overrides = cleared);
    }

    /// KPIs of the current schedule, optimizing first if needed.
    pub fn kpi(&mut self) -> ScheduleKpi {
        let schedule = self.current_snapshot();
        ScheduleKpi::calculate(&schedule, &self.trains)
    }

    fn run(&self, trains: &[Train], overrides: &Overrides, delays: &DelaySet) -> Schedule {
        for_mode(&self.config).optimize(trains, &self.stations, overrides, delays)
    }

    fn current_or_run(&self) -> Schedule {
        match &self.current {
            Some(schedule) => schedule.clone(),
            None => self.run(&self.trains, &self.overrides, &self.delays),
        }
    }

    fn current_snapshot(&mut self) -> Schedule {
        if let Some(schedule) = &self.current {
            return schedule.clone();
        }
        self.optimize().clone()
    }

    fn commit(&mut self, schedule: Schedule, trigger: &str) -> &Schedule {
        let changes = match &self.current {
            Some(previous) => ScheduleDelta::between(previous, &schedule, &self.trains).changes,
            None => Vec::new(),
        };
        let step = OptimizationStep {
            step: self.history.len() + 1,
            trigger: trigger.to_string(),
            mode: self.config.mode,
            fell_back: schedule.fell_back(),
            overrides_applied: self.overrides.len(),
            active_delays: self.delays.len(),
            changes,
            unplaced: schedule.unplaced_count(),
        };
        info!(
            event = "schedule_optimized",
            trigger,
            step = step.step,
            overrides = step.overrides_applied,
            delays = step.active_delays,
            changes = step.changes.len(),
            unplaced = step.unplaced
        );
        self.history.push(step);
        self.current.insert(schedule)
    }

    fn station(&self, station_id: &str) -> Result<&Station> {
        self.stations
            .iter()
            .find(|s| s.id == station_id)
            .ok_or_else(|| PlannerError::UnknownStation(station_id.to_string()))
    }

    fn check_delay(&self, train_id: &str, minutes: i64) -> Result<()> {
        if !self.trains.iter().any(|t| t.id == train_id) {
            return Err(PlannerError::UnknownTrain(train_id.to_string()));
        }
        if !(0..=MAX_DELAY_MINUTES).contains(&minutes) {
            return Err(PlannerError::InvalidDelay {
                train_id: train_id.to_string(),
                minutes,
            });
        }
        Ok(())
    }

    /// Non-negative delay per placed train against the unshifted timetable.
    fn delays_by_train(&self, schedule: &Schedule) -> BTreeMap<String, f64> {
        let by_id: HashMap<&str, &Train> = self.trains.iter().map(|t| (t.id.as_str(), t)).collect();
        schedule
            .entries()
            .filter_map(|e| {
                let train = by_id.get(e.train_id.as_str())?;
                Some((e.train_id.clone(), train.delay_minutes(e.actual_arrival).max(0.0)))
            })
            .collect()
    }
}
