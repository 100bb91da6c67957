//! Input validation for platform scheduling problems.
//!
//! Checks structural integrity of trains and stations before scheduling,
//! and rejects controller overrides before they reach a scheduler.
//! [`validate_input`] detects:
//! - Duplicate train or station IDs
//! - Stations without platforms
//! - Trains whose origin station is unknown
//! - Preferred platforms outside the station's range
//! - Non-positive dwell (departure not after arrival)

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::error::{PlannerError, Result};
use crate::models::{Station, Train};

/// Validation result.
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A station has zero platforms.
    NoPlatforms,
    /// A train references a station that doesn't exist.
    UnknownStation,
    /// A preferred platform is outside the station's range.
    InvalidPreferredPlatform,
    /// A train departs at or before its arrival.
    NonPositiveDwell,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the trains and stations of a scheduling problem.
///
/// Checks:
/// 1. No duplicate station IDs
/// 2. Every station has at least one platform
/// 3. No duplicate train IDs
/// 4. Every train's origin station exists
/// 5. Preferred platforms are within the origin station's range
/// 6. Every train departs after it arrives
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(trains: &[Train], stations: &[Station]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut by_id: HashMap<&str, &Station> = HashMap::new();
    for s in stations {
        if by_id.insert(s.id.as_str(), s).is_some() {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate station ID: {}", s.id),
            ));
        }
        if s.platforms == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NoPlatforms,
                format!("Station '{}' has no platforms", s.id),
            ));
        }
    }

    let mut train_ids = HashSet::new();
    for t in trains {
        if !train_ids.insert(t.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate train ID: {}", t.id),
            ));
        }

        if t.scheduled_departure <= t.scheduled_arrival {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonPositiveDwell,
                format!("Train '{}' departs at or before its arrival", t.id),
            ));
        }

        match by_id.get(t.origin.as_str()) {
            None => errors.push(ValidationError::new(
                ValidationErrorKind::UnknownStation,
                format!("Train '{}' references unknown station '{}'", t.id, t.origin),
            )),
            Some(station) => {
                if let Some(pref) = t.platform_pref {
                    if !station.has_platform(pref) {
                        errors.push(ValidationError::new(
                            ValidationErrorKind::InvalidPreferredPlatform,
                            format!(
                                "Train '{}' prefers platform {} but '{}' has {}",
                                t.id, pref, station.id, station.platforms
                            ),
                        ));
                    }
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks that a controller override can be handed to a scheduler.
///
/// The train and station must exist, the station must be the train's
/// origin and the platform must lie in `[1, station.platforms]`.
pub fn validate_override(
    train_id: &str,
    station_id: &str,
    platform: u32,
    trains: &[Train],
    stations: &[Station],
) -> Result<()> {
    let station = stations
        .iter()
        .find(|s| s.id == station_id)
        .ok_or_else(|| PlannerError::UnknownStation(station_id.to_string()))?;

    if !station.has_platform(platform) {
        return Err(PlannerError::InvalidPlatform {
            station_id: station.id.clone(),
            platform,
            platforms: station.platforms,
        });
    }

    let train = trains
        .iter()
        .find(|t| t.id == train_id)
        .ok_or_else(|| PlannerError::UnknownTrain(train_id.to_string()))?;

    if train.origin != station.id {
        return Err(PlannerError::StationMismatch {
            train_id: train.id.clone(),
            origin: train.origin.clone(),
            station_id: station.id.clone(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::train::fixtures::at;

    fn sample_stations() -> Vec<Station> {
        vec![Station::new("S1", 3), Station::new("S2", 1)]
    }

    fn sample_trains() -> Vec<Train> {
        vec![
            Train::new("T1", "S1", at(8, 0), at(8, 10)).with_preferred_platform(2),
            Train::new("T2", "S2", at(8, 5), at(8, 15)),
        ]
    }

    #[test]
    fn test_valid_input() {
        assert!(validate_input(&sample_trains(), &sample_stations()).is_ok());
    }

    #[test]
    fn test_duplicate_train_id() {
        let mut trains = sample_trains();
        trains.push(Train::new("T1", "S1", at(9, 0), at(9, 10)));

        let errors = validate_input(&trains, &sample_stations()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("train")));
    }

    #[test]
    fn test_duplicate_station_id() {
        let stations = vec![Station::new("S1", 2), Station::new("S1", 4), Station::new("S2", 1)];

        let errors = validate_input(&sample_trains(), &stations).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("station")));
    }

    #[test]
    fn test_error_display_is_message() {
        let trains = vec![Train::new("T1", "NOWHERE", at(8, 0), at(8, 10))];
        let errors = validate_input(&trains, &sample_stations()).unwrap_err();
        assert_eq!(
            errors[0].to_string(),
            "Train 'T1' references unknown station 'NOWHERE'"
        );
    }

    #[test]
    fn test_station_without_platforms() {
        let stations = vec![Station::new("S1", 3), Station::new("S2", 0)];
        let errors = validate_input(&[], &stations).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::NoPlatforms);
    }

    #[test]
    fn test_unknown_station() {
        let trains = vec![Train::new("T1", "NOWHERE", at(8, 0), at(8, 10))];
        let errors = validate_input(&trains, &sample_stations()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::UnknownStation));
    }

    #[test]
    fn test_invalid_preferred_platform() {
        let trains = vec![Train::new("T1", "S2", at(8, 0), at(8, 10)).with_preferred_platform(2)];
        let errors = validate_input(&trains, &sample_stations()).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::InvalidPreferredPlatform);
    }

    #[test]
    fn test_non_positive_dwell() {
        let trains = vec![Train::new("T1", "S1", at(8, 10), at(8, 10))];
        let errors = validate_input(&trains, &sample_stations()).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::NonPositiveDwell);
    }

    #[test]
    fn test_multiple_errors() {
        let trains = vec![
            Train::new("T1", "NOWHERE", at(8, 0), at(8, 10)),
            Train::new("T2", "S1", at(9, 0), at(8, 0)),
        ];
        let errors = validate_input(&trains, &[]).unwrap_err();
        assert!(errors.len() >= 3);
    }

    #[test]
    fn test_validate_override() {
        let trains = sample_trains();
        let stations = sample_stations();

        assert!(validate_override("T1", "S1", 3, &trains, &stations).is_ok());
        assert!(matches!(
            validate_override("T1", "S1", 4, &trains, &stations),
            Err(PlannerError::InvalidPlatform { platform: 4, platforms: 3, .. })
        ));
        assert!(matches!(
            validate_override("T1", "S1", 0, &trains, &stations),
            Err(PlannerError::InvalidPlatform { .. })
        ));
        assert!(matches!(
            validate_override("T1", "XX", 1, &trains, &stations),
            Err(PlannerError::UnknownStation(_))
        ));
        assert!(matches!(
            validate_override("T9", "S1", 1, &trains, &stations),
            Err(PlannerError::UnknownTrain(_))
        ));
    }

    #[test]
    fn test_override_must_target_origin_station() {
        let trains = vec![Train::new("A", "S1", at(8, 0), at(8, 10))];
        let stations = vec![Station::new("S1", 1), Station::new("S2", 3)];

        let err = validate_override("A", "S2", 3, &trains, &stations).unwrap_err();
        assert!(matches!(
            &err,
            PlannerError::StationMismatch { train_id, origin, station_id }
                if train_id == "A" && origin == "S1" && station_id == "S2"
        ));
        assert_eq!(err.to_string(), "Train A departs from S1, not S2");
        assert!(validate_override("A", "S1", 1, &trains, &stations).is_ok());
    }
}
