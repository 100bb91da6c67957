//! Error types for u-platform.

use thiserror::Error;

use crate::config::ConfigError;
use crate::dataset::DatasetError;
use crate::validation::ValidationError;

/// Main error type for planner operations.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// A station ID does not match any known station.
    #[error("Station not found: {0}")]
    UnknownStation(String),

    /// A train ID does not match any known train.
    #[error("Train not found: {0}")]
    UnknownTrain(String),

    /// A platform number is outside the station's range.
    #[error("Platform {platform} invalid at {station_id} (only {platforms} platforms available)")]
    InvalidPlatform {
        station_id: String,
        platform: u32,
        platforms: u32,
    },

    /// An override names a station other than the train's origin.
    #[error("Train {train_id} departs from {origin}, not {station_id}")]
    StationMismatch {
        train_id: String,
        origin: String,
        station_id: String,
    },

    /// A delay amount cannot be applied.
    #[error("Invalid delay for {train_id}: {minutes} minutes")]
    InvalidDelay { train_id: String, minutes: i64 },

    /// A recommendation lacks the data needed to apply it.
    #[error("Recommendation {0} cannot be applied")]
    NotApplicable(String),

    /// Input data failed structural validation.
    #[error("Input validation failed with {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Dataset could not be loaded.
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Result type alias for planner operations.
pub type Result<T> = std::result::Result<T, PlannerError>;
