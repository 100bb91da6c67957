//! JSON timetable datasets.
//!
//! A dataset is a single JSON document:
//!
//! ```json
//! {
//!   "stations": [{ "id": "S1", "platforms": 3 }],
//!   "trains": [{
//!     "id": "T1", "type": "Express", "priority": 5,
//!     "origin": "S1", "destination": "S2",
//!     "scheduled_arrival": "2025-09-14T08:00:00",
//!     "scheduled_departure": "2025-09-14T08:10:00",
//!     "platform_pref": 1
//!   }]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Station, Train};
use crate::validation::{validate_input, ValidationResult};

/// Dataset loading error.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Stations and the trains to schedule at them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub stations: Vec<Station>,
    pub trains: Vec<Train>,
}

impl Dataset {
    /// Reads a dataset from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parses a dataset from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, DatasetError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Structural checks; see [`validate_input`].
    pub fn validate(&self) -> ValidationResult {
        validate_input(&self.trains, &self.stations)
    }
}
