//! Station model.
//!
//! A station is immutable reference data: an identifier and the number of
//! platforms trains can be assigned to. Platforms are numbered from 1.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// A station with a fixed number of platforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    /// Unique station identifier.
    pub id: String,
    /// Number of platforms (platforms are numbered `1..=platforms`).
    pub platforms: u32,
}

impl Station {
    /// Creates a new station.
    pub fn new(id: impl Into<String>, platforms: u32) -> Self {
        Self {
            id: id.into(),
            platforms,
        }
    }

    /// Whether `platform` is a valid platform number at this station.
    #[inline]
    pub fn has_platform(&self, platform: u32) -> bool {
        platform >= 1 && platform <= self.platforms
    }

    /// All platform numbers, ascending.
    pub fn platform_numbers(&self) -> RangeInclusive<u32> {
        1..=self.platforms
    }
}
