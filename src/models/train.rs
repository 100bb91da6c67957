//! Train model.
//!
//! A train is the unit being scheduled. Only its origin-station platform
//! assignment is planned; the destination is carried as metadata.
//!
//! # Time Representation
//! Times are `chrono::NaiveDateTime` wall-clock values within a single
//! operating day. Dwell (departure - arrival) is preserved by every scheduler.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::MAX_DELAY_MINUTES;

/// A train to be assigned to a platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Train {
    /// Unique train identifier.
    pub id: String,
    /// Service category (e.g. "Express", "Local", "Freight").
    #[serde(rename = "type")]
    pub train_type: String,
    /// Scheduling priority (higher = more important).
    pub priority: i32,
    /// Station where the platform is assigned.
    pub origin: String,
    /// Destination station (metadata only).
    pub destination: String,
    /// Timetabled arrival at the origin station.
    pub scheduled_arrival: NaiveDateTime,
    /// Timetabled departure from the origin station.
    pub scheduled_departure: NaiveDateTime,
    /// Platform requested by the timetable, if any.
    #[serde(default)]
    pub platform_pref: Option<u32>,
}

impl Train {
    /// Creates a train with the given origin and timetable window.
    pub fn new(
        id: impl Into<String>,
        origin: impl Into<String>,
        scheduled_arrival: NaiveDateTime,
        scheduled_departure: NaiveDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            train_type: String::new(),
            priority: 0,
            origin: origin.into(),
            destination: String::new(),
            scheduled_arrival,
            scheduled_departure,
            platform_pref: None,
        }
    }

    /// Sets the service category.
    pub fn with_type(mut self, train_type: impl Into<String>) -> Self {
        self.train_type = train_type.into();
        self
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the destination station.
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    /// Sets the preferred platform.
    pub fn with_preferred_platform(mut self, platform: u32) -> Self {
        self.platform_pref = Some(platform);
        self
    }

    /// Scheduled dwell time at the origin station.
    #[inline]
    pub fn dwell(&self) -> Duration {
        self.scheduled_departure - self.scheduled_arrival
    }

    /// Returns a copy with arrival and departure shifted by `minutes`.
    ///
    /// The shift is clamped to [`MAX_DELAY_MINUTES`] in either direction.
    pub fn shifted(&self, minutes: i64) -> Self {
        let shift = Duration::minutes(minutes.clamp(-MAX_DELAY_MINUTES, MAX_DELAY_MINUTES));
        Self {
            scheduled_arrival: self.scheduled_arrival + shift,
            scheduled_departure: self.scheduled_departure + shift,
            ..self.clone()
        }
    }

    /// Minutes between the scheduled arrival and `actual_arrival`.
    ///
    /// Negative when `actual_arrival` is early.
    pub fn delay_minutes(&self, actual_arrival: NaiveDateTime) -> f64 {
        minutes_between(self.scheduled_arrival, actual_arrival)
    }
}

/// Signed minutes from `from` to `to`, with sub-minute precision.
pub fn minutes_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_seconds() as f64 / 60.0
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, NaiveDateTime};

    /// 2025-09-14 at `h:m`.
    pub fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 14)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .expect("valid fixture time")
    }

    /// 2025-09-14 at `h:m:s`.
    pub fn at_s(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 14)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .expect("valid fixture time")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::at;
    use super::*;

    #[test]
    fn test_train_builder() {
        let t = Train::new("12951", "NDLS", at(8, 0), at(8, 10))
            .with_type("Rajdhani")
            .with_priority(5)
            .with_destination("BCT")
            .with_preferred_platform(2);

        assert_eq!(t.id, "12951");
        assert_eq!(t.train_type, "Rajdhani");
        assert_eq!(t.priority, 5);
        assert_eq!(t.destination, "BCT");
        assert_eq!(t.platform_pref, Some(2));
        assert_eq!(t.dwell(), Duration::minutes(10));
    }

    #[test]
    fn test_shifted_preserves_dwell_and_original() {
        let t = Train::new("T1", "S1", at(8, 0), at(8, 12));
        let late = t.shifted(15);

        assert_eq!(late.scheduled_arrival, at(8, 15));
        assert_eq!(late.scheduled_departure, at(8, 27));
        assert_eq!(late.dwell(), t.dwell());
        // original untouched
        assert_eq!(t.scheduled_arrival, at(8, 0));
    }

    #[test]
    fn test_shifted_clamps_to_one_day() {
        let t = Train::new("T1", "S1", at(8, 0), at(8, 12));
        let late = t.shifted(1_000_000_000_000);

        assert_eq!(late.scheduled_arrival, at(8, 0) + Duration::minutes(MAX_DELAY_MINUTES));
        assert_eq!(late.dwell(), t.dwell());
    }

    #[test]
    fn test_delay_minutes() {
        let t = Train::new("T1", "S1", at(8, 0), at(8, 10));
        assert!((t.delay_minutes(at(8, 7)) - 7.0).abs() < 1e-10);
        assert!((t.delay_minutes(at(7, 58)) + 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_serde_uses_type_field() {
        let json = r#"{
            "id": "T9",
            "type": "Express",
            "priority": 3,
            "origin": "S1",
            "destination": "S2",
            "scheduled_arrival": "2025-09-14T08:00:00",
            "scheduled_departure": "2025-09-14T08:05:00"
        }"#;
        let t: Train = serde_json::from_str(json).unwrap();
        assert_eq!(t.train_type, "Express");
        assert_eq!(t.platform_pref, None);
        assert_eq!(t.dwell(), Duration::minutes(5));
    }
}
