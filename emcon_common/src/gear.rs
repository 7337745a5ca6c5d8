//! Gear identity and bus-reported gear state.
//!
//! A [`GearReading`] is the fixed-shape record that crosses from the bus
//! driver into the evaluator. Drivers produce it; nothing downstream ever
//! sees a partially populated snapshot.

use bitflags::bitflags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identity of one gear unit: `(site, bus, address)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GearId {
    /// Site key from configuration.
    pub site: String,
    /// Bus key within the site.
    pub bus: String,
    /// DALI short address (0..=63).
    pub address: u8,
}

impl GearId {
    pub fn new(site: impl Into<String>, bus: impl Into<String>, address: u8) -> Self {
        Self {
            site: site.into(),
            bus: bus.into(),
            address,
        }
    }
}

impl fmt::Display for GearId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.site, self.bus, self.address)
    }
}

/// Outcome of the last completed self-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TestResult {
    Pass,
    Fail,
    #[default]
    Unknown,
}

/// Last completed function test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestRecord {
    /// When the test completed.
    pub at: DateTime<Utc>,
    pub result: TestResult,
}

/// Last completed duration test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationTestRecord {
    /// When the test completed.
    pub at: DateTime<Utc>,
    pub result: TestResult,
    /// How long the lamp stayed lit, in minutes, when the gear reports it.
    pub achieved_minutes: Option<u32>,
}

/// Operating mode reported by the gear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyMode {
    #[default]
    Normal,
    Inhibit,
    Rest,
    Emergency,
    ExtendedEmergency,
    FunctionTest,
    DurationTest,
    Invalid,
}

impl EmergencyMode {
    /// True when the gear is running on battery or otherwise away from
    /// normal mains operation.
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Normal)
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Inhibit => "Inhibit",
            Self::Rest => "Rest",
            Self::Emergency => "Emergency",
            Self::ExtendedEmergency => "Extended emergency",
            Self::FunctionTest => "Function test",
            Self::DurationTest => "Duration test",
            Self::Invalid => "Invalid",
        }
    }
}

impl fmt::Display for EmergencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

bitflags! {
    /// Failure status flags reported by emergency gear.
    ///
    /// Any set flag forces the unit's classification to Fail.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GearFailure: u8 {
        /// Emergency lamp failure.
        const LAMP             = 0x01;
        /// Battery failure.
        const BATTERY          = 0x02;
        /// Battery cannot sustain the rated duration.
        const BATTERY_DURATION = 0x04;
        /// Control gear circuit failure.
        const CIRCUIT          = 0x08;
    }
}

impl Default for GearFailure {
    fn default() -> Self {
        Self::empty()
    }
}

impl GearFailure {
    /// Flags with their report wording, most fundamental first.
    const DESCRIPTIONS: [(Self, &'static str); 4] = [
        (Self::CIRCUIT, "Circuit fault reported"),
        (Self::BATTERY, "Battery fault reported"),
        (Self::BATTERY_DURATION, "Battery duration fault reported"),
        (Self::LAMP, "Emergency lamp fault reported"),
    ];

    /// Detail lines for every set flag.
    pub fn detail_lines(&self) -> Vec<String> {
        Self::DESCRIPTIONS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, text)| (*text).to_string())
            .collect()
    }
}

/// Raw facts read from one reachable gear unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GearSnapshot {
    /// Last completed function test; `None` if never tested.
    pub function_test: Option<TestRecord>,
    /// Last completed duration test; `None` if never tested.
    pub duration_test: Option<DurationTestRecord>,
    pub emergency_mode: EmergencyMode,
    pub failures: GearFailure,
    /// Battery charge in percent (0..=100).
    pub battery_charge: Option<f32>,
    /// Rated duration in minutes as reported by the gear.
    pub rated_duration: Option<u32>,
    /// Programmed function test interval, in days.
    pub function_test_interval: Option<u32>,
    /// Programmed duration test interval, in weeks.
    pub duration_test_interval: Option<u32>,
    /// Programmed test execution timeout, in days.
    pub test_execution_timeout: Option<u32>,
}

/// Inconsistent timestamp fields in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// A completed test claims to have finished after the evaluation instant.
    #[error("{field} timestamp {at} is in the future")]
    FutureTimestamp {
        field: &'static str,
        at: DateTime<Utc>,
    },
}

impl GearSnapshot {
    /// Check timestamps against the evaluation instant.
    ///
    /// Returns every inconsistency found, in field order.
    pub fn validate(&self, now: DateTime<Utc>) -> Vec<SnapshotError> {
        let mut errors = Vec::new();
        if let Some(ft) = &self.function_test
            && ft.at > now
        {
            errors.push(SnapshotError::FutureTimestamp {
                field: "Function test",
                at: ft.at,
            });
        }
        if let Some(dt) = &self.duration_test
            && dt.at > now
        {
            errors.push(SnapshotError::FutureTimestamp {
                field: "Duration test",
                at: dt.at,
            });
        }
        errors
    }
}

/// What the bus returned for one gear unit.
#[derive(Debug, Clone, PartialEq)]
pub enum GearReading {
    Reachable(GearSnapshot),
    /// The gear answered but has no emergency lighting features.
    NotEmergency,
    /// The gear did not answer. `reason` is for logs only.
    Unreachable { reason: String },
}

impl GearReading {
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self::Unreachable {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn gear_id_display() {
        let id = GearId::new("hq", "ground", 12);
        assert_eq!(id.to_string(), "hq/ground/12");
    }

    #[test]
    fn emergency_mode_active() {
        assert!(!EmergencyMode::Normal.is_active());
        assert!(EmergencyMode::Emergency.is_active());
        assert!(EmergencyMode::DurationTest.is_active());
        assert_eq!(EmergencyMode::ExtendedEmergency.to_string(), "Extended emergency");
    }

    #[test]
    fn failure_detail_lines_order() {
        let f = GearFailure::LAMP | GearFailure::CIRCUIT;
        assert_eq!(
            f.detail_lines(),
            vec![
                "Circuit fault reported".to_string(),
                "Emergency lamp fault reported".to_string()
            ]
        );
        assert!(GearFailure::empty().detail_lines().is_empty());
    }

    #[test]
    fn failure_from_name() {
        assert_eq!(GearFailure::from_name("BATTERY"), Some(GearFailure::BATTERY));
        assert_eq!(GearFailure::from_name("nope"), None);
    }

    #[test]
    fn validate_rejects_future_timestamps() {
        let snapshot = GearSnapshot {
            function_test: Some(TestRecord {
                at: now() + Duration::hours(1),
                result: TestResult::Pass,
            }),
            duration_test: Some(DurationTestRecord {
                at: now() - Duration::days(3),
                result: TestResult::Pass,
                achieved_minutes: Some(180),
            }),
            ..Default::default()
        };
        let errors = snapshot.validate(now());
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            SnapshotError::FutureTimestamp { field: "Function test", .. }
        ));
    }

    #[test]
    fn validate_accepts_timestamp_equal_to_now() {
        let snapshot = GearSnapshot {
            function_test: Some(TestRecord {
                at: now(),
                result: TestResult::Pass,
            }),
            ..Default::default()
        };
        assert!(snapshot.validate(now()).is_empty());
    }
}
