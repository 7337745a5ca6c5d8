//! Simulated bus state file.
//!
//! One TOML file per bus lists the gear that answers on it. Timestamps are
//! RFC 3339 strings and must be quoted.
//!
//! ```toml
//! [[gear]]
//! address = 3
//! mode = "normal"
//! failures = ["battery"]
//! battery_charge = 97.5
//! rated_duration = 180
//! function_test_interval = 7
//! duration_test_interval = 52
//! test_execution_timeout = 7
//! function_test = { at = "2024-05-01T03:00:00Z", result = "pass" }
//! duration_test = { at = "2024-01-10T03:00:00Z", result = "fail", duration = 95 }
//!
//! [[gear]]
//! address = 4
//! responding = false
//!
//! [[gear]]
//! address = 5
//! emergency = false
//! ```

use chrono::{DateTime, Utc};
use emcon_common::bus::BusError;
use emcon_common::gear::{
    DurationTestRecord, EmergencyMode, GearFailure, GearSnapshot, TestRecord, TestResult,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

fn default_true() -> bool {
    true
}

/// Last completed test as written in the state file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulatedTest {
    pub at: DateTime<Utc>,
    #[serde(default)]
    pub result: TestResult,
    /// Minutes achieved (duration tests only).
    #[serde(default)]
    pub duration: Option<u32>,
}

/// One simulated gear unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulatedGear {
    pub address: u8,
    /// `false` makes the unit behave as if absent from the bus.
    #[serde(default = "default_true")]
    pub responding: bool,
    /// `false` makes the unit answer as ordinary control gear.
    #[serde(default = "default_true")]
    pub emergency: bool,
    #[serde(default)]
    pub mode: EmergencyMode,
    /// Failure flag names: lamp, battery, battery_duration, circuit.
    #[serde(default)]
    pub failures: Vec<String>,
    #[serde(default)]
    pub battery_charge: Option<f32>,
    #[serde(default)]
    pub rated_duration: Option<u32>,
    /// Days.
    #[serde(default)]
    pub function_test_interval: Option<u32>,
    /// Weeks.
    #[serde(default)]
    pub duration_test_interval: Option<u32>,
    /// Days.
    #[serde(default)]
    pub test_execution_timeout: Option<u32>,
    #[serde(default)]
    pub function_test: Option<SimulatedTest>,
    #[serde(default)]
    pub duration_test: Option<SimulatedTest>,
}

impl SimulatedGear {
    /// Convert to the snapshot the evaluator consumes.
    ///
    /// # Errors
    /// Returns `BusError::NotEmergency` for gear configured without
    /// emergency features, and `BusError::Protocol` for unknown failure
    /// names or an out-of-range battery charge.
    pub fn to_snapshot(&self) -> Result<GearSnapshot, BusError> {
        if !self.emergency {
            return Err(BusError::NotEmergency(self.address));
        }

        let mut failures = GearFailure::empty();
        for name in &self.failures {
            let flag = GearFailure::from_name(&name.to_uppercase()).ok_or_else(|| {
                BusError::Protocol(format!(
                    "gear {}: unknown failure flag '{name}'",
                    self.address
                ))
            })?;
            failures |= flag;
        }

        if let Some(charge) = self.battery_charge
            && !(0.0..=100.0).contains(&charge)
        {
            return Err(BusError::Protocol(format!(
                "gear {}: battery charge {charge} out of range",
                self.address
            )));
        }

        Ok(GearSnapshot {
            function_test: self.function_test.as_ref().map(|t| TestRecord {
                at: t.at,
                result: t.result,
            }),
            duration_test: self.duration_test.as_ref().map(|t| DurationTestRecord {
                at: t.at,
                result: t.result,
                achieved_minutes: t.duration,
            }),
            emergency_mode: self.mode,
            failures,
            battery_charge: self.battery_charge,
            rated_duration: self.rated_duration,
            function_test_interval: self.function_test_interval,
            duration_test_interval: self.duration_test_interval,
            test_execution_timeout: self.test_execution_timeout,
        })
    }
}

/// Contents of one bus state file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SimulatedBusState {
    #[serde(default)]
    pub gear: Vec<SimulatedGear>,
}

impl SimulatedBusState {
    /// Load a state file.
    pub fn load(path: &Path) -> Result<Self, BusError> {
        debug!("Loading simulated bus state from {:?}", path);

        let content = fs::read_to_string(path)
            .map_err(|e| BusError::Io(format!("Failed to read state file {:?}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| BusError::Config(format!("Failed to parse state file {:?}: {}", path, e)))
    }

    pub fn gear(&self, address: u8) -> Option<&SimulatedGear> {
        self.gear.iter().find(|g| g.address == address)
    }

    pub fn gear_mut(&mut self, address: u8) -> Option<&mut SimulatedGear> {
        self.gear.iter_mut().find(|g| g.address == address)
    }
}
