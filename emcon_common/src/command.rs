//! Control command vocabulary and command targets.
//!
//! The bus driver owns the wire encoding; this module only names the
//! commands and parses where they go.

use crate::consts::MAX_SHORT_ADDRESS;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Emergency gear control commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GearCommand {
    /// Start or restart a ten-second identification procedure.
    Identify,
    /// Start or restart the 15 minute inhibit timer.
    Inhibit,
    /// Enter rest mode if currently in emergency mode.
    Rest,
    /// Cancel the inhibit timer; re-light if mains is absent.
    Reset,
    StartFunctionTest,
    StartDurationTest,
    /// Cancel pending tests and stop any test in progress.
    StopTest,
    /// Clear the "function test done and result valid" flag.
    ResetFunctionTestDone,
    /// Clear the "duration test done and result valid" flag.
    ResetDurationTestDone,
    /// Reset the lamp emergency time and total operation time counters.
    ResetLampTime,
}

impl GearCommand {
    pub const ALL: [Self; 10] = [
        Self::Identify,
        Self::Inhibit,
        Self::Rest,
        Self::Reset,
        Self::StartFunctionTest,
        Self::StartDurationTest,
        Self::StopTest,
        Self::ResetFunctionTestDone,
        Self::ResetDurationTestDone,
        Self::ResetLampTime,
    ];

    /// Command-line name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Identify => "identify",
            Self::Inhibit => "inhibit",
            Self::Rest => "rest",
            Self::Reset => "reset",
            Self::StartFunctionTest => "start-function-test",
            Self::StartDurationTest => "start-duration-test",
            Self::StopTest => "stop-test",
            Self::ResetFunctionTestDone => "reset-function-test-done",
            Self::ResetDurationTestDone => "reset-duration-test-done",
            Self::ResetLampTime => "reset-lamp-time",
        }
    }
}

impl fmt::Display for GearCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Destination address on one bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Address {
    /// One gear unit by short address.
    Short(u8),
    /// Every gear on the bus.
    Broadcast,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short(a) => write!(f, "short address {a}"),
            Self::Broadcast => f.write_str("broadcast"),
        }
    }
}

/// Malformed `site[/bus[/address]]` target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("A site name must be specified")]
    MissingSite,
    #[error("Too many components in target '{0}'")]
    TooManyComponents(String),
    #[error("Invalid address '{0}': expected 0..=63")]
    InvalidAddress(String),
}

/// Where a command goes: a whole site, one bus, or one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub site: String,
    pub bus: Option<String>,
    pub address: Address,
}

impl FromStr for Target {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() > 3 {
            return Err(TargetError::TooManyComponents(s.to_string()));
        }
        let site = parts[0];
        if site.is_empty() {
            return Err(TargetError::MissingSite);
        }
        let address = match parts.get(2) {
            None => Address::Broadcast,
            Some(raw) => match raw.parse::<u8>() {
                Ok(a) if a <= MAX_SHORT_ADDRESS => Address::Short(a),
                _ => return Err(TargetError::InvalidAddress((*raw).to_string())),
            },
        };
        Ok(Self {
            site: site.to_string(),
            bus: parts.get(1).map(|b| (*b).to_string()),
            address,
        })
    }
}
