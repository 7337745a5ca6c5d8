//! Bus driver trait and error types.
//!
//! This module defines:
//! - `BusDriver` trait - Interface for pluggable DALI bus backends
//! - `BusError` enum - Error types for bus operations
//! - `DriverFactory` type alias - Factory function type

use crate::command::{Address, GearCommand};
use crate::config::BusConfig;
use crate::gear::{GearReading, GearSnapshot};
use std::path::Path;
use thiserror::Error;

/// Error types for bus operations.
#[derive(Debug, Clone, Error)]
pub enum BusError {
    /// The addressed gear did not answer.
    #[error("No response from gear at address {0}")]
    NoResponse(u8),

    /// Bus interface could not be opened or read.
    #[error("Bus I/O error: {0}")]
    Io(String),

    /// The gear answered with something the driver could not interpret.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The gear answered but is not emergency control gear.
    #[error("Gear at address {0} is not an emergency unit")]
    NotEmergency(u8),

    /// Driver-specific configuration is missing or invalid.
    #[error("Driver configuration error: {0}")]
    Config(String),

    /// Driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),
}

/// Factory function type for creating driver instances.
pub type DriverFactory = fn() -> Box<dyn BusDriver>;

/// Interface to one DALI bus.
///
/// # Lifecycle
///
/// 1. `open()` - Called once per run before any gear is read
/// 2. `read_gear()` / `send()` - Any number of times
/// 3. `close()` - Called when the run is finished with the bus
pub trait BusDriver: Send {
    /// Returns the driver's unique identifier (e.g., "simulation").
    fn name(&self) -> &'static str;

    /// Connect to the bus described by `config`.
    ///
    /// `config_dir` is the directory of the configuration file, for
    /// resolving relative paths.
    fn open(&mut self, config: &BusConfig, config_dir: &Path) -> Result<(), BusError>;

    /// Read the emergency state of the gear at `address`.
    ///
    /// # Errors
    /// Returns `BusError::NoResponse` if nothing answers at that address.
    fn read_gear(&mut self, address: u8) -> Result<GearSnapshot, BusError>;

    /// Send a control command.
    fn send(&mut self, command: GearCommand, address: Address) -> Result<(), BusError>;

    /// Release the bus. Default: no-op.
    fn close(&mut self) -> Result<(), BusError> {
        Ok(())
    }

    /// Read a gear unit, folding any other bus error into an unreachable
    /// reading.
    fn reading(&mut self, address: u8) -> GearReading {
        match self.read_gear(address) {
            Ok(snapshot) => GearReading::Reachable(snapshot),
            Err(BusError::NotEmergency(_)) => GearReading::NotEmergency,
            Err(e) => GearReading::unreachable(e.to_string()),
        }
    }
}
