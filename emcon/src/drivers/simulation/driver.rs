//! Simulation driver implementation.
//!
//! The `SimulationDriver` implements the `BusDriver` trait on top of a state
//! file. Commands are recorded and applied to the in-memory mode of the
//! addressed gear; the file itself is never written.

use super::state::SimulatedBusState;
use emcon_common::bus::{BusDriver, BusError};
use emcon_common::command::{Address, GearCommand};
use emcon_common::config::BusConfig;
use emcon_common::gear::{EmergencyMode, GearSnapshot};
use std::path::Path;
use tracing::{debug, info};

/// Simulation driver implementing the BusDriver trait.
pub struct SimulationDriver {
    /// Driver name
    name: &'static str,
    /// Bus key, once opened
    bus: Option<String>,
    /// Gear state loaded on open
    state: Option<SimulatedBusState>,
    /// Commands sent since open
    sent: Vec<(GearCommand, Address)>,
}

impl SimulationDriver {
    /// Create a new simulation driver instance.
    pub fn new() -> Self {
        Self {
            name: "simulation",
            bus: None,
            state: None,
            sent: Vec::new(),
        }
    }

    /// Open directly on in-memory state.
    pub fn with_state(bus: impl Into<String>, state: SimulatedBusState) -> Self {
        Self {
            bus: Some(bus.into()),
            state: Some(state),
            ..Self::new()
        }
    }

    /// Commands sent since the bus was opened.
    pub fn sent(&self) -> &[(GearCommand, Address)] {
        &self.sent
    }

    /// Current simulated state, if opened.
    pub fn state(&self) -> Option<&SimulatedBusState> {
        self.state.as_ref()
    }

    fn state_mut(&mut self) -> Result<&mut SimulatedBusState, BusError> {
        self.state
            .as_mut()
            .ok_or_else(|| BusError::Io("simulated bus not open".to_string()))
    }
}

impl Default for SimulationDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Mode a command leaves the gear in, if it changes the mode at all.
fn mode_after(command: GearCommand) -> Option<EmergencyMode> {
    match command {
        GearCommand::Inhibit => Some(EmergencyMode::Inhibit),
        GearCommand::Rest => Some(EmergencyMode::Rest),
        GearCommand::Reset | GearCommand::StopTest => Some(EmergencyMode::Normal),
        GearCommand::StartFunctionTest => Some(EmergencyMode::FunctionTest),
        GearCommand::StartDurationTest => Some(EmergencyMode::DurationTest),
        GearCommand::Identify
        | GearCommand::ResetFunctionTestDone
        | GearCommand::ResetDurationTestDone
        | GearCommand::ResetLampTime => None,
    }
}

impl BusDriver for SimulationDriver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn open(&mut self, config: &BusConfig, config_dir: &Path) -> Result<(), BusError> {
        let path = config.resolved_state_file(config_dir).ok_or_else(|| {
            BusError::Config(format!("bus '{}': simulation needs a state_file", config.id))
        })?;
        let state = SimulatedBusState::load(&path)?;
        info!(
            "Simulated bus '{}' opened with {} gear from {:?}",
            config.id,
            state.gear.len(),
            path
        );
        self.bus = Some(config.id.clone());
        self.state = Some(state);
        self.sent.clear();
        Ok(())
    }

    fn read_gear(&mut self, address: u8) -> Result<GearSnapshot, BusError> {
        let state = self.state_mut()?;
        match state.gear(address) {
            Some(gear) if gear.responding => gear.to_snapshot(),
            _ => Err(BusError::NoResponse(address)),
        }
    }

    fn send(&mut self, command: GearCommand, address: Address) -> Result<(), BusError> {
        let bus = self.bus.clone().unwrap_or_default();
        let state = self.state_mut()?;
        if let Some(mode) = mode_after(command) {
            let responding = state.gear.iter_mut().filter(|g| g.responding);
            match address {
                Address::Broadcast => responding.for_each(|g| g.mode = mode),
                Address::Short(a) => responding
                    .filter(|g| g.address == a)
                    .for_each(|g| g.mode = mode),
            }
        }
        info!("Simulated bus '{}': {} to {}", bus, command, address);
        self.sent.push((command, address));
        Ok(())
    }

    fn close(&mut self) -> Result<(), BusError> {
        debug!("Simulated bus {:?} closed after {} commands", self.bus, self.sent.len());
        Ok(())
    }
}
