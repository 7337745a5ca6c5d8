//! Simulation driver module.
//!
//! Serves gear state from a TOML file instead of a physical bus.

mod driver;
mod state;

pub use driver::SimulationDriver;
pub use state::{SimulatedBusState, SimulatedGear, SimulatedTest};

use emcon_common::bus::BusDriver;

/// Factory function to create a simulation driver instance.
pub fn create_driver() -> Box<dyn BusDriver> {
    Box::new(SimulationDriver::new())
}
