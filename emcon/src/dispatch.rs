//! Control command dispatch.
//!
//! Resolves a `site[/bus[/address]]` target against the configuration and
//! sends one command on every bus it covers.

use emcon_common::bus::BusError;
use emcon_common::command::{Address, GearCommand, Target, TargetError};
use emcon_common::config::{BusConfig, EmconConfig};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::driver_registry::DriverRegistry;

/// Command dispatch failures.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error(transparent)]
    InvalidTarget(#[from] TargetError),

    #[error("site {0} not known")]
    UnknownSite(String),

    #[error("bus {bus} not known at site {site}")]
    UnknownBus { site: String, bus: String },

    #[error("bus {bus}: {source}")]
    Bus {
        bus: String,
        #[source]
        source: BusError,
    },
}

/// Sends control commands through the configured bus drivers.
pub struct Dispatcher<'a> {
    config: &'a EmconConfig,
    registry: &'a DriverRegistry,
    config_dir: &'a Path,
}

impl<'a> Dispatcher<'a> {
    pub fn new(config: &'a EmconConfig, registry: &'a DriverRegistry, config_dir: &'a Path) -> Self {
        Self {
            config,
            registry,
            config_dir,
        }
    }

    /// Buses covered by `target`, in configuration order.
    pub fn resolve(&self, target: &Target) -> Result<Vec<&'a BusConfig>, DispatchError> {
        let site = self
            .config
            .site(&target.site)
            .ok_or_else(|| DispatchError::UnknownSite(target.site.clone()))?;

        match &target.bus {
            None => Ok(site.buses.iter().collect()),
            Some(bus) => site
                .bus(bus)
                .map(|b| vec![b])
                .ok_or_else(|| DispatchError::UnknownBus {
                    site: site.id.clone(),
                    bus: bus.clone(),
                }),
        }
    }

    /// Parse `target` and send `command` to it.
    pub fn send_to(&self, command: GearCommand, target: &str) -> Result<usize, DispatchError> {
        let target: Target = target.parse()?;
        self.send(command, &target)
    }

    /// Send `command` to every bus covered by `target`.
    ///
    /// Stops at the first bus error. Returns the number of buses sent to.
    pub fn send(&self, command: GearCommand, target: &Target) -> Result<usize, DispatchError> {
        let buses = self.resolve(target)?;
        for bus in &buses {
            self.send_on_bus(command, bus, target.address)
                .map_err(|source| DispatchError::Bus {
                    bus: format!("{}/{}", target.site, bus.id),
                    source,
                })?;
        }
        Ok(buses.len())
    }

    fn send_on_bus(&self, command: GearCommand, bus: &BusConfig, address: Address) -> Result<(), BusError> {
        let mut driver = self.registry.create_driver(&bus.driver)?;
        driver.open(bus, self.config_dir)?;
        info!("Sending {} to {} on bus {}", command, address, bus.display_name());
        let sent = driver.send(command, address);
        driver.close()?;
        sent
    }
}
