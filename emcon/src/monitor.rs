//! Site check runs.
//!
//! The `SiteMonitor` reads every configured gear through its bus driver,
//! evaluates it and assembles a [`SiteReport`]. All sites checked in one run
//! share the same evaluation instant.

use chrono::{DateTime, Utc};
use emcon_common::bus::{BusDriver, BusError};
use emcon_common::config::{ConfigError, Expectations, SiteConfig};
use emcon_common::gear::{GearId, GearReading};
use emcon_common::report::{GearReport, SiteReport};
use emcon_common::status::evaluate;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::driver_registry::DriverRegistry;

/// Reasons a whole site is skipped.
#[derive(Debug, Clone, Error)]
pub enum MonitorError {
    /// Expectations non-positive or out of range.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A bus names a driver that is not registered.
    #[error("site '{site}', bus '{bus}': {source}")]
    Driver {
        site: String,
        bus: String,
        #[source]
        source: BusError,
    },
}

/// Result of checking several sites.
#[derive(Debug, Default)]
pub struct CheckRun {
    /// Reports for sites that could be evaluated, in selection order.
    pub reports: Vec<SiteReport>,
    /// Sites that were skipped, with the reason.
    pub skipped: Vec<(String, MonitorError)>,
}

impl CheckRun {
    /// True when no site was skipped and every report passes.
    pub fn all_pass(&self) -> bool {
        self.skipped.is_empty() && self.reports.iter().all(SiteReport::overall_pass)
    }
}

/// Runs site checks against the configured bus drivers.
pub struct SiteMonitor<'a> {
    registry: &'a DriverRegistry,
    config_dir: PathBuf,
}

impl<'a> SiteMonitor<'a> {
    /// # Arguments
    /// * `registry` - Drivers available for opening buses
    /// * `config_dir` - Directory of the configuration file
    pub fn new(registry: &'a DriverRegistry, config_dir: impl AsRef<Path>) -> Self {
        Self {
            registry,
            config_dir: config_dir.as_ref().to_path_buf(),
        }
    }

    /// Check one site at instant `now`.
    ///
    /// # Errors
    /// Returns `MonitorError` if the site's expectations are invalid or one of
    /// its buses names an unknown driver. Unreachable gear and buses that fail
    /// to open are reported in the returned `SiteReport` instead.
    pub fn check(&self, site: &SiteConfig, now: DateTime<Utc>) -> Result<SiteReport, MonitorError> {
        info!("Checking site '{}' ({} gear)", site.id, site.gear.len());

        let site_expectations = site.expectations()?;
        let gear_expectations = site
            .gear
            .iter()
            .map(|g| site.expectations_for(g))
            .collect::<Result<Vec<Expectations>, ConfigError>>()?;

        let mut buses = self.open_buses(site)?;

        let mut gear = Vec::with_capacity(site.gear.len());
        for (config, expectations) in site.gear.iter().zip(&gear_expectations) {
            let id = GearId::new(&site.id, &config.bus, config.address);
            let reading = match buses.get_mut(config.bus.as_str()) {
                Some(Ok(driver)) => driver.reading(config.address),
                Some(Err(e)) => GearReading::unreachable(e.to_string()),
                None => GearReading::unreachable("bus not configured"),
            };
            match &reading {
                GearReading::Unreachable { reason } => warn!("{id} ({}): {reason}", config.name),
                GearReading::NotEmergency => warn!("{id} ({}): not an emergency unit", config.name),
                GearReading::Reachable(snapshot) => {
                    for e in snapshot.validate(now) {
                        warn!("{id} ({}): malformed snapshot: {e}", config.name);
                    }
                }
            }

            let classification = evaluate(&reading, expectations, now);
            debug!("{id} ({}): {}", config.name, classification.category());
            gear.push(GearReport::new(id, &config.name, classification));
        }

        for (bus, driver) in buses.iter_mut() {
            if let Ok(driver) = driver
                && let Err(e) = driver.close()
            {
                warn!("Failed to close bus '{bus}': {e}");
            }
        }

        let report = SiteReport::new(site, site_expectations, now, gear);
        info!(
            "Site '{}': {} ({} gear)",
            site.id,
            report.summary().verdict(),
            report.summary().total()
        );
        Ok(report)
    }

    /// Check several sites with one shared `now`. A skipped site never stops
    /// the others.
    pub fn check_all(&self, sites: &[&SiteConfig], now: DateTime<Utc>) -> CheckRun {
        let mut run = CheckRun::default();
        for site in sites {
            match self.check(site, now) {
                Ok(report) => run.reports.push(report),
                Err(e) => {
                    error!("Skipping site '{}': {}", site.id, e);
                    run.skipped.push((site.id.clone(), e));
                }
            }
        }
        run
    }

    /// Create and open one driver per bus. An unknown driver name is a site
    /// error; an open failure only makes that bus's gear unreachable.
    fn open_buses<'s>(
        &self,
        site: &'s SiteConfig,
    ) -> Result<HashMap<&'s str, Result<Box<dyn BusDriver>, BusError>>, MonitorError> {
        let mut buses = HashMap::new();
        for bus in &site.buses {
            let mut driver =
                self.registry
                    .create_driver(&bus.driver)
                    .map_err(|source| MonitorError::Driver {
                        site: site.id.clone(),
                        bus: bus.id.clone(),
                        source,
                    })?;
            let opened = match driver.open(bus, &self.config_dir) {
                Ok(()) => Ok(driver),
                Err(e) => {
                    warn!("Failed to open bus '{}/{}': {}", site.id, bus.id, e);
                    Err(e)
                }
            };
            buses.insert(bus.id.as_str(), opened);
        }
        Ok(buses)
    }
}
