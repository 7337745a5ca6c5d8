//! Configuration loading traits and types.
//!
//! One TOML file describes every site, its buses and its gear, plus the test
//! expectations each site is held to. The loaded [`EmconConfig`] is passed
//! by reference to whatever needs it; nothing reads configuration from
//! process-wide state.
//!
//! # Usage
//!
//! ```rust,no_run
//! use emcon_common::config::{ConfigError, ConfigLoader, EmconConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = EmconConfig::load(Path::new("config.toml"))?;
//!     config.validate()?;
//!     for site in &config.sites {
//!         println!("Site: {}", site.name);
//!     }
//!     Ok(())
//! }
//! ```

use crate::consts::{
    DEFAULT_DRIVER, DEFAULT_DURATION_TEST_INTERVAL_WEEKS, DEFAULT_FUNCTION_TEST_INTERVAL_DAYS,
    DEFAULT_RATED_DURATION_MIN, DEFAULT_TEST_EXECUTION_TIMEOUT_DAYS,
    MAX_DURATION_TEST_INTERVAL_WEEKS, MAX_FUNCTION_TEST_INTERVAL_DAYS, MAX_RATED_DURATION_MIN,
    MAX_SHORT_ADDRESS, MAX_TEST_EXECUTION_TIMEOUT_DAYS,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Structural validation failed. Fatal for the whole file.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// Expectation parameters for one site are missing or non-positive.
    /// Only that site is skipped.
    #[error("Site '{site}' configuration invalid: {reason}")]
    ConfigurationInvalid { site: String, reason: String },
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

fn default_service_name() -> String {
    "emcon".to_string()
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "emcon-hq"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Test expectations a gear unit is held to. Immutable for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Expectations {
    /// Rated duration in minutes.
    pub rated_duration_min: u32,
    /// Function test interval in days.
    pub function_test_interval_days: u32,
    /// Duration test interval in weeks.
    pub duration_test_interval_weeks: u32,
    /// Grace period, in days, to complete a test after it becomes due.
    pub test_execution_timeout_days: u32,
}

impl Default for Expectations {
    fn default() -> Self {
        Self {
            rated_duration_min: DEFAULT_RATED_DURATION_MIN as u32,
            function_test_interval_days: DEFAULT_FUNCTION_TEST_INTERVAL_DAYS as u32,
            duration_test_interval_weeks: DEFAULT_DURATION_TEST_INTERVAL_WEEKS as u32,
            test_execution_timeout_days: DEFAULT_TEST_EXECUTION_TIMEOUT_DAYS as u32,
        }
    }
}

impl Expectations {
    pub fn function_test_interval(&self) -> Duration {
        Duration::days(i64::from(self.function_test_interval_days))
    }

    pub fn duration_test_interval(&self) -> Duration {
        Duration::weeks(i64::from(self.duration_test_interval_weeks))
    }

    pub fn test_execution_timeout(&self) -> Duration {
        Duration::days(i64::from(self.test_execution_timeout_days))
    }
}

/// Optional expectation fields as written in TOML, at site or gear level.
///
/// Values are kept signed so that a negative entry is reported as a
/// validation error instead of a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpectationSettings {
    #[serde(default)]
    pub rated_duration: Option<i64>,
    #[serde(default)]
    pub function_test_interval: Option<i64>,
    #[serde(default)]
    pub duration_test_interval: Option<i64>,
    #[serde(default)]
    pub test_execution_timeout: Option<i64>,
}

impl ExpectationSettings {
    /// Overlay these settings on `base`.
    ///
    /// # Errors
    ///
    /// Returns a description of the first non-positive or out-of-range value.
    pub fn resolve(&self, base: &Expectations) -> Result<Expectations, String> {
        fn pick(name: &str, value: Option<i64>, fallback: u32, max: i64) -> Result<u32, String> {
            match value {
                None => Ok(fallback),
                Some(v) if v <= 0 => Err(format!("{name} must be positive, got {v}")),
                Some(v) if v > max => Err(format!("{name} is out of range 1..={max}: {v}")),
                Some(v) => u32::try_from(v).map_err(|_| format!("{name} is out of range: {v}")),
            }
        }

        Ok(Expectations {
            rated_duration_min: pick(
                "rated_duration",
                self.rated_duration,
                base.rated_duration_min,
                MAX_RATED_DURATION_MIN,
            )?,
            function_test_interval_days: pick(
                "function_test_interval",
                self.function_test_interval,
                base.function_test_interval_days,
                MAX_FUNCTION_TEST_INTERVAL_DAYS,
            )?,
            duration_test_interval_weeks: pick(
                "duration_test_interval",
                self.duration_test_interval,
                base.duration_test_interval_weeks,
                MAX_DURATION_TEST_INTERVAL_WEEKS,
            )?,
            test_execution_timeout_days: pick(
                "test_execution_timeout",
                self.test_execution_timeout,
                base.test_execution_timeout_days,
                MAX_TEST_EXECUTION_TIMEOUT_DAYS,
            )?,
        })
    }
}

fn default_driver() -> String {
    DEFAULT_DRIVER.to_string()
}

/// One DALI bus at a site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Bus key, unique within the site.
    pub id: String,

    /// Display name. Defaults to `id`.
    #[serde(default)]
    pub name: Option<String>,

    /// Bus driver to use (e.g. "simulation").
    #[serde(default = "default_driver")]
    pub driver: String,

    /// State file for the simulation driver, relative to the config file.
    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

impl BusConfig {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Resolve `state_file` against the configuration directory.
    pub fn resolved_state_file(&self, config_dir: &Path) -> Option<PathBuf> {
        self.state_file.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                config_dir.join(p)
            }
        })
    }
}

/// One emergency gear unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GearConfig {
    /// Bus key this gear is attached to.
    pub bus: String,

    /// DALI short address.
    pub address: u8,

    /// Human-readable location or label.
    pub name: String,

    /// Per-gear overrides of the site expectations.
    #[serde(flatten)]
    pub expectations: ExpectationSettings,
}

/// One site: a physical location with buses and gear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site key, used on the command line.
    pub id: String,

    /// Display name used in reports.
    pub name: String,

    /// Site-wide expectations.
    #[serde(flatten)]
    pub expectations: ExpectationSettings,

    #[serde(default)]
    pub buses: Vec<BusConfig>,

    /// Gear in report order.
    #[serde(default)]
    pub gear: Vec<GearConfig>,
}

impl SiteConfig {
    pub fn bus(&self, id: &str) -> Option<&BusConfig> {
        self.buses.iter().find(|b| b.id == id)
    }

    /// Expectations that apply to the site as a whole.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigurationInvalid` for non-positive values.
    pub fn expectations(&self) -> Result<Expectations, ConfigError> {
        self.expectations
            .resolve(&Expectations::default())
            .map_err(|reason| self.invalid(reason))
    }

    /// Expectations for one gear: site values overlaid with gear overrides.
    pub fn expectations_for(&self, gear: &GearConfig) -> Result<Expectations, ConfigError> {
        let site = self.expectations()?;
        gear.expectations
            .resolve(&site)
            .map_err(|reason| self.invalid(format!("gear {}/{}: {reason}", gear.bus, gear.address)))
    }

    fn invalid(&self, reason: String) -> ConfigError {
        ConfigError::ConfigurationInvalid {
            site: self.id.clone(),
            reason,
        }
    }

    /// Structural checks. Expectation values are not checked here.
    fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: String| Err(ConfigError::ValidationError(format!("site '{}': {msg}", self.id)));

        if self.id.is_empty() || self.id.contains('/') {
            return fail("site id must be non-empty and must not contain '/'".to_string());
        }
        if self.name.is_empty() {
            return fail("name cannot be empty".to_string());
        }

        let mut bus_ids = HashSet::new();
        for bus in &self.buses {
            if bus.id.is_empty() || bus.id.contains('/') {
                return fail("bus id must be non-empty and must not contain '/'".to_string());
            }
            if !bus_ids.insert(bus.id.as_str()) {
                return fail(format!("duplicate bus '{}'", bus.id));
            }
        }

        let mut addresses = HashSet::new();
        for gear in &self.gear {
            if !bus_ids.contains(gear.bus.as_str()) {
                return fail(format!("gear '{}' refers to unknown bus '{}'", gear.name, gear.bus));
            }
            if gear.address > MAX_SHORT_ADDRESS {
                return fail(format!(
                    "gear '{}' address {} out of range 0..={MAX_SHORT_ADDRESS}",
                    gear.name, gear.address
                ));
            }
            if gear.name.is_empty() {
                return fail(format!("gear {}/{} has no name", gear.bus, gear.address));
            }
            if !addresses.insert((gear.bus.as_str(), gear.address)) {
                return fail(format!("duplicate gear {}/{}", gear.bus, gear.address));
            }
        }
        Ok(())
    }
}

/// Top-level configuration file.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "info"
///
/// [[sites]]
/// id = "hq"
/// name = "Head office"
/// function_test_interval = 7
///
/// [[sites.buses]]
/// id = "ground"
/// state_file = "state/hq-ground.toml"
///
/// [[sites.gear]]
/// bus = "ground"
/// address = 3
/// name = "Exit, main door"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmconConfig {
    #[serde(default)]
    pub shared: SharedConfig,

    /// Sites in report order.
    #[serde(default)]
    pub sites: Vec<SiteConfig>,
}

impl EmconConfig {
    /// Validate structure: ids, bus references, addresses, duplicates.
    ///
    /// Expectation values are validated per site at evaluation time so that
    /// one misconfigured site does not stop the others.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        let mut ids = HashSet::new();
        for site in &self.sites {
            if !ids.insert(site.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate site '{}'",
                    site.id
                )));
            }
            site.validate()?;
        }
        Ok(())
    }

    pub fn site(&self, id: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|s| s.id == id)
    }

    /// Sites named in `only`, in the order given; every site if `only` is empty.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` naming the first unknown site.
    pub fn select_sites(&self, only: &[String]) -> Result<Vec<&SiteConfig>, ConfigError> {
        if only.is_empty() {
            return Ok(self.sites.iter().collect());
        }
        only.iter()
            .map(|id| {
                self.site(id)
                    .ok_or_else(|| ConfigError::ValidationError(format!("Unrecognised site '{id}'")))
            })
            .collect()
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[shared]
log_level = "debug"

[[sites]]
id = "hq"
name = "Head office"
function_test_interval = 14

[[sites.buses]]
id = "ground"
state_file = "state/ground.toml"

[[sites.buses]]
id = "first"
name = "First floor"

[[sites.gear]]
bus = "ground"
address = 3
name = "Exit, main door"

[[sites.gear]]
bus = "first"
address = 0
name = "Stairwell"
rated_duration = 60
"#;

    fn sample() -> EmconConfig {
        EmconConfig::from_toml(SAMPLE).unwrap()
    }

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_log_level_deserialization() {
        #[derive(Debug, Deserialize)]
        struct TestWrapper {
            level: LogLevel,
        }

        for (text, level) in [
            ("trace", LogLevel::Trace),
            ("debug", LogLevel::Debug),
            ("info", LogLevel::Info),
            ("warn", LogLevel::Warn),
            ("error", LogLevel::Error),
        ] {
            let parsed: TestWrapper = toml::from_str(&format!("level = \"{text}\"")).unwrap();
            assert_eq!(parsed.level, level);
        }
    }

    #[test]
    fn test_log_level_into_tracing() {
        assert_eq!(tracing::Level::from(LogLevel::Warn), tracing::Level::WARN);
    }

    #[test]
    fn test_shared_config_validation_empty_service_name() {
        let config = SharedConfig {
            log_level: LogLevel::Info,
            service_name: "".to_string(),
        };
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_sample_parses_and_validates() {
        let config = sample();
        assert!(config.validate().is_ok());
        assert_eq!(config.shared.log_level, LogLevel::Debug);
        assert_eq!(config.shared.service_name, "emcon");
        assert_eq!(config.sites.len(), 1);

        let site = &config.sites[0];
        assert_eq!(site.gear.len(), 2);
        assert_eq!(site.gear[0].name, "Exit, main door");
        assert_eq!(site.bus("ground").unwrap().driver, "simulation");
        assert_eq!(site.bus("ground").unwrap().display_name(), "ground");
        assert_eq!(site.bus("first").unwrap().display_name(), "First floor");
    }

    #[test]
    fn test_site_expectations_overlay_defaults() {
        let config = sample();
        let site = &config.sites[0];
        let e = site.expectations().unwrap();
        assert_eq!(e.function_test_interval_days, 14);
        assert_eq!(e.rated_duration_min, 180);
        assert_eq!(e.duration_test_interval_weeks, 52);
        assert_eq!(e.test_execution_timeout_days, 7);
        assert_eq!(e.function_test_interval(), Duration::days(14));
        assert_eq!(e.duration_test_interval(), Duration::weeks(52));
    }

    #[test]
    fn test_gear_overrides_site_expectations() {
        let config = sample();
        let site = &config.sites[0];
        let e = site.expectations_for(&site.gear[1]).unwrap();
        assert_eq!(e.rated_duration_min, 60);
        assert_eq!(e.function_test_interval_days, 14);

        let e = site.expectations_for(&site.gear[0]).unwrap();
        assert_eq!(e.rated_duration_min, 180);
    }

    #[test]
    fn test_non_positive_expectation_is_site_error() {
        let mut config = sample();
        config.sites[0].expectations.test_execution_timeout = Some(0);
        // Structure is still fine.
        assert!(config.validate().is_ok());

        let err = config.sites[0].expectations().unwrap_err();
        match err {
            ConfigError::ConfigurationInvalid { site, reason } => {
                assert_eq!(site, "hq");
                assert!(reason.contains("test_execution_timeout"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_negative_gear_override_is_site_error() {
        let mut config = sample();
        config.sites[0].gear[0].expectations.function_test_interval = Some(-3);
        let site = &config.sites[0];
        assert!(matches!(
            site.expectations_for(&site.gear[0]),
            Err(ConfigError::ConfigurationInvalid { .. })
        ));
    }

    #[test]
    fn test_oversized_interval_is_site_error() {
        let mut config = sample();
        config.sites[0].expectations.duration_test_interval = Some(20_000_000);
        assert!(config.validate().is_ok());

        let err = config.sites[0].expectations().unwrap_err();
        match err {
            ConfigError::ConfigurationInvalid { reason, .. } => {
                assert_eq!(reason, "duration_test_interval is out of range 1..=97: 20000000");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        config.sites[0].expectations.duration_test_interval = Some(97);
        assert_eq!(config.sites[0].expectations().unwrap().duration_test_interval_weeks, 97);
    }

    #[test]
    fn test_unknown_bus_rejected() {
        let mut config = sample();
        config.sites[0].gear[0].bus = "basement".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unknown bus 'basement'"));
    }

    #[test]
    fn test_address_out_of_range_rejected() {
        let mut config = sample();
        config.sites[0].gear[0].address = 64;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_duplicate_gear_rejected() {
        let mut config = sample();
        config.sites[0].gear[1].bus = "ground".to_string();
        config.sites[0].gear[1].address = 3;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate gear ground/3"));
    }

    #[test]
    fn test_duplicate_site_rejected() {
        let mut config = sample();
        config.sites.push(config.sites[0].clone());
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_select_sites() {
        let config = sample();
        assert_eq!(config.select_sites(&[]).unwrap().len(), 1);
        assert_eq!(config.select_sites(&["hq".to_string()]).unwrap()[0].id, "hq");
        let err = config.select_sites(&["nowhere".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Unrecognised site 'nowhere'"));
    }

    #[test]
    fn test_resolved_state_file() {
        let config = sample();
        let bus = config.sites[0].bus("ground").unwrap();
        assert_eq!(
            bus.resolved_state_file(Path::new("/etc/emcon")),
            Some(PathBuf::from("/etc/emcon/state/ground.toml"))
        );
        assert_eq!(config.sites[0].bus("first").unwrap().resolved_state_file(Path::new("/x")), None);
    }

    #[test]
    fn test_config_loader_file_not_found() {
        let result = EmconConfig::load(Path::new("/nonexistent/path/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn test_config_loader_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid toml {{{{").unwrap();

        let result = EmconConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_config_loader_success() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{SAMPLE}").unwrap();
        file.flush().unwrap();

        let config = EmconConfig::load(file.path()).unwrap();
        assert_eq!(config.sites[0].id, "hq");
    }
}
