//! Defaults and limits for the EMCON workspace.
//!
//! Single source of truth for expectation defaults and limits and for bus
//! addressing limits.

/// Highest DALI short address.
pub const MAX_SHORT_ADDRESS: u8 = 63;

/// Default rated duration in minutes.
pub const DEFAULT_RATED_DURATION_MIN: i64 = 180;

/// Default function test interval in days.
pub const DEFAULT_FUNCTION_TEST_INTERVAL_DAYS: i64 = 7;

/// Default duration test interval in weeks.
pub const DEFAULT_DURATION_TEST_INTERVAL_WEEKS: i64 = 52;

/// Default test execution timeout in days.
pub const DEFAULT_TEST_EXECUTION_TIMEOUT_DAYS: i64 = 7;

/// Longest rated duration emergency gear can report, in minutes.
pub const MAX_RATED_DURATION_MIN: i64 = 510;

/// Longest function test interval gear can be programmed with, in days.
pub const MAX_FUNCTION_TEST_INTERVAL_DAYS: i64 = 255;

/// Longest duration test interval gear can be programmed with, in weeks.
pub const MAX_DURATION_TEST_INTERVAL_WEEKS: i64 = 97;

/// Longest test execution timeout gear can be programmed with, in days.
pub const MAX_TEST_EXECUTION_TIMEOUT_DAYS: i64 = 255;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Default bus driver name.
pub const DEFAULT_DRIVER: &str = "simulation";
