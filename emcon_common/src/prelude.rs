//! Prelude module for common re-exports.
//!
//! ```rust
//! use emcon_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    BusConfig, ConfigError, ConfigLoader, EmconConfig, Expectations, GearConfig, LogLevel,
    SharedConfig, SiteConfig,
};

// ─── Gear Model ─────────────────────────────────────────────────────
pub use crate::gear::{
    DurationTestRecord, EmergencyMode, GearFailure, GearId, GearReading, GearSnapshot,
    SnapshotError, TestRecord, TestResult,
};

// ─── Evaluation ─────────────────────────────────────────────────────
pub use crate::report::{GearReport, SiteReport};
pub use crate::status::{Classification, StatusCategory, evaluate};
pub use crate::summary::{SiteSummary, aggregate};

// ─── Bus & Commands ─────────────────────────────────────────────────
pub use crate::bus::{BusDriver, BusError, DriverFactory};
pub use crate::command::{Address, GearCommand, Target, TargetError};
