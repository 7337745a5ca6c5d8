//! EMCON Common Library
//!
//! Gear model, configuration loading and the status evaluation engine shared
//! by the `emcon` binary and any other consumer of emergency lighting state.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and site/bus/gear types
//! - [`gear`] - Gear identity and the snapshot read from the bus
//! - [`status`] - Per-gear status evaluation
//! - [`summary`] - Site-level aggregation
//! - [`report`] - Read-only report view consumed by renderers
//! - [`command`] - Control command vocabulary and target addressing
//! - [`bus`] - Bus driver trait and error types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust,no_run
//! use emcon_common::prelude::*;
//! use std::path::Path;
//!
//! let config = EmconConfig::load(Path::new("config.toml")).unwrap();
//! config.validate().unwrap();
//! ```

pub mod bus;
pub mod command;
pub mod config;
pub mod consts;
pub mod gear;
pub mod prelude;
pub mod report;
pub mod status;
pub mod summary;
