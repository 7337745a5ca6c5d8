//! # EMCON Library
//!
//! Emergency lighting control and compliance reporting on top of the
//! evaluation engine in `emcon_common`.
//!
//! # Module Structure
//!
//! - [`driver_registry`] - Bus driver factory registration
//! - [`drivers`] - Bus driver implementations
//! - [`monitor`] - Site check runs (read, evaluate, aggregate)
//! - [`dispatch`] - Control command dispatch
//! - [`render`] - Text, HTML and JSON report rendering
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                              emcon                               │
//! │  ┌─────────────┐    ┌──────────────┐    ┌─────────────────────┐  │
//! │  │   Config    │───►│ SiteMonitor  │───►│  render             │  │
//! │  │(emcon_common)│   │  evaluate +  │    │  text / html / json │  │
//! │  └─────────────┘    │  aggregate   │    └─────────────────────┘  │
//! │                     └──────┬───────┘                             │
//! │  ┌─────────────┐           │                                     │
//! │  │ Dispatcher  │───────────┤                                     │
//! │  └─────────────┘           ▼                                     │
//! │                   ┌────────────────┐    ┌─────────────────────┐  │
//! │                   │  BusDriver     │◄───│  Driver Registry    │  │
//! │                   │  trait         │    │                     │  │
//! │                   └────────────────┘    └─────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod dispatch;
pub mod driver_registry;
pub mod drivers;
pub mod monitor;
pub mod render;

// Re-export key types for convenience
pub use crate::dispatch::{DispatchError, Dispatcher};
pub use crate::driver_registry::DriverRegistry;
pub use crate::monitor::{CheckRun, MonitorError, SiteMonitor};
pub use crate::render::{HtmlReport, ReportFormat, TextReport, render};
