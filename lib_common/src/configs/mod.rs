//! # Configuration Modules
//!
//! Layered dashboard configuration: defaults, a JSON file, then environment
//! and command line.

/// Dashboard configuration loading and resolution.
pub mod config_sys;

pub use config_sys::{load_config, load_from, ConfigError, DashboardConfig};
