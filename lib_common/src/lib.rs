//! # lib_common
//!
//! Polling and command layer for the content-automation command center. It
//! keeps a locally cached view of the backend (brands, bots, content
//! pipeline, revenue and logs) fresh on a timer, and issues user commands
//! against the backend's local HTTP API.
//!
//! Presentation code depends on three things: the `Reconciler`'s
//! `watch::Receiver<ViewState>`, the `CommandDispatcher` and the
//! `AccessGate`. Everything else is wiring.

// Declare the modules to re-export
pub mod backend;
pub mod configs;
pub mod core;
pub mod loggers;
pub mod model;
pub mod retrieve;

// Re-export the types most callers need
pub use backend::{ApiError, DashboardApi, DashboardBackend, DeploymentMode, TaskId};
pub use configs::{load_config, DashboardConfig};
pub use self::core::{
    AccessError, AccessGate, CommandDispatcher, CommandKey, Dispatch, PollPlan, Poller, Reconciler,
    Refresher, Resource, ViewState,
};
pub use loggers::setup_logging;
