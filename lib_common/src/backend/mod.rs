//! # Dashboard Backend Module
//!
//! Everything needed to talk to the local dashboard API: the deployment switch
//! that decides whether there is an API at all, the typed endpoint client and
//! the closed set of runnable tasks.
//!
//! ## Contained Modules:
//! - **`deployment`**: `DeploymentMode`, derived once from configuration.
//! - **`apicall`**: `DashboardApi`, the HTTP client, behind the
//!   `DashboardBackend` trait.
//! - **`tasks`**: `TaskId` and the bot/brand → task lookups.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Local vs. remote deployment.
pub mod deployment;
/// The typed dashboard API client.
pub mod apicall;
/// Runnable task ids.
pub mod tasks;

// --- Public API Re-exports ---
pub use deployment::DeploymentMode;
pub use apicall::{validate_amount, ApiError, DashboardApi, DashboardBackend};
pub use tasks::TaskId;
