//! # Core Engine Module
//!
//! The moving parts of the dashboard: the state it renders, the timer that
//! keeps that state fresh, and the commands a user can fire at the backend.
//!
//! ## Core Components:
//!
//! - **`reconciler`**: owns the `ViewState` and merges each fetched resource
//!   into it. Presentation code subscribes to a `watch` channel.
//!
//! - **`poller`**: the repeating fetch timer with a deterministic teardown.
//!   Results that arrive after `stop()` are discarded.
//!
//! - **`dispatcher`**: fire-and-forget user commands with a keyed in-flight
//!   set, so each control can show a busy state.
//!
//! - **`access_gate`**: the session PIN check for remote viewers.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// The single owner of the dashboard view-state.
pub mod reconciler;
/// The fixed-period resource poller.
pub mod poller;
/// Fire-and-forget user commands with in-flight tracking.
pub mod dispatcher;
/// The session PIN gate.
pub mod access_gate;

// --- Public API Re-exports ---
pub use reconciler::{BrandCard, Reconciler, ViewState};
pub use poller::{PollPlan, Poller, Refresher, Resource};
pub use dispatcher::{Command, CommandDispatcher, CommandKey, CommandKind, Dispatch};
pub use access_gate::{AccessError, AccessGate};
