//! # Dashboard Data Model
//!
//! Strongly-typed mirrors of the JSON documents served by the local dashboard
//! API. Every struct here is tolerant on the way in: missing fields fall back
//! to empty or zero values so a partially populated response still produces a
//! usable snapshot instead of a parse failure.
//!
//! ## Contained Modules:
//! - **`status`**: brands, bots and the coarse system status line.
//! - **`pipeline`**: per-brand content queue counts and progress.
//! - **`revenue`**: the revenue time series.
//! - **`logs`**: the backend log feed, classified once at ingestion.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Brands, bots and the system status line.
pub mod status;
/// Per-brand content-generation queues.
pub mod pipeline;
/// The revenue time series.
pub mod revenue;
/// Structured entries of the backend log feed.
pub mod logs;

// --- Public API Re-exports ---
pub use status::{Bot, BotStatus, Brand, BrandStatus, StatusSnapshot, SystemStatus};
pub use pipeline::{Pipeline, PipelineEntry};
pub use revenue::{RevenuePoint, RevenueSubmission};
pub use logs::{LogEntry, LogLevel, LogsResponse};

use serde::{Deserialize, Deserializer};

/// Reads an explicit JSON `null` the same way as an absent key.
///
/// Pair with `#[serde(default)]`; `default` alone only covers missing keys.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
