//! # Revenue Resource
//!
//! `GET /api/revenue` returns the full series on every call; the server is the
//! source of truth, so the client never appends locally.

use serde::{Deserialize, Serialize};

/// # Revenue Point
///
/// One bucket of the revenue chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RevenuePoint {
    /// Axis label (usually a date).
    #[serde(rename = "name")]
    pub label: String,
    /// Revenue for that bucket.
    #[serde(rename = "revenue", default, deserialize_with = "crate::model::null_as_default")]
    pub amount: f64,
}

/// Body of `POST /api/revenue`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevenueSubmission {
    /// Amount earned today. Always finite and positive.
    pub amount: f64,
}
