//! # Data Retrieval Module
//!
//! This module provides the generic HTTP client the dashboard backend client
//! is built on.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: A JSON `ApiClient` built on `reqwest` and
//!   `reqwest-middleware`, with a per-request timeout and a clear split
//!   between transport failures and non-2xx answers.
//!
//! By using the components within this module, the backend client can focus
//! on endpoints and payload shapes, delegating network plumbing to this layer.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Generic JSON HTTP client for the dashboard API.
pub mod ky_http;

pub use ky_http::{ApiClient, ApiResponse, HttpError};
