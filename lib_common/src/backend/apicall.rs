//! # Dashboard API Client
//!
//! The remote resource client: one method per endpoint of the local dashboard
//! API, each returning a typed result or an `ApiError`. Nothing in here panics
//! or retries; a failed read is simply retried by the next poll tick.
//!
//! ## Core Features:
//! - **Deployment Aware**: built with a `DeploymentMode`. In `Remote` mode no
//!   HTTP client exists at all and every call returns
//!   `ApiError::Configuration` without touching the network.
//! - **Error Taxonomy**: transport failures and non-2xx answers become
//!   `Network`, malformed 2xx bodies become `Parse`.
//! - **Fire-and-Forget Commands**: `trigger_*` calls log their own failures so
//!   callers are free to ignore the outcome.
//! - **Trait Seam**: `DashboardBackend` abstracts the client so the poller and
//!   the command dispatcher can run against an in-memory fake.

use crate::backend::deployment::DeploymentMode;
use crate::backend::tasks::TaskId;
use crate::model::{LogEntry, LogsResponse, Pipeline, RevenuePoint, RevenueSubmission, StatusSnapshot};
use crate::retrieve::ky_http::{ApiClient, HttpError};
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// # API Error
///
/// Every way a dashboard API call can fail. All of them are recovered at the
/// call site; none is fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The request failed in transit or the server answered non-2xx.
    #[error("network error on {endpoint}: {message}")]
    Network {
        /// Path of the endpoint that failed.
        endpoint: String,
        /// Human-readable cause.
        message: String,
    },

    /// A 2xx body did not have the expected shape.
    #[error("unexpected response from {endpoint}: {message}")]
    Parse {
        /// Path of the endpoint that failed.
        endpoint: String,
        /// Deserializer message.
        message: String,
    },

    /// No backend is configured for this deployment.
    #[error("no dashboard API configured for this deployment")]
    Configuration,

    /// A revenue amount that is not a finite positive number.
    #[error("revenue amount must be a positive number, got {0}")]
    InvalidAmount(f64),
}

impl ApiError {
    /// True when the failure means the backend is unreachable or broken, as
    /// opposed to deliberately absent. Only these flip the status to Offline.
    pub fn signals_offline(&self) -> bool {
        matches!(self, ApiError::Network { .. } | ApiError::Parse { .. })
    }

    fn from_http(endpoint: &str, err: HttpError) -> Self {
        match err {
            HttpError::Decode(e) => ApiError::Parse {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            },
            other => ApiError::Network {
                endpoint: endpoint.to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Rejects amounts that are not finite and strictly positive.
pub fn validate_amount(amount: f64) -> Result<f64, ApiError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(ApiError::InvalidAmount(amount))
    }
}

/// # Dashboard Backend
///
/// The operations the poller and the command dispatcher need from the API.
#[async_trait]
pub trait DashboardBackend: Send + Sync {
    /// `GET /api/status`.
    async fn fetch_status(&self) -> Result<StatusSnapshot, ApiError>;
    /// `GET /api/revenue`.
    async fn fetch_revenue(&self) -> Result<Vec<RevenuePoint>, ApiError>;
    /// `GET /api/logs`.
    async fn fetch_logs(&self) -> Result<Vec<LogEntry>, ApiError>;
    /// `GET /api/content-pipeline`.
    async fn fetch_pipeline(&self) -> Result<Pipeline, ApiError>;
    /// `POST /api/revenue`.
    async fn submit_revenue(&self, amount: f64) -> Result<(), ApiError>;
    /// `POST /api/sync/{brandKey}`.
    async fn trigger_sync(&self, brand_key: &str) -> Result<(), ApiError>;
    /// `POST /api/run/{taskId}`.
    async fn trigger_run(&self, task: TaskId) -> Result<(), ApiError>;
    /// `POST /api/kill`.
    async fn trigger_kill_all(&self) -> Result<(), ApiError>;
}

/// # Dashboard API
///
/// HTTP implementation of `DashboardBackend`.
#[derive(Clone)]
pub struct DashboardApi {
    /// `None` in remote deployments.
    client: Option<ApiClient>,
}

impl DashboardApi {
    /// Builds the client for `mode`.
    ///
    /// In `Remote` mode `base_url` is ignored and no HTTP client is created.
    ///
    /// # Errors
    /// Returns `HttpError` if `base_url` is invalid in `Local` mode.
    pub fn new(mode: DeploymentMode, base_url: &str, timeout: Duration) -> Result<Self, HttpError> {
        let client = match mode {
            DeploymentMode::Local => Some(ApiClient::new(base_url, timeout)?),
            DeploymentMode::Remote => None,
        };
        Ok(Self { client })
    }

    /// A client with no backend; every call short-circuits.
    pub fn unconfigured() -> Self {
        Self { client: None }
    }

    /// Whether a backend is configured.
    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    fn client(&self, endpoint: &str) -> Result<&ApiClient, ApiError> {
        self.client.as_ref().ok_or_else(|| {
            log::debug!("Skipping {endpoint}: no backend configured");
            ApiError::Configuration
        })
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let endpoint = segments.join("/");
        let client = self.client(&endpoint)?;

        let response = client
            .request::<T, ()>(Method::GET, segments, None)
            .await
            .map_err(|e| ApiError::from_http(&endpoint, e))?;

        match response.data {
            Some(data) if response.success => Ok(data),
            _ => Err(ApiError::Network {
                endpoint,
                message: format!("HTTP status {}", response.status),
            }),
        }
    }

    async fn post<B: Serialize + ?Sized>(&self, segments: &[&str], body: Option<&B>) -> Result<(), ApiError> {
        let endpoint = segments.join("/");
        let client = self.client(&endpoint)?;

        let response = client
            .request_ack(Method::POST, segments, body)
            .await
            .map_err(|e| ApiError::from_http(&endpoint, e))?;

        if response.success {
            Ok(())
        } else {
            Err(ApiError::Network {
                endpoint,
                message: format!(
                    "HTTP status {}: {}",
                    response.status,
                    response.error_body.unwrap_or_default().trim()
                ),
            })
        }
    }

    /// Runs a fire-and-forget command. Callers decide how loudly to report it.
    async fn command(&self, what: &str, segments: &[&str]) -> Result<(), ApiError> {
        let outcome = self.post::<()>(segments, None).await;
        if let Err(e) = &outcome {
            log::debug!("{what} returned {e}");
        }
        outcome
    }
}

#[async_trait]
impl DashboardBackend for DashboardApi {
    async fn fetch_status(&self) -> Result<StatusSnapshot, ApiError> {
        self.get(&["api", "status"]).await
    }

    async fn fetch_revenue(&self) -> Result<Vec<RevenuePoint>, ApiError> {
        self.get(&["api", "revenue"]).await
    }

    async fn fetch_logs(&self) -> Result<Vec<LogEntry>, ApiError> {
        let body: LogsResponse = self.get(&["api", "logs"]).await?;
        Ok(body.logs)
    }

    async fn fetch_pipeline(&self) -> Result<Pipeline, ApiError> {
        self.get(&["api", "content-pipeline"]).await
    }

    async fn submit_revenue(&self, amount: f64) -> Result<(), ApiError> {
        let amount = validate_amount(amount)?;
        let outcome = self
            .post(&["api", "revenue"], Some(&RevenueSubmission { amount }))
            .await;
        if let Err(e) = &outcome {
            if e.signals_offline() {
                log::warn!("Revenue submission of {amount} failed: {e}");
            }
        }
        outcome
    }

    async fn trigger_sync(&self, brand_key: &str) -> Result<(), ApiError> {
        self.command(&format!("Sync of '{brand_key}'"), &["api", "sync", brand_key])
            .await
    }

    async fn trigger_run(&self, task: TaskId) -> Result<(), ApiError> {
        self.command(&format!("Run of '{task}'"), &["api", "run", task.as_str()])
            .await
    }

    async fn trigger_kill_all(&self) -> Result<(), ApiError> {
        self.command("Kill-all", &["api", "kill"]).await
    }
}
