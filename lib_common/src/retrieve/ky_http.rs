//! # HTTP Retrieval Utilities
//!
//! This module provides an asynchronous JSON API client wrapper around `reqwest`
//! and `reqwest-middleware`. It owns URL construction, JSON bodies, the
//! per-request timeout and the split between transport failures (an `Err`)
//! and non-2xx answers (an `Ok` with `success == false`).
//!
//! No retry middleware is installed: callers that poll simply try again on
//! their next tick.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;

/// # HTTP Error
///
/// Failures that prevent an `ApiResponse` from being produced at all.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The base URL is not an absolute `http(s)` URL.
    #[error("invalid base URL '{0}': {1}")]
    BaseUrl(String, String),

    /// The underlying `reqwest` client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// The request could not be sent or timed out.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest_middleware::Error),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(#[from] reqwest::Error),

    /// The request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// A 2xx body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(#[source] serde_json::Error),
}

/// A standardized container for API responses.
///
/// This struct wraps the deserialized data along with the HTTP status of the
/// transaction.
#[derive(Debug)]
pub struct ApiResponse<T> {
    /// The successfully deserialized response body, if any.
    pub data: Option<T>,
    /// The raw error body returned by the server if the request failed.
    pub error_body: Option<String>,
    /// The numeric HTTP status code.
    pub status: u16,
    /// Indicates if the status code was in the 2xx range.
    pub success: bool,
}

/// A flexible asynchronous HTTP client bound to one base URL.
#[derive(Clone)]
pub struct ApiClient {
    /// The underlying middleware-enabled client.
    inner: ClientWithMiddleware,
    /// The base URL to which all path segments are appended.
    base_url: Url,
}

impl ApiClient {
    /// Creates a new `ApiClient`.
    ///
    /// # Arguments
    /// * `base_url` - Absolute base URL of the API (e.g., "http://127.0.0.1:5001").
    /// * `timeout` - Upper bound for a whole request, connect to last byte.
    ///
    /// # Errors
    /// Returns `HttpError::BaseUrl` if `base_url` is not an absolute `http(s)`
    /// URL, or `HttpError::Build` if the TLS backend cannot be initialised.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, HttpError> {
        let url = Url::parse(base_url)
            .map_err(|e| HttpError::BaseUrl(base_url.to_string(), e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(HttpError::BaseUrl(
                base_url.to_string(),
                "expected an absolute http(s) URL".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("command-center/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(HttpError::Build)?;

        Ok(Self {
            inner: ClientBuilder::new(client).build(),
            base_url: url,
        })
    }

    /// The base URL all requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends percent-encoded `segments` to the base URL's path.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Performs a request and decodes a 2xx JSON body into `T`.
    ///
    /// # Arguments
    /// * `method` - The HTTP verb (GET, POST, etc.).
    /// * `segments` - Path segments appended to the base URL.
    /// * `body` - Optional serializable object sent as the JSON body.
    ///
    /// # Errors
    /// Transport, body-read and decode failures are errors. A non-2xx status
    /// is not: it comes back as `ApiResponse { success: false, .. }`.
    pub async fn request<T, B>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<ApiResponse<T>, HttpError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let (status, text) = self.send(method, segments, body).await?;

        if status.is_success() {
            let data = serde_json::from_str::<T>(&text).map_err(HttpError::Decode)?;
            Ok(ApiResponse {
                data: Some(data),
                error_body: None,
                status: status.as_u16(),
                success: true,
            })
        } else {
            Ok(ApiResponse {
                data: None,
                error_body: Some(text),
                status: status.as_u16(),
                success: false,
            })
        }
    }

    /// Like `request`, but ignores the body of a 2xx answer.
    ///
    /// Used for command endpoints whose acknowledgement carries nothing the
    /// caller needs.
    pub async fn request_ack<B>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<ApiResponse<()>, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let (status, text) = self.send(method, segments, body).await?;
        let success = status.is_success();
        Ok(ApiResponse {
            data: success.then_some(()),
            error_body: (!success).then_some(text),
            status: status.as_u16(),
            success,
        })
    }

    async fn send<B>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<(reqwest::StatusCode, String), HttpError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(segments);
        let mut req = self.inner.request(method, url);

        if let Some(b) = body {
            let json_body = serde_json::to_string(b).map_err(HttpError::Encode)?;
            req = req.header(CONTENT_TYPE, "application/json").body(json_body);
        }

        let response: reqwest::Response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;
        Ok((status, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_relative_and_non_http_base_urls() {
        assert!(matches!(
            ApiClient::new("127.0.0.1:5001", Duration::from_secs(1)),
            Err(HttpError::BaseUrl(..))
        ));
        assert!(matches!(
            ApiClient::new("ftp://127.0.0.1/", Duration::from_secs(1)),
            Err(HttpError::BaseUrl(..))
        ));
    }

    #[test]
    fn endpoint_appends_encoded_segments() {
        let client = ApiClient::new("http://127.0.0.1:5001", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.endpoint(&["api", "sync", "richesse"]).as_str(),
            "http://127.0.0.1:5001/api/sync/richesse"
        );
        assert_eq!(
            client.endpoint(&["api", "sync", "a b/c"]).as_str(),
            "http://127.0.0.1:5001/api/sync/a%20b%2Fc"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let client = ApiClient::new("http://host:8080/dash/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.endpoint(&["api", "logs"]).as_str(),
            "http://host:8080/dash/api/logs"
        );
    }
}
