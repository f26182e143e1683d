//! # Deployment Mode
//!
//! Whether a local dashboard API is reachable at all. Decided once at startup
//! from configuration and passed explicitly to the components that need it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Host names that count as "this machine runs the backend".
pub const LOCAL_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

/// # Deployment Mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    /// The dashboard runs next to the backend; the API base is used.
    Local,
    /// No backend is reachable. Every API call short-circuits.
    Remote,
}

impl DeploymentMode {
    /// `Local` for a recognised local host name, `Remote` otherwise.
    pub fn from_host(host: &str) -> Self {
        let host = host.trim();
        if LOCAL_HOSTS.iter().any(|h| h.eq_ignore_ascii_case(host)) {
            DeploymentMode::Local
        } else {
            DeploymentMode::Remote
        }
    }

    /// True for `Local`.
    pub fn is_local(self) -> bool {
        self == DeploymentMode::Local
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentMode::Local => f.write_str("local"),
            DeploymentMode::Remote => f.write_str("remote"),
        }
    }
}

impl FromStr for DeploymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(DeploymentMode::Local),
            "remote" => Ok(DeploymentMode::Remote),
            other => Err(format!("unknown deployment mode '{other}' (expected local or remote)")),
        }
    }
}
