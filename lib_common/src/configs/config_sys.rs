//! # Dashboard Configuration
//!
//! Every setting is optional at each source. Sources are layered, later wins:
//!
//! 1. built-in defaults,
//! 2. a JSON file (`command_center.conf` in the working directory, else
//!    `<user config dir>/command_center/command_center.conf`, or the path
//!    given with `--config-path`),
//! 3. `DASHBOARD_*` environment variables and command line flags.
//!
//! A missing or malformed file is logged and skipped; loading never fails.

use crate::backend::deployment::DeploymentMode;
use crate::core::poller::PollPlan;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name looked up when no `--config-path` is given.
pub const CONFIG_FILE_NAME: &str = "command_center.conf";

const DEFAULT_API_BASE: &str = "http://127.0.0.1:5001";
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
const DEFAULT_STATUS_INTERVAL_MS: u64 = 10_000;
const DEFAULT_SYNC_FEEDBACK_MS: u64 = 2000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 4000;
const DEFAULT_PIN: &str = crate::core::access_gate::DEFAULT_PIN;
const DEFAULT_LOG_DIR: &str = "./logs";
const DEFAULT_LOG_LEVEL: &str = "info";

/// # Config Error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON for `DashboardConfig`.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// # Dashboard Config
#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[clap(name = "command_center", about = "Terminal command center for the content automation backend", version)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    #[clap(long, env = "DASHBOARD_API_BASE", help = "Base URL of the local dashboard API.")]
    pub api_base: Option<String>,

    #[clap(long, env = "DASHBOARD_HOST", help = "Host the dashboard is served from; decides local vs. remote.")]
    pub host: Option<String>,

    #[clap(long, env = "DASHBOARD_MODE", help = "Force the deployment mode (local or remote).")]
    pub mode: Option<DeploymentMode>,

    #[clap(long, env = "DASHBOARD_POLL_INTERVAL_MS", help = "Period of the full poll in milliseconds.")]
    pub poll_interval_ms: Option<u64>,

    #[clap(long, env = "DASHBOARD_STATUS_INTERVAL_MS", help = "Period of the status-only poll in milliseconds.")]
    pub status_interval_ms: Option<u64>,

    #[clap(
        long,
        env = "DASHBOARD_STATUS_ONLY",
        num_args = 0..=1,
        default_missing_value = "true",
        help = "Poll the status resource alone."
    )]
    pub status_only: Option<bool>,

    #[clap(long, env = "DASHBOARD_SYNC_FEEDBACK_MS", help = "Minimum time a sync shows as in flight, in milliseconds.")]
    pub sync_feedback_ms: Option<u64>,

    #[clap(long, env = "DASHBOARD_REQUEST_TIMEOUT_MS", help = "Per-request timeout in milliseconds.")]
    pub request_timeout_ms: Option<u64>,

    #[clap(long, env = "DASHBOARD_PIN", help = "PIN remote viewers must enter.")]
    pub pin: Option<String>,

    #[clap(long, env = "DASHBOARD_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "DASHBOARD_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "DASHBOARD_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,
}

impl DashboardConfig {
    /// The built-in defaults.
    pub fn defaults() -> Self {
        Self {
            api_base: Some(DEFAULT_API_BASE.to_string()),
            host: Some(DEFAULT_HOST.to_string()),
            mode: None,
            poll_interval_ms: Some(DEFAULT_POLL_INTERVAL_MS),
            status_interval_ms: Some(DEFAULT_STATUS_INTERVAL_MS),
            status_only: Some(false),
            sync_feedback_ms: Some(DEFAULT_SYNC_FEEDBACK_MS),
            request_timeout_ms: Some(DEFAULT_REQUEST_TIMEOUT_MS),
            pin: Some(DEFAULT_PIN.to_string()),
            log_dir: Some(PathBuf::from(DEFAULT_LOG_DIR)),
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
            config_path: None,
        }
    }

    // `other` overrides `self` wherever it has a value.
    fn merge(self, other: DashboardConfig) -> DashboardConfig {
        DashboardConfig {
            api_base: other.api_base.or(self.api_base),
            host: other.host.or(self.host),
            mode: other.mode.or(self.mode),
            poll_interval_ms: other.poll_interval_ms.or(self.poll_interval_ms),
            status_interval_ms: other.status_interval_ms.or(self.status_interval_ms),
            status_only: other.status_only.or(self.status_only),
            sync_feedback_ms: other.sync_feedback_ms.or(self.sync_feedback_ms),
            request_timeout_ms: other.request_timeout_ms.or(self.request_timeout_ms),
            pin: other.pin.or(self.pin),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            config_path: other.config_path.or(self.config_path),
        }
    }

    /// Reads one JSON config file.
    ///
    /// # Errors
    /// `ConfigError::Io` if it cannot be read, `ConfigError::Parse` if it is
    /// not a valid config object.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Deployment mode: the explicit `mode` if set, else derived from `host`.
    pub fn deployment_mode(&self) -> DeploymentMode {
        self.mode.unwrap_or_else(|| {
            DeploymentMode::from_host(self.host.as_deref().unwrap_or(DEFAULT_HOST))
        })
    }

    /// Base URL of the dashboard API.
    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    /// The poll plan selected by `status_only` and the interval settings.
    pub fn poll_plan(&self) -> PollPlan {
        if self.status_only.unwrap_or(false) {
            let period = self.status_interval_ms.unwrap_or(DEFAULT_STATUS_INTERVAL_MS);
            PollPlan::status_only().with_period(Duration::from_millis(period))
        } else {
            let period = self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS);
            PollPlan::full().with_period(Duration::from_millis(period))
        }
    }

    /// Minimum in-flight time for syncs.
    pub fn sync_feedback(&self) -> Duration {
        Duration::from_millis(self.sync_feedback_ms.unwrap_or(DEFAULT_SYNC_FEEDBACK_MS))
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS))
    }

    /// PIN remote viewers must enter.
    pub fn pin(&self) -> &str {
        self.pin.as_deref().unwrap_or(DEFAULT_PIN)
    }

    /// Directory for log files.
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
    }

    /// Logging level name.
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

/// Where to look for the config file when none is given explicitly.
pub fn default_config_path() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .map(|dir| dir.join("command_center").join(CONFIG_FILE_NAME))
        .unwrap_or(local)
}

/// Layers defaults, the config file and `cli` (which already carries the
/// environment) into one resolved config.
pub fn load_from(cli: DashboardConfig) -> DashboardConfig {
    let config_file_path = cli.config_path.clone().unwrap_or_else(default_config_path);
    let mut current_config = DashboardConfig::defaults();

    if config_file_path.exists() {
        match DashboardConfig::from_file(&config_file_path) {
            Ok(file_config) => current_config = current_config.merge(file_config),
            Err(e) => log::warn!("{e}. Falling back to other sources."),
        }
    } else {
        log::info!(
            "Config file not found at {}. Using defaults and environment/CLI variables.",
            config_file_path.display()
        );
    }

    let mut merged = current_config.merge(cli);
    merged.config_path = Some(config_file_path);
    merged
}

/// Parses the process arguments and environment and resolves the config.
pub fn load_config() -> DashboardConfig {
    load_from(DashboardConfig::parse())
}
