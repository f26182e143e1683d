//! # Reconciler
//!
//! Owns the dashboard's `ViewState` and folds freshly fetched resource
//! snapshots into it.
//!
//! ## Core Design Principles:
//!
//! 1.  **Slice Merges**: every resource has a `ViewState::set_*` method that
//!     replaces exactly one slice wholesale in place and reports whether it
//!     changed, plus a by-value `with_*` form. Merges commute across
//!     resources and applying the same snapshot twice is a no-op.
//!
//! 2.  **Single Writer**: the `Reconciler` holds the only `watch::Sender` for
//!     the state. Presentation code gets `watch::Receiver`s or cloned
//!     snapshots and can never write back.
//!
//! 3.  **Failures Keep Old Data**: a failed fetch leaves its slice untouched.
//!     The one exception is the status resource, whose network or parse
//!     failure flips `system_status` to `Offline`.
//!
//! Stale writes are accepted: a slow response from tick N may land after a
//! faster one from tick N+1. The next tick repairs it.

use crate::backend::apicall::ApiError;
use crate::backend::deployment::DeploymentMode;
use crate::model::{
    Bot, Brand, BrandStatus, LogEntry, Pipeline, PipelineEntry, RevenuePoint, StatusSnapshot,
    SystemStatus,
};
use tokio::sync::watch;

/// # View State
///
/// Everything the dashboard renders, as last reconciled.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    /// Monitored brands, in backend order.
    pub brands: Vec<Brand>,
    /// Background bots, replaced every poll.
    pub bots: Vec<Bot>,
    /// System status line.
    pub system_status: SystemStatus,
    /// Videos waiting across all queues.
    pub pending_videos: u64,
    /// Revenue chart data.
    pub revenue_series: Vec<RevenuePoint>,
    /// Per-brand content queues.
    pub pipeline: Pipeline,
    /// Backend log feed, most recent last.
    pub logs: Vec<LogEntry>,
}

/// # Brand Card
///
/// Read-time composition of a `Brand` with its pipeline entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandCard {
    /// Brand key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Site URL with scheme.
    pub url: String,
    /// Raw status, shown as a label.
    pub status: BrandStatus,
    /// Derived from `status`.
    pub online: bool,
    /// Live affiliate links.
    pub active_links: u64,
    /// Effective pending count.
    pub pending: u64,
    /// Effective uploaded count.
    pub uploaded: u64,
    /// Effective failed count.
    pub failed: u64,
}

impl ViewState {
    /// The state at session start for `mode`.
    pub fn initial(mode: DeploymentMode) -> Self {
        Self {
            system_status: match mode {
                DeploymentMode::Local => SystemStatus::Checking,
                DeploymentMode::Remote => SystemStatus::RemoteView,
            },
            ..Default::default()
        }
    }

    /// Replaces brands, bots, system status and pending videos.
    pub fn set_status(&mut self, snapshot: StatusSnapshot) -> bool {
        // `|` so every field is written even after the first change.
        replace(&mut self.brands, snapshot.brands)
            | replace(&mut self.bots, snapshot.bots)
            | replace(&mut self.system_status, snapshot.system_status)
            | replace(&mut self.pending_videos, snapshot.pending_videos)
    }

    /// Marks the backend unreachable. Every other slice keeps its last value.
    pub fn set_status_offline(&mut self) -> bool {
        replace(&mut self.system_status, SystemStatus::Offline)
    }

    /// Replaces the pipeline map.
    pub fn set_pipeline(&mut self, pipeline: Pipeline) -> bool {
        replace(&mut self.pipeline, pipeline)
    }

    /// Replaces the revenue series. The server always sends the full series.
    pub fn set_revenue(&mut self, revenue_series: Vec<RevenuePoint>) -> bool {
        replace(&mut self.revenue_series, revenue_series)
    }

    /// Replaces the log feed.
    pub fn set_logs(&mut self, logs: Vec<LogEntry>) -> bool {
        replace(&mut self.logs, logs)
    }

    /// By-value form of `set_status`.
    pub fn with_status(mut self, snapshot: StatusSnapshot) -> Self {
        self.set_status(snapshot);
        self
    }

    /// By-value form of `set_status_offline`.
    pub fn with_status_offline(mut self) -> Self {
        self.set_status_offline();
        self
    }

    /// By-value form of `set_pipeline`.
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.set_pipeline(pipeline);
        self
    }

    /// By-value form of `set_revenue`.
    pub fn with_revenue(mut self, revenue_series: Vec<RevenuePoint>) -> Self {
        self.set_revenue(revenue_series);
        self
    }

    /// By-value form of `set_logs`.
    pub fn with_logs(mut self, logs: Vec<LogEntry>) -> Self {
        self.set_logs(logs);
        self
    }

    /// Pipeline entry for a brand key, if the pipeline resource has one.
    pub fn pipeline_entry(&self, brand_key: &str) -> Option<&PipelineEntry> {
        self.pipeline.get(brand_key)
    }

    /// Builds the card for `brand` with the count fallback applied:
    /// pipeline entry first, then the brand's own counts, then zero.
    pub fn brand_card(&self, brand: &Brand) -> BrandCard {
        let entry = self.pipeline_entry(&brand.id);
        let pick = |from_pipeline: fn(&PipelineEntry) -> u64, from_brand: Option<u64>| {
            entry.map(from_pipeline).or(from_brand).unwrap_or(0)
        };

        BrandCard {
            id: brand.id.clone(),
            name: brand.name.clone(),
            url: brand.site_url(),
            status: brand.status.clone(),
            online: brand.is_online(),
            active_links: brand.active_links,
            pending: pick(|e| e.pending, brand.pending),
            uploaded: pick(|e| e.uploaded, brand.uploaded),
            failed: pick(|e| e.failed, brand.failed),
        }
    }

    /// Cards for every brand, in backend order.
    pub fn brand_cards(&self) -> Vec<BrandCard> {
        self.brands.iter().map(|b| self.brand_card(b)).collect()
    }

    /// Whether any bot is currently producing content.
    pub fn any_generating(&self) -> bool {
        self.bots.iter().any(Bot::is_generating)
    }
}

/// # Reconciler
///
/// The single writer of `ViewState`. Each `apply_*` method takes the outcome of
/// one fetch and folds it in; a failed outcome leaves the state alone except
/// where noted.
pub struct Reconciler {
    state: watch::Sender<ViewState>,
}

impl Reconciler {
    /// Starts from `ViewState::initial(mode)`.
    pub fn new(mode: DeploymentMode) -> Self {
        let (state, _) = watch::channel(ViewState::initial(mode));
        Self { state }
    }

    /// A read handle that is notified on every change.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    /// A clone of the current state.
    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// Runs an in-place merge; receivers are woken only if it reports a change.
    fn update(&self, merge: impl FnOnce(&mut ViewState) -> bool) {
        self.state.send_if_modified(merge);
    }

    /// Folds the outcome of a status fetch.
    ///
    /// Network and parse failures set `Offline`; a configuration short-circuit
    /// changes nothing, so a remote deployment keeps showing `Remote View`.
    pub fn apply_status(&self, outcome: Result<StatusSnapshot, ApiError>) {
        match outcome {
            Ok(snapshot) => self.update(|s| s.set_status(snapshot)),
            Err(e) if e.signals_offline() => {
                log::warn!("Status fetch failed, marking backend offline: {e}");
                self.update(ViewState::set_status_offline);
            }
            Err(_) => {}
        }
    }

    /// Folds the outcome of a pipeline fetch.
    pub fn apply_pipeline(&self, outcome: Result<Pipeline, ApiError>) {
        match outcome {
            Ok(pipeline) => self.update(|s| s.set_pipeline(pipeline)),
            Err(e) => log_skipped("pipeline", &e),
        }
    }

    /// Folds the outcome of a revenue fetch.
    pub fn apply_revenue(&self, outcome: Result<Vec<RevenuePoint>, ApiError>) {
        match outcome {
            Ok(series) => self.update(|s| s.set_revenue(series)),
            Err(e) => log_skipped("revenue", &e),
        }
    }

    /// Folds the outcome of a logs fetch.
    pub fn apply_logs(&self, outcome: Result<Vec<LogEntry>, ApiError>) {
        match outcome {
            Ok(logs) => self.update(|s| s.set_logs(logs)),
            Err(e) => log_skipped("logs", &e),
        }
    }
}

/// Writes `value` into `slot` unless it is already equal. `true` if written.
fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn log_skipped(resource: &str, err: &ApiError) {
    if err.signals_offline() {
        log::warn!("Keeping previous {resource}: {err}");
    }
}
