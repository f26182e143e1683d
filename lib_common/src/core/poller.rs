//! # Poller
//!
//! Keeps the view-state fresh by fetching every configured resource on a fixed
//! period and handing each outcome to the `Reconciler`.
//!
//! ## Lifecycle:
//! - `start()` spawns one timer task. The first tick fires immediately, so the
//!   dashboard never waits a full period for its first data.
//! - Each tick spawns one fetch per resource. Fetches are independent: a slow
//!   or failing resource never delays or blocks the others, and a fetch that
//!   outlives the period may overlap the next one for the same resource.
//! - `stop()` (or dropping the `Poller`) cancels a shared token. The timer
//!   exits and any fetch still in flight is abandoned: its result is never
//!   applied. `stop()` is terminal; build a new `Poller` to poll again.
//! - In a remote deployment `start()` does nothing, so no request is ever
//!   attempted.

use crate::backend::apicall::DashboardBackend;
use crate::backend::deployment::DeploymentMode;
use crate::core::reconciler::Reconciler;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Period of the full dashboard poll.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_millis(5000);
/// Period of the lightweight status-only poll.
pub const STATUS_ONLY_POLL_PERIOD: Duration = Duration::from_millis(10_000);

/// One independently polled API resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// `GET /api/status`.
    Status,
    /// `GET /api/revenue`.
    Revenue,
    /// `GET /api/logs`.
    Logs,
    /// `GET /api/content-pipeline`.
    Pipeline,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Status => "status",
            Resource::Revenue => "revenue",
            Resource::Logs => "logs",
            Resource::Pipeline => "pipeline",
        };
        f.write_str(name)
    }
}

/// # Poll Plan
///
/// Which resources to fetch and how often.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPlan {
    /// Time between ticks.
    pub period: Duration,
    /// Resources fetched on every tick.
    pub resources: Vec<Resource>,
}

impl PollPlan {
    /// Status, revenue, logs and pipeline every 5 s.
    pub fn full() -> Self {
        Self {
            period: DEFAULT_POLL_PERIOD,
            resources: vec![Resource::Status, Resource::Revenue, Resource::Logs, Resource::Pipeline],
        }
    }

    /// Status alone every 10 s, for a lightweight status indicator.
    pub fn status_only() -> Self {
        Self {
            period: STATUS_ONLY_POLL_PERIOD,
            resources: vec![Resource::Status],
        }
    }

    /// Same resources, different period. Zero is bumped to 1 ms.
    pub fn with_period(self, period: Duration) -> Self {
        Self { period: period.max(Duration::from_millis(1)), ..self }
    }
}

/// # Refresher
///
/// Fetches one resource and folds it into the view-state, unless the owning
/// `Poller` has been stopped. Cheap to clone; handed to the command
/// dispatcher for out-of-band refreshes.
#[derive(Clone)]
pub struct Refresher {
    backend: Arc<dyn DashboardBackend>,
    reconciler: Arc<Reconciler>,
    shutdown: CancellationToken,
}

impl Refresher {
    /// Whether the owning poller has been torn down.
    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Fetches `resource` once and applies the outcome.
    ///
    /// Returns without touching the state if the poller is stopped before or
    /// while the fetch is running.
    pub async fn refresh(&self, resource: Resource) {
        if self.is_stopped() {
            return;
        }
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                log::debug!("Abandoning {resource} fetch after teardown");
            }
            _ = self.fetch_and_apply(resource) => {}
        }
    }

    /// Spawns one detached refresh per resource.
    pub fn spawn_refreshes(&self, resources: &[Resource]) {
        for &resource in resources {
            let refresher = self.clone();
            tokio::spawn(async move { refresher.refresh(resource).await });
        }
    }

    async fn fetch_and_apply(&self, resource: Resource) {
        let backend = self.backend.as_ref();
        match resource {
            Resource::Status => {
                let outcome = backend.fetch_status().await;
                if !self.is_stopped() {
                    self.reconciler.apply_status(outcome);
                }
            }
            Resource::Revenue => {
                let outcome = backend.fetch_revenue().await;
                if !self.is_stopped() {
                    self.reconciler.apply_revenue(outcome);
                }
            }
            Resource::Logs => {
                let outcome = backend.fetch_logs().await;
                if !self.is_stopped() {
                    self.reconciler.apply_logs(outcome);
                }
            }
            Resource::Pipeline => {
                let outcome = backend.fetch_pipeline().await;
                if !self.is_stopped() {
                    self.reconciler.apply_pipeline(outcome);
                }
            }
        }
    }
}

/// # Poller
///
/// Owns the repeating timer. See the module docs for the lifecycle.
pub struct Poller {
    mode: DeploymentMode,
    plan: PollPlan,
    refresher: Refresher,
    task: Option<JoinHandle<()>>,
}

impl Poller {
    /// Creates a stopped poller. Nothing is fetched until `start()`.
    pub fn new(
        mode: DeploymentMode,
        plan: PollPlan,
        backend: Arc<dyn DashboardBackend>,
        reconciler: Arc<Reconciler>,
    ) -> Self {
        Self {
            mode,
            plan,
            refresher: Refresher {
                backend,
                reconciler,
                shutdown: CancellationToken::new(),
            },
            task: None,
        }
    }

    /// A handle for out-of-band refreshes that honours this poller's teardown.
    pub fn refresher(&self) -> Refresher {
        self.refresher.clone()
    }

    /// The plan this poller runs.
    pub fn plan(&self) -> &PollPlan {
        &self.plan
    }

    /// Whether the timer task is alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Spawns the timer task. Must be called inside a Tokio runtime.
    ///
    /// Returns `false` without spawning when the deployment is remote, the
    /// poller is already running, or it has been stopped.
    pub fn start(&mut self) -> bool {
        if !self.mode.is_local() {
            log::info!("Remote deployment: polling disabled");
            return false;
        }
        if self.refresher.is_stopped() {
            log::warn!("Poller was stopped; create a new one to poll again");
            return false;
        }
        if self.is_running() {
            return false;
        }

        log::info!(
            "Polling {:?} every {} ms",
            self.plan.resources,
            self.plan.period.as_millis()
        );
        let plan = self.plan.clone();
        let refresher = self.refresher.clone();
        self.task = Some(tokio::spawn(run_timer(plan, refresher)));
        true
    }

    /// Stops the timer and suppresses every result still in flight.
    pub fn stop(&mut self) {
        self.refresher.shutdown.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
            log::info!("Poller stopped");
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_timer(plan: PollPlan, refresher: Refresher) {
    let mut ticker = interval(plan.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = refresher.shutdown.cancelled() => break,
            _ = ticker.tick() => refresher.spawn_refreshes(&plan.resources),
        }
    }
}
