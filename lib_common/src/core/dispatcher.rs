//! # Command Dispatcher
//!
//! Fires user commands at the dashboard API and tracks which ones are still
//! "in flight", so the presentation layer can disable the matching control.
//!
//! ## Core Design Principles:
//!
//! 1.  **Fire and Forget**: a command returns a `Dispatch` immediately. The HTTP
//!     call runs on its own Tokio task and its outcome only ever reaches the
//!     log. No command failure is surfaced to the caller.
//!
//! 2.  **Keyed In-Flight Set**: each command is keyed by its kind and target
//!     (brand key or task id). Issuing a command whose key is already in flight
//!     is ignored and reported as `Dispatch::AlreadyPending`. Distinct keys run
//!     concurrently.
//!
//! 3.  **Sync Feedback Hold**: a sync stays in flight for at least the
//!     configured feedback window (2 s by default) from dispatch, whatever the
//!     backend answers. Every other kind clears as soon as the backend answers.
//!
//! 4.  **Follow-up Refresh**: a successful run or kill-all triggers an
//!     immediate status refresh; a successful revenue submission triggers an
//!     immediate revenue refresh. Both go through the poller's `Refresher`, so
//!     nothing is applied after teardown.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use crate::backend::apicall::{validate_amount, ApiError, DashboardBackend};
use crate::backend::tasks::TaskId;
use crate::core::poller::{Refresher, Resource};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};

/// Default minimum time a sync stays in flight.
pub const DEFAULT_SYNC_FEEDBACK: Duration = Duration::from_millis(2000);

/// What a command does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandKind {
    /// Re-scan one brand.
    Sync,
    /// Start a named task.
    Run,
    /// Record a revenue amount.
    RevenueSubmit,
    /// Stop every running task.
    Kill,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::Sync => "sync",
            CommandKind::Run => "run",
            CommandKind::RevenueSubmit => "revenue",
            CommandKind::Kill => "kill",
        };
        f.write_str(name)
    }
}

/// # Command Key
///
/// Identity of an in-flight command. At most one command per key is in
/// flight at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandKey {
    /// Command kind.
    pub kind: CommandKind,
    /// Brand key for syncs, task id for runs, `None` otherwise.
    pub target: Option<String>,
}

impl CommandKey {
    /// Key of a sync for `brand_key`.
    pub fn sync(brand_key: &str) -> Self {
        Self { kind: CommandKind::Sync, target: Some(brand_key.to_string()) }
    }

    /// Key of a run of `task`.
    pub fn run(task: TaskId) -> Self {
        Self { kind: CommandKind::Run, target: Some(task.as_str().to_string()) }
    }

    /// Key of the revenue submission. Only one can be in flight.
    pub fn revenue_submit() -> Self {
        Self { kind: CommandKind::RevenueSubmit, target: None }
    }

    /// Key of the kill-all.
    pub fn kill() -> Self {
        Self { kind: CommandKind::Kill, target: None }
    }
}

impl fmt::Display for CommandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(f, "{} {}", self.kind, target),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// A command currently in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Kind and target.
    pub key: CommandKey,
    /// When it was dispatched.
    pub started_at: Instant,
}

/// # Dispatch
///
/// What happened to a command request.
#[derive(Debug)]
pub enum Dispatch {
    /// The command was issued. The handle completes once it leaves the
    /// in-flight set and any follow-up refresh has run.
    Started(JoinHandle<()>),
    /// A command with the same key is already in flight; nothing was sent.
    AlreadyPending,
    /// The bot or brand has no task to run; nothing was sent.
    NoTask,
}

impl Dispatch {
    /// Whether a request was actually issued.
    pub fn is_started(&self) -> bool {
        matches!(self, Dispatch::Started(_))
    }

    /// Waits for a started command to finish. Returns at once otherwise.
    pub async fn finished(self) {
        if let Dispatch::Started(handle) = self {
            if let Err(e) = handle.await {
                log::error!("Command task failed: {e}");
            }
        }
    }
}

type InFlight = Arc<Mutex<HashMap<CommandKey, Instant>>>;

/// # Command Dispatcher
#[derive(Clone)]
pub struct CommandDispatcher {
    backend: Arc<dyn DashboardBackend>,
    refresher: Refresher,
    in_flight: InFlight,
    sync_feedback: Duration,
}

impl CommandDispatcher {
    /// Creates a dispatcher with the default sync feedback window.
    pub fn new(backend: Arc<dyn DashboardBackend>, refresher: Refresher) -> Self {
        Self {
            backend,
            refresher,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            sync_feedback: DEFAULT_SYNC_FEEDBACK,
        }
    }

    /// Overrides the minimum time a sync stays in flight.
    pub fn with_sync_feedback(mut self, hold: Duration) -> Self {
        self.sync_feedback = hold;
        self
    }

    /// Asks the backend to re-scan `brand_key`.
    ///
    /// Stays in flight until `sync_feedback` has elapsed since dispatch, even if
    /// the backend answers (or fails) sooner.
    pub fn sync(&self, brand_key: &str) -> Dispatch {
        let key = CommandKey::sync(brand_key);
        let Some(started_at) = self.begin(&key) else {
            return Dispatch::AlreadyPending;
        };

        let backend = Arc::clone(&self.backend);
        let brand = brand_key.to_string();
        let in_flight = Arc::clone(&self.in_flight);
        let release_at = started_at + self.sync_feedback;

        let sent = key.clone();
        Dispatch::Started(tokio::spawn(async move {
            // The call is detached; a slow answer must not extend the hold.
            tokio::spawn(async move {
                report(&sent, &backend.trigger_sync(&brand).await);
            });
            sleep_until(release_at).await;
            finish(&in_flight, &key);
        }))
    }

    /// Starts `task`. A successful start refreshes the status.
    pub fn run(&self, task: TaskId) -> Dispatch {
        let key = CommandKey::run(task);
        if self.begin(&key).is_none() {
            return Dispatch::AlreadyPending;
        }

        let backend = Arc::clone(&self.backend);
        let refresher = self.refresher.clone();
        let in_flight = Arc::clone(&self.in_flight);

        Dispatch::Started(tokio::spawn(async move {
            let outcome = backend.trigger_run(task).await;
            finish(&in_flight, &key);
            report(&key, &outcome);
            if outcome.is_ok() {
                refresher.refresh(Resource::Status).await;
            }
        }))
    }

    /// Runs the task behind a bot's RUN control.
    pub fn run_for_bot(&self, bot_name: &str) -> Dispatch {
        match TaskId::for_bot(bot_name) {
            Some(task) => self.run(task),
            None => {
                log::debug!("Bot '{bot_name}' has no runnable task");
                Dispatch::NoTask
            }
        }
    }

    /// Runs the video batch for `brand_key`.
    pub fn generate(&self, brand_key: &str) -> Dispatch {
        match TaskId::batch_for_brand(brand_key) {
            Some(task) => self.run(task),
            None => {
                log::debug!("Brand '{brand_key}' has no batch task");
                Dispatch::NoTask
            }
        }
    }

    /// Records a revenue `amount`. A successful submission refreshes the
    /// revenue series immediately.
    ///
    /// # Errors
    /// Returns `ApiError::InvalidAmount` for non-finite or non-positive
    /// amounts. Nothing is sent in that case.
    pub fn submit_revenue(&self, amount: f64) -> Result<Dispatch, ApiError> {
        let amount = validate_amount(amount)?;
        let key = CommandKey::revenue_submit();
        if self.begin(&key).is_none() {
            return Ok(Dispatch::AlreadyPending);
        }

        let backend = Arc::clone(&self.backend);
        let refresher = self.refresher.clone();
        let in_flight = Arc::clone(&self.in_flight);

        Ok(Dispatch::Started(tokio::spawn(async move {
            let outcome = backend.submit_revenue(amount).await;
            finish(&in_flight, &key);
            report(&key, &outcome);
            if outcome.is_ok() {
                refresher.refresh(Resource::Revenue).await;
            }
        })))
    }

    /// Stops every running task. A successful kill refreshes the status.
    pub fn kill_all(&self) -> Dispatch {
        let key = CommandKey::kill();
        if self.begin(&key).is_none() {
            return Dispatch::AlreadyPending;
        }

        let backend = Arc::clone(&self.backend);
        let refresher = self.refresher.clone();
        let in_flight = Arc::clone(&self.in_flight);

        Dispatch::Started(tokio::spawn(async move {
            let outcome = backend.trigger_kill_all().await;
            finish(&in_flight, &key);
            report(&key, &outcome);
            if outcome.is_ok() {
                refresher.refresh(Resource::Status).await;
            }
        }))
    }

    /// Whether a command with `key` is in flight.
    pub fn is_in_flight(&self, key: &CommandKey) -> bool {
        lock(&self.in_flight).contains_key(key)
    }

    /// Whether a sync of `brand_key` is in flight.
    pub fn is_syncing(&self, brand_key: &str) -> bool {
        self.is_in_flight(&CommandKey::sync(brand_key))
    }

    /// Every in-flight command, oldest first.
    pub fn in_flight(&self) -> Vec<Command> {
        let mut commands: Vec<Command> = lock(&self.in_flight)
            .iter()
            .map(|(key, started_at)| Command { key: key.clone(), started_at: *started_at })
            .collect();
        commands.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.key.cmp(&b.key)));
        commands
    }

    /// Marks `key` in flight. `None` if it already was.
    fn begin(&self, key: &CommandKey) -> Option<Instant> {
        let mut in_flight = lock(&self.in_flight);
        if in_flight.contains_key(key) {
            log::debug!("Ignoring duplicate {key}: already in flight");
            return None;
        }
        let now = Instant::now();
        in_flight.insert(key.clone(), now);
        log::info!("Dispatching {key}");
        Some(now)
    }
}

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashMap<CommandKey, Instant>> {
    in_flight.lock().unwrap_or_else(PoisonError::into_inner)
}

fn finish(in_flight: &InFlight, key: &CommandKey) {
    lock(in_flight).remove(key);
}

/// Logs how a command ended. `true` when it was a real failure.
fn report(key: &CommandKey, outcome: &Result<(), ApiError>) -> bool {
    match outcome {
        Ok(()) => {
            log::info!("{key} acknowledged");
            false
        }
        Err(ApiError::Configuration) => {
            log::debug!("{key} skipped: no local backend");
            false
        }
        Err(e) => {
            log::warn!("{key} failed: {e}");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::deployment::DeploymentMode;
    use crate::core::poller::{PollPlan, Poller};
    use crate::core::reconciler::Reconciler;
    use crate::model::{LogEntry, Pipeline, RevenuePoint, StatusSnapshot, SystemStatus};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend whose commands answer after `latency`; `fail` makes them error.
    #[derive(Default)]
    struct FakeBackend {
        latency: Duration,
        fail: bool,
        status_calls: AtomicUsize,
        revenue_calls: AtomicUsize,
        command_calls: AtomicUsize,
    }

    impl FakeBackend {
        async fn answer(&self) -> Result<(), ApiError> {
            self.command_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;
            if self.fail {
                Err(ApiError::Network { endpoint: "api".into(), message: "refused".into() })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl DashboardBackend for FakeBackend {
        async fn fetch_status(&self) -> Result<StatusSnapshot, ApiError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            Ok(StatusSnapshot { system_status: SystemStatus::AllClear, ..Default::default() })
        }
        async fn fetch_revenue(&self) -> Result<Vec<RevenuePoint>, ApiError> {
            self.revenue_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![RevenuePoint { label: "Jan".into(), amount: 10.0 }])
        }
        async fn fetch_logs(&self) -> Result<Vec<LogEntry>, ApiError> {
            Ok(Vec::new())
        }
        async fn fetch_pipeline(&self) -> Result<Pipeline, ApiError> {
            Ok(Pipeline::new())
        }
        async fn submit_revenue(&self, _amount: f64) -> Result<(), ApiError> {
            self.answer().await
        }
        async fn trigger_sync(&self, _brand_key: &str) -> Result<(), ApiError> {
            self.answer().await
        }
        async fn trigger_run(&self, _task: TaskId) -> Result<(), ApiError> {
            self.answer().await
        }
        async fn trigger_kill_all(&self) -> Result<(), ApiError> {
            self.answer().await
        }
    }

    struct Harness {
        backend: Arc<FakeBackend>,
        reconciler: Arc<Reconciler>,
        dispatcher: CommandDispatcher,
        poller: Poller,
    }

    fn harness(backend: FakeBackend) -> Harness {
        let backend = Arc::new(backend);
        let reconciler = Arc::new(Reconciler::new(DeploymentMode::Local));
        // Never started: only its refresher is used.
        let poller = Poller::new(
            DeploymentMode::Local,
            PollPlan::full(),
            backend.clone(),
            reconciler.clone(),
        );
        let dispatcher = CommandDispatcher::new(backend.clone(), poller.refresher());
        Harness { backend, reconciler, dispatcher, poller }
    }

    #[tokio::test(start_paused = true)]
    async fn sync_holds_for_the_feedback_window_after_a_fast_answer() {
        let h = harness(FakeBackend { latency: Duration::from_millis(10), ..Default::default() });

        let dispatch = h.dispatcher.sync("richesse");
        assert!(dispatch.is_started());
        assert!(h.dispatcher.is_syncing("richesse"));

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert!(h.dispatcher.is_syncing("richesse"));

        dispatch.finished().await;
        assert!(!h.dispatcher.is_syncing("richesse"));
        assert_eq!(h.backend.command_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sync_clears_on_schedule_even_when_the_backend_fails() {
        let h = harness(FakeBackend { fail: true, ..Default::default() });
        let started = Instant::now();
        h.dispatcher.sync("heritage").finished().await;
        assert!(!h.dispatcher.is_syncing("heritage"));
        let held = started.elapsed();
        assert!(held >= DEFAULT_SYNC_FEEDBACK && held < DEFAULT_SYNC_FEEDBACK + Duration::from_millis(5));
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_sync_is_ignored_but_other_brands_run() {
        let h = harness(FakeBackend::default());
        let first = h.dispatcher.sync("richesse");
        assert!(matches!(h.dispatcher.sync("richesse"), Dispatch::AlreadyPending));
        let other = h.dispatcher.sync("techprism");
        assert!(other.is_started());
        assert_eq!(h.dispatcher.in_flight().len(), 2);

        first.finished().await;
        other.finished().await;
        assert_eq!(h.backend.command_calls.load(Ordering::SeqCst), 2);
        assert!(h.dispatcher.in_flight().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn custom_feedback_window_is_honoured() {
        let h = harness(FakeBackend::default());
        let dispatcher = h.dispatcher.clone().with_sync_feedback(Duration::from_millis(500));
        let started = Instant::now();
        dispatcher.sync("richesse").finished().await;
        let held = started.elapsed();
        assert!(held >= Duration::from_millis(500) && held < Duration::from_millis(505));
    }

    #[tokio::test(start_paused = true)]
    async fn run_clears_on_answer_and_refreshes_status() {
        let h = harness(FakeBackend { latency: Duration::from_millis(50), ..Default::default() });
        let key = CommandKey::run(TaskId::KdpUploader);

        let dispatch = h.dispatcher.run(TaskId::KdpUploader);
        assert!(h.dispatcher.is_in_flight(&key));
        dispatch.finished().await;

        assert!(!h.dispatcher.is_in_flight(&key));
        assert_eq!(h.backend.status_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.reconciler.snapshot().system_status, SystemStatus::AllClear);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_run_does_not_refresh() {
        let h = harness(FakeBackend { fail: true, ..Default::default() });
        h.dispatcher.run(TaskId::SocialUploader).finished().await;
        assert_eq!(h.backend.status_calls.load(Ordering::SeqCst), 0);
        assert!(h.dispatcher.in_flight().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn bots_and_brands_without_tasks_send_nothing() {
        let h = harness(FakeBackend::default());
        assert!(matches!(h.dispatcher.run_for_bot("Trend Scraper"), Dispatch::NoTask));
        assert!(matches!(h.dispatcher.generate("unknown"), Dispatch::NoTask));
        h.dispatcher.generate("heritage").finished().await;
        h.dispatcher.run_for_bot("KDP Orchestrator").finished().await;
        assert_eq!(h.backend.command_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn revenue_submission_refreshes_revenue() {
        let h = harness(FakeBackend::default());
        let dispatch = h.dispatcher.submit_revenue(42.0).unwrap();
        assert!(h.dispatcher.is_in_flight(&CommandKey::revenue_submit()));
        dispatch.finished().await;

        assert_eq!(h.backend.revenue_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.reconciler.snapshot().revenue_series.len(), 1);
        assert!(!h.dispatcher.is_in_flight(&CommandKey::revenue_submit()));
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_revenue_is_rejected_without_a_request() {
        let h = harness(FakeBackend::default());
        assert!(matches!(h.dispatcher.submit_revenue(0.0), Err(ApiError::InvalidAmount(_))));
        assert!(matches!(h.dispatcher.submit_revenue(f64::NAN), Err(ApiError::InvalidAmount(_))));
        assert_eq!(h.backend.command_calls.load(Ordering::SeqCst), 0);
        assert!(h.dispatcher.in_flight().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn kill_all_refreshes_status() {
        let h = harness(FakeBackend::default());
        let dispatch = h.dispatcher.kill_all();
        assert!(matches!(h.dispatcher.kill_all(), Dispatch::AlreadyPending));
        dispatch.finished().await;
        assert_eq!(h.backend.command_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.backend.status_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn no_refresh_is_applied_after_teardown() {
        let mut h = harness(FakeBackend { latency: Duration::from_millis(100), ..Default::default() });
        let dispatch = h.dispatcher.kill_all();
        h.poller.stop();
        dispatch.finished().await;
        assert_eq!(h.backend.status_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.reconciler.snapshot().system_status, SystemStatus::Checking);
    }

    #[test]
    fn only_real_failures_are_reported_as_warnings() {
        let key = CommandKey::sync("richesse");
        assert!(report(&key, &Err(ApiError::Network { endpoint: "api/sync".into(), message: "refused".into() })));
        assert!(!report(&key, &Err(ApiError::Configuration)));
        assert!(!report(&key, &Ok(())));
    }

    #[test]
    fn keys_display_kind_and_target() {
        assert_eq!(CommandKey::sync("richesse").to_string(), "sync richesse");
        assert_eq!(CommandKey::run(TaskId::BatchHeritage).to_string(), "run batch_heritage");
        assert_eq!(CommandKey::kill().to_string(), "kill");
    }
}
