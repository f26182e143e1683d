use anyhow::{Context, Result};
use lib_common::configs::load_config;
use lib_common::core::dispatcher::CommandDispatcher;
use lib_common::core::poller::Poller;
use lib_common::loggers::setup_logging;
use lib_common::{AccessGate, DashboardApi, DashboardBackend, DeploymentMode, Reconciler, ViewState};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinError;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

mod input;
mod render;

use input::{execute, parse, InputError, Reply};
use render::{render, Frame};

const APP_NAME: &str = "command_center";
const REDRAW_EVERY: Duration = Duration::from_secs(1);
const RENDER_FAILED: &str =
    "\nThe dashboard display stopped after an internal error. Commands still work; type quit to exit.";

type PromptLines = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config();
    let log_path = setup_logging(APP_NAME, &config.log_dir(), config.log_level())?;

    let mode = config.deployment_mode();
    log::info!("Starting {APP_NAME} in {mode} mode, logging to {}", log_path.display());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let gate = AccessGate::new(mode, config.pin());
    if !unlock(&gate, &mut lines).await? {
        log::info!("Access gate closed without a PIN, exiting.");
        return Ok(());
    }

    let backend: Arc<dyn DashboardBackend> = Arc::new(
        DashboardApi::new(mode, config.api_base(), config.request_timeout())
            .with_context(|| format!("invalid API base URL '{}'", config.api_base()))?,
    );
    let reconciler = Arc::new(Reconciler::new(mode));
    let mut poller = Poller::new(mode, config.poll_plan(), Arc::clone(&backend), Arc::clone(&reconciler));
    let dispatcher = CommandDispatcher::new(backend, poller.refresher()).with_sync_feedback(config.sync_feedback());
    poller.start();

    let shutdown = CancellationToken::new();
    let (notice_tx, notice_rx) = watch::channel(String::new());
    let mut render_handle = tokio::spawn(render_loop(
        reconciler.subscribe(),
        notice_rx,
        dispatcher.clone(),
        mode,
        shutdown.clone(),
    ));
    let mut rendering = true;

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                log::info!("Ctrl-C received, initiating shutdown.");
                break;
            }
            joined = &mut render_handle, if rendering => {
                rendering = false;
                if let Some(notice) = render_exit_notice(joined) {
                    eprintln!("{notice}");
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    log::info!("Input closed, initiating shutdown.");
                    break;
                };
                let notice = match parse(&line) {
                    Ok(command) => match execute(command, &dispatcher) {
                        Reply::Quit => break,
                        Reply::Notice(notice) => notice,
                    },
                    Err(InputError::Empty) => String::new(),
                    Err(e) => e.to_string(),
                };
                notice_tx.send_replace(notice);
            }
        }
    }

    shutdown.cancel();
    poller.stop();
    if rendering {
        let _ = render_handle.await;
    }

    log::info!("Shutdown complete.");
    Ok(())
}

/// Prompts for the PIN until it matches. `false` if input ends first.
async fn unlock(gate: &AccessGate, lines: &mut PromptLines) -> Result<bool> {
    while !gate.is_unlocked() {
        print!("Enter PIN: ");
        std::io::stdout().flush()?;
        let Some(attempt) = lines.next_line().await? else {
            return Ok(false);
        };
        if let Err(e) = gate.try_unlock(&attempt) {
            println!("{e}");
        }
    }
    Ok(true)
}

/// What to tell the user once the render task has ended. `None` for a clean exit.
fn render_exit_notice(joined: Result<(), JoinError>) -> Option<&'static str> {
    match joined {
        Ok(()) => None,
        Err(e) => {
            log::error!("Render task failed: {e}");
            Some(RENDER_FAILED)
        }
    }
}

async fn render_loop(
    mut state: watch::Receiver<ViewState>,
    mut notice: watch::Receiver<String>,
    dispatcher: CommandDispatcher,
    mode: DeploymentMode,
    shutdown: CancellationToken,
) {
    // The tick keeps in-flight indicators current between state changes.
    let mut ticker = interval(REDRAW_EVERY);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let frame = {
            let view = state.borrow_and_update();
            let text = notice.borrow_and_update();
            let in_flight = dispatcher.in_flight();
            render(&Frame { state: &view, in_flight: &in_flight, mode, notice: &text })
        };
        print!("\x1B[2J\x1B[H{frame}");
        let _ = std::io::stdout().flush();

        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = state.changed() => if changed.is_err() { break },
            changed = notice.changed() => if changed.is_err() { break },
            _ = ticker.tick() => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn render_panic_is_reported_not_propagated() {
        let handle = tokio::spawn(async {
            panic!("render blew up");
        });
        let joined = handle.await;
        assert!(joined.as_ref().is_err_and(JoinError::is_panic));
        assert_eq!(render_exit_notice(joined), Some(RENDER_FAILED));
    }

    #[tokio::test]
    async fn clean_render_exit_has_no_notice() {
        let handle = tokio::spawn(async {});
        assert_eq!(render_exit_notice(handle.await), None);
    }

    #[test]
    fn release_profile_unwinds_so_render_panics_stay_contained() {
        let manifest = include_str!("../../Cargo.toml");
        assert!(manifest.contains("panic = \"unwind\""));
        assert!(!manifest.contains("panic = \"abort\""));
    }
}
