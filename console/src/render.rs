//! Plain-terminal rendering of the `ViewState`.
//!
//! Everything here is a pure function of its inputs; the caller decides when
//! to redraw and where the text goes.

use colored::{ColoredString, Colorize};
use lib_common::core::dispatcher::{Command, CommandKey, CommandKind};
use lib_common::core::reconciler::{BrandCard, ViewState};
use lib_common::model::pipeline::display_file_name;
use lib_common::model::{Bot, LogEntry, LogLevel, PipelineEntry, SystemStatus};
use lib_common::DeploymentMode;
use std::fmt::Write;

/// Number of log lines shown at the bottom.
pub const LOG_TAIL: usize = 12;
const RECENT_UPLOADED: usize = 3;
const RECENT_PENDING: usize = 2;
const BAR_WIDTH: usize = 20;

/// Everything needed for one frame besides the view-state.
pub struct Frame<'a> {
    /// What to draw.
    pub state: &'a ViewState,
    /// Commands still in flight, oldest first.
    pub in_flight: &'a [Command],
    /// Local or remote.
    pub mode: DeploymentMode,
    /// Last command feedback.
    pub notice: &'a str,
}

fn status_dot(status: &SystemStatus) -> ColoredString {
    match status {
        SystemStatus::AllClear => "●".green(),
        SystemStatus::Offline => "●".red(),
        _ => "●".yellow(),
    }
}

fn log_line(entry: &LogEntry) -> ColoredString {
    let text = entry.message.as_str();
    match entry.level {
        LogLevel::Error => text.red(),
        LogLevel::Warning => text.yellow(),
        LogLevel::Success => text.green(),
        LogLevel::Activity => text.cyan(),
        LogLevel::Daemon => text.magenta(),
        LogLevel::Info => text.normal(),
    }
}

fn progress_bar(entry: &PipelineEntry) -> String {
    let percent = usize::from(entry.progress_percent());
    let filled = percent * BAR_WIDTH / 100;
    format!("[{}{}] {:>3}%", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled), percent)
}

fn brand_line(card: &BrandCard, syncing: bool) -> String {
    let dot = if card.online { "●".green() } else { "●".red() };
    let mut line = format!(
        "  {} {} ({}) {}  links {}  pending {}  uploaded {}  failed {}",
        dot,
        card.name.bold(),
        card.id,
        card.status,
        card.active_links,
        card.pending,
        card.uploaded,
        card.failed
    );
    if syncing {
        line.push_str(&format!("  {}", "syncing...".yellow()));
    }
    line
}

fn bot_line(bot: &Bot) -> String {
    let status = bot.status.to_string();
    let status = if bot.is_generating() { status.cyan().bold() } else { status.dimmed() };
    format!("  {:<24} {}", bot.name, status)
}

fn in_flight_label(key: &CommandKey) -> String {
    match key.kind {
        CommandKind::Sync => format!("syncing {}", key.target.as_deref().unwrap_or("?")),
        CommandKind::Run => format!("starting {}", key.target.as_deref().unwrap_or("?")),
        CommandKind::RevenueSubmit => "submitting revenue".to_string(),
        CommandKind::Kill => "killing all tasks".to_string(),
    }
}

/// Renders one full frame.
pub fn render(frame: &Frame<'_>) -> String {
    let state = frame.state;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{}  {} {}",
        "COMMAND CENTER".bold(),
        status_dot(&state.system_status),
        state.system_status
    );
    if !frame.mode.is_local() {
        let _ = writeln!(
            out,
            "{} Live pipeline data requires the local API to be running on your machine.",
            "Remote View:".yellow().bold()
        );
    }

    let _ = writeln!(out, "\n{}", "BRANDS".bold());
    let cards = state.brand_cards();
    if cards.is_empty() {
        let _ = writeln!(out, "  {}", "no brands yet".dimmed());
    }
    for card in &cards {
        let syncing = frame
            .in_flight
            .iter()
            .any(|c| c.key == CommandKey::sync(&card.id));
        let _ = writeln!(out, "{}", brand_line(card, syncing));
        let _ = writeln!(out, "      {}", card.url.dimmed());
    }

    let _ = writeln!(out, "\n{}", "CONTENT PIPELINE".bold());
    if state.pipeline.is_empty() {
        let _ = writeln!(out, "  {}", "no pipeline data".dimmed());
    }
    for (key, entry) in &state.pipeline {
        let name = if entry.name.is_empty() { key.as_str() } else { entry.name.as_str() };
        let _ = writeln!(
            out,
            "  {:<12} {}  {}/{} uploaded, {} failed",
            name,
            progress_bar(entry),
            entry.uploaded,
            entry.total(),
            entry.failed
        );
        for file in entry.recent_uploaded.iter().take(RECENT_UPLOADED) {
            let _ = writeln!(out, "      {} {}", "✓".green(), display_file_name(file));
        }
        for file in entry.recent_pending.iter().take(RECENT_PENDING) {
            let _ = writeln!(out, "      {} {}", "…".yellow(), display_file_name(file));
        }
    }

    let _ = writeln!(out, "\n{}", "REVENUE".bold());
    if state.revenue_series.is_empty() {
        let _ = writeln!(out, "  {}", "no revenue recorded".dimmed());
    } else {
        let total: f64 = state.revenue_series.iter().map(|p| p.amount).sum();
        let series: Vec<String> = state
            .revenue_series
            .iter()
            .map(|p| format!("{} ${:.2}", p.label, p.amount))
            .collect();
        let _ = writeln!(out, "  {}", series.join("  "));
        let _ = writeln!(out, "  total {}", format!("${total:.2}").green().bold());
    }

    let _ = writeln!(out, "\n{}", "BOTS".bold());
    for bot in &state.bots {
        let _ = writeln!(out, "{}", bot_line(bot));
    }
    let _ = writeln!(out, "  pending videos: {}", state.pending_videos);

    if !frame.in_flight.is_empty() {
        let labels: Vec<String> = frame.in_flight.iter().map(|c| in_flight_label(&c.key)).collect();
        let _ = writeln!(out, "\n{} {}", "IN FLIGHT".bold(), labels.join(", ").yellow());
    }

    let _ = writeln!(out, "\n{}", "LOGS".bold());
    let skip = state.logs.len().saturating_sub(LOG_TAIL);
    for entry in state.logs.iter().skip(skip) {
        let _ = writeln!(out, "  {}", log_line(entry));
    }

    if !frame.notice.is_empty() {
        let _ = writeln!(out, "\n{}", frame.notice.italic());
    }
    out.push_str("> ");
    out
}
