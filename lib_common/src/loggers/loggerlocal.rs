//! # Local Logger
//!
//! Installs the process-wide `log` backend: every record at or above the
//! configured level goes to a timestamped file under the log directory, and
//! warnings and errors are echoed to stderr so they stay visible without
//! interleaving info chatter with the rendered dashboard.

use anyhow::Result;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

/// Maps a level name to a filter. Unknown names fall back to `Info`.
pub fn parse_level(log_level: &str) -> log::LevelFilter {
    match log_level.trim().to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "warn" | "warning" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        "off" => log::LevelFilter::Off,
        _ => log::LevelFilter::Info,
    }
}

/// Sets up logging for `app_name` and returns the path of the new log file.
///
/// Older `{app_name}_*.log` files in `log_dir` are removed first; the newest
/// one is kept.
///
/// # Errors
/// Fails if the directory or file cannot be created, or if a logger is
/// already installed.
pub fn setup_logging(app_name: &str, log_dir: &Path, log_level: &str) -> Result<PathBuf> {
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)?;
    }

    cleanup_old_logs(app_name, log_dir)?;

    let log_file_name = format!("{}_{}.log", app_name, chrono::Local::now().format("%Y-%m-%d_%H-%M-%S"));
    let log_path = log_dir.join(log_file_name);

    let file_sink = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d %H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .chain(fern::log_file(&log_path)?);

    let stderr_sink = fern::Dispatch::new()
        .level(log::LevelFilter::Warn)
        .format(|out, message, record| {
            let level = match record.level() {
                log::Level::Error => "ERROR".red().bold(),
                _ => "WARN".yellow().bold(),
            };
            out.finish(format_args!("{level} {message}"))
        })
        .chain(std::io::stderr());

    fern::Dispatch::new()
        .level(parse_level(log_level))
        // HTTP internals are noise at info.
        .level_for("hyper_util", log::LevelFilter::Warn)
        .level_for("reqwest", log::LevelFilter::Warn)
        .chain(file_sink)
        .chain(stderr_sink)
        .apply()?;

    Ok(log_path)
}

/// Deletes every `{app_name}_*.log` in `log_dir` except the most recent.
pub fn cleanup_old_logs(app_name: &str, log_dir: &Path) -> Result<()> {
    let prefix = format!("{app_name}_");
    let mut entries: Vec<(std::time::SystemTime, PathBuf)> = fs::read_dir(log_dir)?
        .filter_map(|res| res.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "log"))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix))
        })
        .filter_map(|p| {
            let modified = fs::metadata(&p).and_then(|m| m.modified()).ok()?;
            Some((modified, p))
        })
        .collect();

    // Newest first; ties broken by name, which embeds the timestamp.
    entries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

    for (_, path) in entries.iter().skip(1) {
        if let Err(e) = fs::remove_file(path) {
            eprintln!("Failed to delete old log file {:?}: {}", path, e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_are_forgiving() {
        assert_eq!(parse_level("DEBUG"), log::LevelFilter::Debug);
        assert_eq!(parse_level("warning"), log::LevelFilter::Warn);
        assert_eq!(parse_level("verbose"), log::LevelFilter::Info);
    }

    #[test]
    fn cleanup_keeps_the_newest_app_log_only() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("command_center_2024-01-01_00-00-00.log");
        let new = dir.path().join("command_center_2024-01-02_00-00-00.log");
        let other = dir.path().join("unrelated_2024-01-01_00-00-00.log");
        let notes = dir.path().join("command_center_notes.txt");
        for path in [&old, &new, &other, &notes] {
            fs::write(path, "x").unwrap();
        }

        cleanup_old_logs("command_center", dir.path()).unwrap();

        assert!(new.exists());
        assert!(!old.exists());
        assert!(other.exists());
        assert!(notes.exists());
    }
}
