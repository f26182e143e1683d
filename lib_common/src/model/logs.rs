//! # Log Feed Resource
//!
//! `GET /api/logs` returns `{"logs": [...]}` with the most recent line last.
//! Older backends send bare strings, newer ones may send `{level, message}`
//! objects. Both are accepted; bare strings are classified exactly once, here,
//! so the renderer only ever matches on `LogLevel`.

use serde::{Deserialize, Serialize};

/// # Log Level
///
/// Display class of a backend log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// A failure.
    Error,
    /// Something suspicious.
    Warning,
    /// A completed step.
    Success,
    /// A bot actively producing or scraping.
    Activity,
    /// Daemon lifecycle chatter.
    Daemon,
    /// Everything else.
    #[default]
    Info,
}

impl LogLevel {
    /// Classifies a raw log line. First matching rule wins.
    pub fn classify(line: &str) -> Self {
        if line.contains("ERROR") || line.contains("Error") {
            LogLevel::Error
        } else if line.contains("WARNING") {
            LogLevel::Warning
        } else if line.contains('✅') {
            LogLevel::Success
        } else if ["Generating", "Scraping", "TRIGGERING"]
            .iter()
            .any(|needle| line.contains(needle))
        {
            LogLevel::Activity
        } else if line.contains("Daemon") {
            LogLevel::Daemon
        } else {
            LogLevel::Info
        }
    }
}

/// # Log Entry
///
/// One line of the backend log feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawLogEntry")]
pub struct LogEntry {
    /// Display class.
    pub level: LogLevel,
    /// The line as the backend wrote it.
    pub message: String,
}

impl LogEntry {
    /// Builds an entry from a bare line, classifying it.
    pub fn from_line(line: impl Into<String>) -> Self {
        let message = line.into();
        Self { level: LogLevel::classify(&message), message }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLogEntry {
    Line(String),
    Structured {
        level: Option<LogLevel>,
        message: String,
    },
}

impl From<RawLogEntry> for LogEntry {
    fn from(raw: RawLogEntry) -> Self {
        match raw {
            RawLogEntry::Line(line) => LogEntry::from_line(line),
            RawLogEntry::Structured { level: Some(level), message } => LogEntry { level, message },
            RawLogEntry::Structured { level: None, message } => LogEntry::from_line(message),
        }
    }
}

/// Body of `GET /api/logs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LogsResponse {
    /// Log lines, oldest first.
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub logs: Vec<LogEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classification_follows_rule_order() {
        assert_eq!(LogLevel::classify("ERROR: upload failed"), LogLevel::Error);
        assert_eq!(LogLevel::classify("Error while Generating"), LogLevel::Error);
        assert_eq!(LogLevel::classify("WARNING quota low"), LogLevel::Warning);
        assert_eq!(LogLevel::classify("✅ uploaded clip"), LogLevel::Success);
        assert_eq!(LogLevel::classify("TRIGGERING batch"), LogLevel::Activity);
        assert_eq!(LogLevel::classify("Scraping feed"), LogLevel::Activity);
        assert_eq!(LogLevel::classify("Daemon started"), LogLevel::Daemon);
        assert_eq!(LogLevel::classify("heartbeat"), LogLevel::Info);
    }

    #[test]
    fn accepts_bare_and_structured_lines() {
        let resp: LogsResponse = serde_json::from_value(json!({
            "logs": [
                "WARNING disk 90%",
                {"level": "success", "message": "done"},
                {"message": "Daemon restarted"}
            ]
        }))
        .unwrap();
        let levels: Vec<_> = resp.logs.iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![LogLevel::Warning, LogLevel::Success, LogLevel::Daemon]);
        assert_eq!(resp.logs[1].message, "done");
    }
}
