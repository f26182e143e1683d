//! # Status Resource
//!
//! Data structures for `GET /api/status`: the tracked brands, the background
//! bots and the system-wide status line.
//!
//! Status labels arrive as free text. They are mapped onto enums with an
//! explicit `Other` arm so an unexpected label is preserved verbatim and
//! rendered in the default style rather than guessed into a known state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// # Brand Status
///
/// Reachability of a monitored brand site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BrandStatus {
    /// The site answered its last health probe.
    Online,
    /// The site is known to be down.
    Offline,
    /// Any label the backend sends that is not recognised. Counts as offline.
    Other(String),
}

impl BrandStatus {
    /// Only `online` / `ONLINE` count as online; everything else is offline.
    pub fn is_online(&self) -> bool {
        matches!(self, BrandStatus::Online)
    }
}

impl Default for BrandStatus {
    fn default() -> Self {
        BrandStatus::Offline
    }
}

impl From<String> for BrandStatus {
    fn from(label: String) -> Self {
        match label.as_str() {
            "online" | "ONLINE" => BrandStatus::Online,
            "offline" | "OFFLINE" => BrandStatus::Offline,
            _ => BrandStatus::Other(label),
        }
    }
}

impl From<BrandStatus> for String {
    fn from(status: BrandStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for BrandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrandStatus::Online => f.write_str("online"),
            BrandStatus::Offline => f.write_str("offline"),
            BrandStatus::Other(label) => f.write_str(label),
        }
    }
}

/// # Brand
///
/// One monitored external site. Identity is `id`, which is also the key used
/// by the content pipeline resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Brand {
    /// Stable brand key (e.g. `richesse`).
    pub id: String,
    /// Display name.
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub name: String,
    /// Bare domain, without scheme.
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub url: String,
    /// Last known reachability.
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub status: BrandStatus,
    /// Number of live affiliate links on the site.
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub active_links: u64,
    /// Queue counts the status resource may embed. Second tier of the
    /// brand-card count fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<u64>,
    /// See `pending`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded: Option<u64>,
    /// See `pending`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed: Option<u64>,
}

impl Brand {
    /// Shorthand for `self.status.is_online()`.
    pub fn is_online(&self) -> bool {
        self.status.is_online()
    }

    /// The site URL with an `https://` scheme, as linked from the brand card.
    pub fn site_url(&self) -> String {
        if self.url.starts_with("http://") || self.url.starts_with("https://") {
            self.url.clone()
        } else {
            format!("https://{}", self.url)
        }
    }
}

/// # Bot Status
///
/// Coarse activity label of a background bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BotStatus {
    /// Not doing anything.
    Idle,
    /// Producing content.
    Generating,
    /// Collecting source material.
    Scraping,
    /// Releasing queued content on a schedule.
    DripFeeding,
    /// Unrecognised label, rendered dim.
    Other(String),
}

impl BotStatus {
    /// A bot is "generating" while it is producing, scraping or drip-feeding.
    pub fn is_generating(&self) -> bool {
        matches!(
            self,
            BotStatus::Generating | BotStatus::Scraping | BotStatus::DripFeeding
        )
    }
}

impl Default for BotStatus {
    fn default() -> Self {
        BotStatus::Idle
    }
}

impl From<String> for BotStatus {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Idle" => BotStatus::Idle,
            "Generating" => BotStatus::Generating,
            "Scraping" => BotStatus::Scraping,
            "Drip-Feeding" => BotStatus::DripFeeding,
            _ => BotStatus::Other(label),
        }
    }
}

impl From<BotStatus> for String {
    fn from(status: BotStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for BotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotStatus::Idle => f.write_str("Idle"),
            BotStatus::Generating => f.write_str("Generating"),
            BotStatus::Scraping => f.write_str("Scraping"),
            BotStatus::DripFeeding => f.write_str("Drip-Feeding"),
            BotStatus::Other(label) => f.write_str(label),
        }
    }
}

/// # Bot
///
/// A named background task. The bots list is replaced wholesale on every
/// poll, so a bot has no identity beyond its name within one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Bot {
    /// Display name, also used to look up a runnable task.
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub name: String,
    /// Current activity.
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub status: BotStatus,
}

impl Bot {
    /// Shorthand for `self.status.is_generating()`.
    pub fn is_generating(&self) -> bool {
        self.status.is_generating()
    }
}

/// # System Status
///
/// The one-line health summary shown in the side panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SystemStatus {
    /// No status response has arrived yet.
    Checking,
    /// Backend reports everything healthy.
    AllClear,
    /// The status fetch failed.
    Offline,
    /// No local backend is configured for this deployment.
    RemoteView,
    /// Free-text status from the backend.
    Other(String),
}

impl Default for SystemStatus {
    fn default() -> Self {
        SystemStatus::Checking
    }
}

impl From<String> for SystemStatus {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Checking..." | "Checking" => SystemStatus::Checking,
            "All Clear" => SystemStatus::AllClear,
            "Offline" => SystemStatus::Offline,
            "Remote View" => SystemStatus::RemoteView,
            _ => SystemStatus::Other(label),
        }
    }
}

impl From<SystemStatus> for String {
    fn from(status: SystemStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemStatus::Checking => f.write_str("Checking..."),
            SystemStatus::AllClear => f.write_str("All Clear"),
            SystemStatus::Offline => f.write_str("Offline"),
            SystemStatus::RemoteView => f.write_str("Remote View"),
            SystemStatus::Other(text) => f.write_str(text),
        }
    }
}

/// # Status Snapshot
///
/// Body of `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StatusSnapshot {
    /// Monitored brands, in display order.
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub brands: Vec<Brand>,
    /// Background bots, in display order.
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub bots: Vec<Bot>,
    /// System status line.
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub system_status: SystemStatus,
    /// Videos waiting in all queues.
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub pending_videos: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_full_status_document() {
        let raw = json!({
            "brands": [
                {"id": "richesse", "name": "Richesse", "url": "richesse.example", "status": "ONLINE", "active_links": 12, "pending": 9},
                {"id": "heritage", "name": "Heritage", "url": "heritage.example", "status": "down", "active_links": 3}
            ],
            "bots": [
                {"name": "Social Orchestrator", "status": "Drip-Feeding"},
                {"name": "KDP Uploader", "status": "Sleeping"}
            ],
            "system_status": "All Clear",
            "pending_videos": 4
        });

        let snap: StatusSnapshot = serde_json::from_value(raw).unwrap();
        assert_eq!(snap.brands.len(), 2);
        assert!(snap.brands[0].is_online());
        assert_eq!(snap.brands[0].pending, Some(9));
        assert_eq!(snap.brands[1].status, BrandStatus::Other("down".into()));
        assert!(!snap.brands[1].is_online());
        assert!(snap.bots[0].is_generating());
        assert_eq!(snap.bots[1].status, BotStatus::Other("Sleeping".into()));
        assert!(!snap.bots[1].is_generating());
        assert_eq!(snap.system_status, SystemStatus::AllClear);
        assert_eq!(snap.pending_videos, 4);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let snap: StatusSnapshot = serde_json::from_value(json!({})).unwrap();
        assert!(snap.brands.is_empty());
        assert!(snap.bots.is_empty());
        assert_eq!(snap.system_status, SystemStatus::Checking);
        assert_eq!(snap.pending_videos, 0);
    }

    #[test]
    fn null_fields_read_as_missing() {
        let raw = json!({
            "brands": [
                {"id": "richesse", "name": null, "url": null, "status": "online", "active_links": null, "pending": null}
            ],
            "bots": [{"name": "KDP Uploader", "status": null}],
            "system_status": "All Clear",
            "pending_videos": null
        });

        let snap: StatusSnapshot = serde_json::from_value(raw).unwrap();
        assert_eq!(snap.pending_videos, 0);
        assert_eq!(snap.system_status, SystemStatus::AllClear);
        assert_eq!(snap.brands[0].name, "");
        assert_eq!(snap.brands[0].active_links, 0);
        assert_eq!(snap.brands[0].pending, None);
        assert!(snap.brands[0].is_online());
        assert_eq!(snap.bots[0].status, BotStatus::Idle);

        let empty: StatusSnapshot =
            serde_json::from_value(json!({"brands": null, "bots": null, "system_status": null})).unwrap();
        assert_eq!(empty, StatusSnapshot::default());
    }

    #[test]
    fn only_lower_and_upper_online_count_as_online() {
        assert!(BrandStatus::from("online".to_string()).is_online());
        assert!(BrandStatus::from("ONLINE".to_string()).is_online());
        assert!(!BrandStatus::from("Online".to_string()).is_online());
        assert!(!BrandStatus::from("offline".to_string()).is_online());
    }

    #[test]
    fn generating_covers_scraping_and_drip_feeding() {
        for label in ["Generating", "Scraping", "Drip-Feeding"] {
            assert!(BotStatus::from(label.to_string()).is_generating(), "{label}");
        }
        assert!(!BotStatus::Idle.is_generating());
        assert_eq!(BotStatus::DripFeeding.to_string(), "Drip-Feeding");
    }

    #[test]
    fn site_url_adds_scheme_once() {
        let mut brand = Brand { url: "techprism.example".into(), ..Default::default() };
        assert_eq!(brand.site_url(), "https://techprism.example");
        brand.url = "https://techprism.example".into();
        assert_eq!(brand.site_url(), "https://techprism.example");
    }
}
