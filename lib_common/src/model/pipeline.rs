//! # Content Pipeline Resource
//!
//! Data structures for `GET /api/content-pipeline`, a map from brand key to
//! that brand's video queue.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Brand key → queue. Keys are kept sorted so rendering order is stable.
pub type Pipeline = BTreeMap<String, PipelineEntry>;

/// # Pipeline Entry
///
/// Queue counts for one brand plus the most recent file names on each side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PipelineEntry {
    /// Display name of the brand.
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub name: String,
    /// Videos waiting to be uploaded.
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub pending: u64,
    /// Videos already published.
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub uploaded: u64,
    /// Videos whose upload failed.
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub failed: u64,
    /// Most recent uploads, newest first.
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub recent_uploaded: Vec<String>,
    /// Next files in the queue.
    #[serde(default, deserialize_with = "crate::model::null_as_default")]
    pub recent_pending: Vec<String>,
}

impl PipelineEntry {
    /// Sum of all three counts. Zero for an empty pipeline.
    pub fn total(&self) -> u64 {
        self.pending + self.uploaded + self.failed
    }

    /// Share of uploaded videos, rounded to the nearest whole percent.
    ///
    /// Always in `0..=100`; an empty queue reports 0.
    pub fn progress_percent(&self) -> u8 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        let pct = (self.uploaded as f64 / total as f64 * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }
}

/// Turns `my_video_title_promo.mp4` into `my video title` for display.
pub fn display_file_name(file: &str) -> String {
    file.replace("_promo.mp4", "").replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(pending: u64, uploaded: u64, failed: u64) -> PipelineEntry {
        PipelineEntry { pending, uploaded, failed, ..Default::default() }
    }

    #[test]
    fn progress_rounds_to_nearest_percent() {
        assert_eq!(entry(2, 5, 1).progress_percent(), 63);
        assert_eq!(entry(0, 1, 2).progress_percent(), 33);
        assert_eq!(entry(0, 3, 0).progress_percent(), 100);
    }

    #[test]
    fn progress_is_zero_for_empty_queue() {
        assert_eq!(entry(0, 0, 0).progress_percent(), 0);
    }

    #[test]
    fn progress_stays_within_bounds() {
        for pending in 0..6 {
            for uploaded in 0..6 {
                for failed in 0..6 {
                    let pct = entry(pending, uploaded, failed).progress_percent();
                    assert!(pct <= 100);
                }
            }
        }
        assert_eq!(entry(u64::MAX / 4, u64::MAX / 4, 0).progress_percent(), 50);
    }

    #[test]
    fn null_counts_and_lists_read_as_empty() {
        let raw = json!({
            "richesse": {
                "name": "Richesse", "pending": null, "uploaded": 4, "failed": null,
                "recent_uploaded": null, "recent_pending": ["next_promo.mp4"]
            }
        });

        let pipeline: Pipeline = serde_json::from_value(raw).unwrap();
        let entry = &pipeline["richesse"];
        assert_eq!(entry.pending, 0);
        assert_eq!(entry.failed, 0);
        assert!(entry.recent_uploaded.is_empty());
        assert_eq!(entry.recent_pending, vec!["next_promo.mp4"]);
        assert_eq!(entry.progress_percent(), 100);
    }

    #[test]
    fn parses_map_with_partial_entries() {
        let raw = json!({
            "techprism": {"name": "TechPrism", "pending": 3},
            "richesse": {
                "name": "Richesse", "pending": 2, "uploaded": 5, "failed": 1,
                "recent_uploaded": ["gold_rush_promo.mp4"],
                "recent_pending": ["next_one_promo.mp4"]
            }
        });
        let pipeline: Pipeline = serde_json::from_value(raw).unwrap();
        let keys: Vec<_> = pipeline.keys().cloned().collect();
        assert_eq!(keys, vec!["richesse", "techprism"]);
        assert_eq!(pipeline["techprism"].uploaded, 0);
        assert_eq!(pipeline["richesse"].recent_uploaded.len(), 1);
    }

    #[test]
    fn file_names_are_prettified() {
        assert_eq!(display_file_name("gold_rush_promo.mp4"), "gold rush");
        assert_eq!(display_file_name("plain.mp4"), "plain.mp4");
    }
}
