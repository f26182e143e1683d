//! # Runnable Tasks
//!
//! The closed set of task ids `POST /api/run/{taskId}` accepts, plus the
//! lookups the dashboard uses to turn a bot name or a brand key into a task.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// # Task Id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskId {
    /// Schedules social posts across brands.
    SocialOrchestrator,
    /// Uploads rendered videos to social platforms.
    SocialUploader,
    /// Plans the next KDP book batch.
    KdpOrchestrator,
    /// Publishes finished books to KDP.
    KdpUploader,
    /// Generates a video batch for Richesse.
    BatchRichesse,
    /// Generates a video batch for Heritage.
    BatchHeritage,
    /// Generates a video batch for TechPrism.
    BatchTechprism,
}

impl TaskId {
    /// Every known task, in API documentation order.
    pub const ALL: [TaskId; 7] = [
        TaskId::SocialOrchestrator,
        TaskId::SocialUploader,
        TaskId::KdpOrchestrator,
        TaskId::KdpUploader,
        TaskId::BatchRichesse,
        TaskId::BatchHeritage,
        TaskId::BatchTechprism,
    ];

    /// The id as it appears in the URL.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskId::SocialOrchestrator => "social_orchestrator",
            TaskId::SocialUploader => "social_uploader",
            TaskId::KdpOrchestrator => "kdp_orchestrator",
            TaskId::KdpUploader => "kdp_uploader",
            TaskId::BatchRichesse => "batch_richesse",
            TaskId::BatchHeritage => "batch_heritage",
            TaskId::BatchTechprism => "batch_techprism",
        }
    }

    /// The task behind a bot's RUN button. Bots without one return `None`.
    pub fn for_bot(bot_name: &str) -> Option<Self> {
        match bot_name {
            "Social Orchestrator" => Some(TaskId::SocialOrchestrator),
            "Social Uploader" | "Multi-Brand Uploader" => Some(TaskId::SocialUploader),
            "KDP Orchestrator" => Some(TaskId::KdpOrchestrator),
            "KDP Uploader" => Some(TaskId::KdpUploader),
            _ => None,
        }
    }

    /// The batch task behind a pipeline card's Generate button.
    pub fn batch_for_brand(brand_key: &str) -> Option<Self> {
        match brand_key {
            "richesse" => Some(TaskId::BatchRichesse),
            "heritage" => Some(TaskId::BatchHeritage),
            "techprism" => Some(TaskId::BatchTechprism),
            _ => None,
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskId::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown task id '{s}'"))
    }
}
