//! Polling record: a single estimation round within a story

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{is_unassigned, Vote};

/// One estimation round; `votes` keeps the server's submission order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Polling {
    #[serde(default, skip_serializing_if = "is_unassigned")]
    pub id: String,
    pub story_id: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub revealed: bool,
    /// Value the round was completed with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub votes: Vec<Vote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Polling {
    pub fn new(id: impl Into<String>, story_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            story_id: story_id.into(),
            ..Default::default()
        }
    }
}
