//! Poker session record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{is_unassigned, Participant, Story};

/// A planning poker session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poker {
    #[serde(default, skip_serializing_if = "is_unassigned")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_story_id: Option<String>,
    /// Comma separated card values offered to voters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_pattern: Option<String>,
    #[serde(default)]
    pub stories: Vec<Story>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Poker {
    pub fn new(id: impl Into<String>, creator: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            creator: creator.into(),
            ..Default::default()
        }
    }
}
