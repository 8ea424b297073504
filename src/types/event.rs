//! Poker event records
//!
//! Events are the timeline of a story: votes, comments, actions and the
//! complete/restart markers emitted when a polling round changes state.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::is_unassigned;

/// Kind of entry on a story's timeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PokerEventKind {
    /// A participant submitted a vote
    Vote,
    /// Free text comment
    #[default]
    Comment,
    /// Moderator action (reveal, select story, ...)
    Action,
    /// A polling round was completed
    Complete,
    /// A polling round was restarted
    Restart,
    /// Kind introduced by a newer server
    #[serde(other)]
    Unknown,
}

impl fmt::Display for PokerEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PokerEventKind::Vote => write!(f, "vote"),
            PokerEventKind::Comment => write!(f, "comment"),
            PokerEventKind::Action => write!(f, "action"),
            PokerEventKind::Complete => write!(f, "complete"),
            PokerEventKind::Restart => write!(f, "restart"),
            PokerEventKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// A timeline entry tied to a story
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PokerEvent {
    #[serde(default, skip_serializing_if = "is_unassigned")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PokerEventKind,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub creator: String,
    /// Whether the vote content is visible to everyone yet
    #[serde(default)]
    pub revealed: bool,
    pub story_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PokerEvent {
    pub fn new(id: impl Into<String>, story_id: impl Into<String>, kind: PokerEventKind) -> Self {
        Self {
            id: id.into(),
            story_id: story_id.into(),
            kind,
            ..Default::default()
        }
    }

    /// Builder-style setter for the reveal flag
    pub fn revealed(mut self, revealed: bool) -> Self {
        self.revealed = revealed;
        self
    }

    pub fn is_vote(&self) -> bool {
        self.kind == PokerEventKind::Vote
    }
}
