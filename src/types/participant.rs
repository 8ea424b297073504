//! Participant record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::is_unassigned;

/// A member of a poker session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(default, skip_serializing_if = "is_unassigned")]
    pub id: String,
    pub name: String,
    pub poker_id: String,
    /// Socket session the participant last joined from
    #[serde(default)]
    pub sid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Participant {
    pub fn new(id: impl Into<String>, poker_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            poker_id: poker_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}
