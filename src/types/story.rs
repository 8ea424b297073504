//! Story record: one estimation item inside a poker

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{is_unassigned, PokerEvent, Polling};

/// An estimation item, ordered within its poker by `order`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    #[serde(default, skip_serializing_if = "is_unassigned")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Final estimate, once agreed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Server-assigned position; authoritative for display order
    #[serde(default)]
    pub order: i64,
    pub poker_id: String,
    #[serde(default)]
    pub events: Vec<PokerEvent>,
    #[serde(default)]
    pub pollings: Vec<Polling>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Story {
    pub fn new(id: impl Into<String>, poker_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            poker_id: poker_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style setter for the display order
    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }
}
