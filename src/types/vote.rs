//! Vote record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::is_unassigned;

/// One participant's submitted value for a polling
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    #[serde(default, skip_serializing_if = "is_unassigned")]
    pub id: String,
    pub polling_id: String,
    pub participant_id: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Vote {
    pub fn new(
        id: impl Into<String>,
        polling_id: impl Into<String>,
        participant_id: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            polling_id: polling_id.into(),
            participant_id: participant_id.into(),
            value: value.into(),
            ..Default::default()
        }
    }
}
