//! Query DTOs for the entity services

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attribute/value equality filter sent with a `query` request.
/// `attr` is the field name as it appears on the wire (`pokerId`, `storyId`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub attr: String,
    pub value: Value,
}

impl QueryFilter {
    pub fn new(attr: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            attr: attr.into(),
            value: value.into(),
        }
    }
}

/// Result of a `query` request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRead<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub metadata: QueryMetadata,
}

/// Echo of the filters the server applied
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryMetadata {
    #[serde(default)]
    pub filters: Vec<QueryFilter>,
}

/// Options for `EntityCache::query`
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions {
    /// Replace the local collection with the result
    pub save: bool,
}

impl QueryOptions {
    /// Options that store the result as the new collection
    pub fn save() -> Self {
        Self { save: true }
    }
}
