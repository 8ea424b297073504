//! Entity trait shared by every cached record

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A server-owned record with a stable unique identifier
///
/// The cache layer only relies on the identifier; referential integrity
/// between kinds is maintained by the server.
pub trait Entity: Debug + Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Stable unique identifier
    fn id(&self) -> &str;
}

/// Minimal payload of a `{kind}_deleted` push: only the identifier is needed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
}

impl EntityRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}
