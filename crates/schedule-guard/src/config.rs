//! Repository configuration.

use serde::{Deserialize, Serialize};

/// Collection holding schedule documents unless configured otherwise.
pub const DEFAULT_COLLECTION: &str = "schedules";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Name of the collection schedules are read from and written to.
    pub collection: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl RepositoryConfig {
    pub fn with_collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
        }
    }
}
