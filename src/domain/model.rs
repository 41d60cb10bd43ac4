use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata the remote store reports for a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInfo {
    pub key: String,
    pub modified: DateTime<Utc>,
    pub size: i64,
    /// A leaf entry rather than a directory-like prefix.
    pub is_terminal: bool,
}
