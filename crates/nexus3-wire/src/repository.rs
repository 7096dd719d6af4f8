//! Repository records.

use serde::{Deserialize, Serialize};

/// A repository as listed by `GET /repositories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    /// Repository format (maven2, npm, raw, ...).
    pub format: String,
    /// hosted, proxy or group.
    #[serde(rename = "type")]
    pub repo_type: String,
    pub url: String,
}
