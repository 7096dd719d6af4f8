//! Asset and component records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A stored file and its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    /// Absolute URL the asset can be downloaded from.
    pub download_url: String,
    pub path: String,
    pub repository: String,
    pub format: String,
    /// Digests keyed by algorithm (`sha1`, `md5`, `sha256`, ...).
    #[serde(default)]
    pub checksum: BTreeMap<String, String>,
}

impl Asset {
    /// Hex digest for the given algorithm, if the server reported one.
    pub fn checksum(&self, algorithm: &str) -> Option<&str> {
        self.checksum.get(algorithm).map(String::as_str)
    }
}

/// A versioned artifact made of one or more assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    pub repository: String,
    pub format: String,
    #[serde(default)]
    pub group: Option<String>,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}
