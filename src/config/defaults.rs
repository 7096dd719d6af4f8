//! Built-in defaults (layer 1)
//!
//! Values of a stock local Nexus 3 install.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_HOST: &str = "http://localhost:8081";
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "admin123";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Connection settings for a Nexus server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server root URL, e.g. `http://localhost:8081`
    pub host: String,
    pub username: String,
    pub password: String,
    /// Per-request timeout
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl ClientConfig {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Convert to a JSON object for layering
    pub fn to_layer(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("host".to_string(), Value::from(self.host.as_str()));
        map.insert("username".to_string(), Value::from(self.username.as_str()));
        map.insert("password".to_string(), Value::from(self.password.as_str()));
        map.insert("timeout_seconds".to_string(), Value::from(self.timeout_seconds));
        map
    }
}

/// Contents of a config file; every key is optional, unknown keys are errors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}
