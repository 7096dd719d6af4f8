//! Effective configuration with provenance
//!
//! Merges defaults, the config file, the environment and CLI flags, and
//! remembers which layer supplied each value.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use super::defaults::{ClientConfig, FileConfig};
use super::merge::{merge_layers, Layer};

pub const ENV_HOST: &str = "NEXUS_HOST";
pub const ENV_USERNAME: &str = "NEXUS_USERNAME";
pub const ENV_PASSWORD: &str = "NEXUS_PASSWORD";
pub const ENV_TIMEOUT_SECONDS: &str = "NEXUS_TIMEOUT_SECONDS";

const REDACTED: &str = "[REDACTED]";

/// Origin of a configuration value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    File,
    Env,
    Cli,
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfigOrigin::Builtin => "builtin",
            ConfigOrigin::File => "file",
            ConfigOrigin::Env => "env",
            ConfigOrigin::Cli => "cli",
        })
    }
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (files only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (files only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl ConfigSource {
    fn of(origin: ConfigOrigin) -> Self {
        Self {
            origin,
            path: None,
            digest: None,
        }
    }
}

/// Which config file to read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigFile {
    /// The per-user default location; skipped when absent
    Default(PathBuf),
    /// A path the user asked for; must exist
    Explicit(PathBuf),
    None,
}

impl ConfigFile {
    /// `--config` if given, else the per-user default location
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        match explicit {
            Some(path) => ConfigFile::Explicit(path),
            None => default_config_path().map_or(ConfigFile::None, ConfigFile::Default),
        }
    }
}

/// `$XDG_CONFIG_HOME/nexus3/config.toml`, falling back to
/// `$HOME/.config/nexus3/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("nexus3").join("config.toml"))
}

/// Values given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl ConfigOverrides {
    fn to_layer(&self) -> Map<String, Value> {
        let mut map = Map::new();
        if let Some(host) = &self.host {
            map.insert("host".to_string(), Value::from(host.as_str()));
        }
        if let Some(username) = &self.username {
            map.insert("username".to_string(), Value::from(username.as_str()));
        }
        if let Some(password) = &self.password {
            map.insert("password".to_string(), Value::from(password.as_str()));
        }
        if let Some(timeout) = self.timeout_seconds {
            map.insert("timeout_seconds".to_string(), Value::from(timeout));
        }
        map
    }
}

/// Resolved client settings plus where each one came from
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub config: ClientConfig,
    /// Winning origin per field
    pub origins: BTreeMap<String, ConfigOrigin>,
    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,
}

impl EffectiveConfig {
    /// Load from the process environment
    pub fn load(file: ConfigFile, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        Self::build(file, std::env::vars(), overrides)
    }

    /// Build from explicit inputs
    pub fn build<I>(file: ConfigFile, env: I, overrides: &ConfigOverrides) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layers = vec![Layer::new(ConfigOrigin::Builtin, ClientConfig::default().to_layer())];
        let mut sources = vec![ConfigSource::of(ConfigOrigin::Builtin)];

        let file_path = match file {
            ConfigFile::Explicit(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path));
                }
                Some(path)
            }
            ConfigFile::Default(path) => path.exists().then_some(path),
            ConfigFile::None => None,
        };

        if let Some(path) = file_path {
            let (values, digest) = load_toml_file(&path)?;
            layers.push(Layer::new(ConfigOrigin::File, values));
            sources.push(ConfigSource {
                origin: ConfigOrigin::File,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            });
        }

        let env_values = env_layer(env)?;
        if !env_values.is_empty() {
            layers.push(Layer::new(ConfigOrigin::Env, env_values));
            sources.push(ConfigSource::of(ConfigOrigin::Env));
        }

        let cli_values = overrides.to_layer();
        if !cli_values.is_empty() {
            layers.push(Layer::new(ConfigOrigin::Cli, cli_values));
            sources.push(ConfigSource::of(ConfigOrigin::Cli));
        }

        let (merged, origins) = merge_layers(&layers);
        let config: ClientConfig = serde_json::from_value(Value::Object(merged)).map_err(|e| {
            ConfigError::Invalid {
                field: "config".to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            config: validate(config)?,
            origins,
            sources,
        })
    }

    /// Origin of the value of `field`
    pub fn origin(&self, field: &str) -> Option<ConfigOrigin> {
        self.origins.get(field).copied()
    }

    /// JSON view with the password redacted
    pub fn redacted(&self) -> Value {
        let field = |name: &str, value: Value| {
            json!({
                "value": value,
                "origin": self.origin(name),
            })
        };

        json!({
            "config": {
                "host": field("host", Value::from(self.config.host.as_str())),
                "username": field("username", Value::from(self.config.username.as_str())),
                "password": field("password", Value::from(REDACTED)),
                "timeout_seconds": field("timeout_seconds", Value::from(self.config.timeout_seconds)),
            },
            "sources": self.sources,
        })
    }

    /// Serialize the redacted view
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.redacted())
    }
}

/// Load and parse a TOML file, returning its values and digest
fn load_toml_file(path: &Path) -> Result<(Map<String, Value>, String), ConfigError> {
    let bytes = fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let digest = hex::encode(Sha256::digest(&bytes));

    let contents = String::from_utf8(bytes).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: format!("Invalid UTF-8: {}", e),
    })?;

    let file: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let values = match serde_json::to_value(file) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };

    Ok((values, digest))
}

/// Settings from `NEXUS_*` variables; empty values are ignored
fn env_layer<I>(env: I) -> Result<Map<String, Value>, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut map = Map::new();
    for (key, value) in env {
        if value.is_empty() {
            continue;
        }
        let field = match key.as_str() {
            ENV_HOST => "host",
            ENV_USERNAME => "username",
            ENV_PASSWORD => "password",
            ENV_TIMEOUT_SECONDS => {
                let seconds: u64 = value.trim().parse().map_err(|_| ConfigError::Invalid {
                    field: "timeout_seconds".to_string(),
                    reason: format!("{} is not a whole number: {}", ENV_TIMEOUT_SECONDS, value),
                })?;
                map.insert("timeout_seconds".to_string(), Value::from(seconds));
                continue;
            }
            _ => continue,
        };
        map.insert(field.to_string(), Value::from(value));
    }
    Ok(map)
}

fn validate(mut config: ClientConfig) -> Result<ClientConfig, ConfigError> {
    if !(config.host.starts_with("http://") || config.host.starts_with("https://")) {
        return Err(ConfigError::Invalid {
            field: "host".to_string(),
            reason: format!("must start with http:// or https://, got {}", config.host),
        });
    }
    config.host = config.host.trim_end_matches('/').to_string();

    if config.timeout_seconds == 0 {
        return Err(ConfigError::Invalid {
            field: "timeout_seconds".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    Ok(config)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: String, reason: String },
}
