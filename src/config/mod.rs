//! Configuration merge system
//!
//! Implements the 4-layer configuration merge:
//! 1. Built-in defaults
//! 2. User config file (~/.config/nexus3/config.toml or --config)
//! 3. Environment (NEXUS_HOST, NEXUS_USERNAME, NEXUS_PASSWORD, NEXUS_TIMEOUT_SECONDS)
//! 4. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::{
    ClientConfig, FileConfig, DEFAULT_HOST, DEFAULT_PASSWORD, DEFAULT_TIMEOUT_SECONDS,
    DEFAULT_USERNAME,
};
pub use effective::{
    default_config_path, ConfigError, ConfigFile, ConfigOrigin, ConfigOverrides, ConfigSource,
    EffectiveConfig,
};
pub use merge::{merge_layers, Layer};
