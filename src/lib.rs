//! Nexus 3 Client - Artifact repository client with a script bridge
//!
//! This crate talks to the Sonatype Nexus 3 REST API: repositories, assets,
//! components, upload formats and stored scripts. Blob store management,
//! which Nexus only exposes to Groovy scripts, goes through a bridge that
//! reconciles a local script declaration with the server copy before
//! running it.

pub mod client;
pub mod config;
pub mod error;
pub mod mock;
pub mod paging;
pub mod resources;
pub mod script;
pub mod transport;

pub use client::{ErrorPolicy, NexusClient, StatusMap};
pub use config::{ClientConfig, ConfigError, ConfigFile, ConfigOverrides, EffectiveConfig};
pub use error::{ErrorKind, NexusError, NexusResult};
pub use mock::MockNexus;
pub use paging::{collect_all, traverse, PageRequest};
pub use resources::{ListAssetsInput, ListComponentsInput, UploadAsset, UploadComponentInput};
pub use script::{EphemeralScript, Reconciliation, ScriptGuard, ScriptLocks};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, MockTransport, Transport};

pub use nexus3_wire;
