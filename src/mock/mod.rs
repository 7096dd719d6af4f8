//! Mock Nexus Implementation
//!
//! In-process Nexus 3 server for testing the client without a network.
//! Supports every endpoint the client uses, with failure injection for
//! testing error paths.
//!
//! # Endpoints
//!
//! - `status`: always healthy unless a failure is injected
//! - `script`: list, create, get, update, delete and run; duplicate creates
//!   answer 500 like Nexus does
//! - `repositories`, `assets`, `components`: paginated by continuation token
//! - `formats`: upload specs (`raw` is preinstalled)
//! - `blobstores/{id}/quota-status`
//! - `repository/{repo}/{path}`: asset downloads
//!
//! Scripts run through a small engine: registered handlers first, then the
//! blob store scripts, then one-line `return`/`throw` forms.

mod failure;
mod server;
mod state;

pub use failure::{FailureConfig, FailureInjector, Route};
pub use server::{MockNexus, ScriptHandler, MOCK_BASE_URL};
pub use state::{CallRecord, MockState, UploadRecord};
