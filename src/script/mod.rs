//! Server-side scripts
//!
//! - registry: get/create/update/delete/list/run of named scripts
//! - bridge: reconcile a local declaration with the server copy, then run
//! - ephemeral: create, run and always delete a one-off script

mod bridge;
mod ephemeral;
mod registry;

pub use bridge::{Reconciliation, ScriptLocks};
pub use ephemeral::{EphemeralScript, ScriptGuard};
