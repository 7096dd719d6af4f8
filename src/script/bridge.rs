//! Script reconciliation bridge
//!
//! Makes the server's copy of a named script match the local declaration,
//! then runs it. Blob store operations go through here because Nexus has no
//! REST API for them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use nexus3_wire::{Script, ScriptResult};

use crate::client::NexusClient;
use crate::error::{NexusError, NexusResult};

use super::registry::validate_script;

/// What reconciliation had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Created,
    Updated,
    Unchanged,
}

/// Per-name locks serializing reconcile-and-run within one client
#[derive(Debug, Clone, Default)]
pub struct ScriptLocks {
    table: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl ScriptLocks {
    /// Lock shared by every caller using `name`
    pub fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        table
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Hand back a lock from `lock_for`; the entry is dropped once no other
    /// caller holds it
    pub fn release(&self, name: &str, lock: Arc<Mutex<()>>) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        let idle = table
            .get(name)
            .is_some_and(|entry| Arc::ptr_eq(entry, &lock) && Arc::strong_count(&lock) == 2);
        if idle {
            table.remove(name);
        }
    }

    /// Number of names with a live entry
    pub fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NexusClient {
    /// Make sure the server holds `desired` exactly, then run it
    ///
    /// A missing script is created and a drifted one is updated. Calls for
    /// the same name through this client (or its clones) are serialized.
    pub fn ensure_and_execute(
        &self,
        desired: &Script,
        args: Option<&Value>,
    ) -> NexusResult<ScriptResult> {
        let lock = self.script_locks().lock_for(&desired.name);
        let outcome = {
            let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.reconcile_script(desired)
                .and_then(|_| self.execute_script(&desired.name, args))
        };
        self.script_locks().release(&desired.name, lock);
        outcome
    }

    /// Bring the server's copy of `desired.name` in line with `desired`
    pub fn reconcile_script(&self, desired: &Script) -> NexusResult<Reconciliation> {
        validate_script(desired)?;

        let current = match self.get_script(&desired.name) {
            Ok(script) => script,
            Err(NexusError::NotFound(_)) => match self.create_script(desired) {
                Ok(()) => {
                    tracing::debug!(script = %desired.name, "created script");
                    return Ok(Reconciliation::Created);
                }
                // Another process created it between our get and create
                Err(NexusError::AlreadyExists(_)) => {
                    tracing::debug!(script = %desired.name, "script appeared concurrently, re-reading");
                    self.get_script(&desired.name)?
                }
                Err(e) => return Err(e),
            },
            Err(e) => return Err(e),
        };

        if current.content == desired.content {
            tracing::debug!(script = %desired.name, "script unchanged");
            return Ok(Reconciliation::Unchanged);
        }

        self.update_script(desired)?;
        tracing::debug!(script = %desired.name, "updated drifted script");
        Ok(Reconciliation::Updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::mock::{FailureConfig, MockNexus, Route};
    use crate::transport::MockTransport;

    fn setup() -> (NexusClient, MockNexus) {
        let server = MockNexus::new();
        let client = NexusClient::new(Arc::new(MockTransport::with_server(server.clone())));
        (client, server)
    }

    #[test]
    fn test_missing_script_is_created_then_run() {
        let (client, server) = setup();

        let result = client
            .ensure_and_execute(&Script::groovy("p1", "return 1"), None)
            .unwrap();

        assert_eq!(result.name, "p1");
        assert_eq!(result.result, "1");
        assert_eq!(
            server.call_routes(),
            vec![Route::GetScript, Route::CreateScript, Route::RunScript]
        );
    }

    #[test]
    fn test_reconciliation_is_idempotent() {
        let (client, server) = setup();
        let script = Script::groovy("p1", "return 1");

        client.ensure_and_execute(&script, None).unwrap();
        client.ensure_and_execute(&script, None).unwrap();

        assert_eq!(server.call_count(Route::CreateScript), 1);
        assert_eq!(server.call_count(Route::UpdateScript), 0);
        assert_eq!(server.call_count(Route::RunScript), 2);
    }

    #[test]
    fn test_drift_triggers_single_update() {
        let (client, server) = setup();
        server.put_script(Script::groovy("p1", "return 1"));

        let result = client
            .ensure_and_execute(&Script::groovy("p1", "return 2"), None)
            .unwrap();

        assert_eq!(result.result, "2");
        assert_eq!(server.call_count(Route::UpdateScript), 1);
        assert_eq!(server.call_count(Route::CreateScript), 0);
        assert_eq!(server.script("p1").unwrap().content, "return 2");
    }

    #[test]
    fn test_reconcile_reports_action() {
        let (client, _server) = setup();
        let v1 = Script::groovy("p", "return 1");
        let v2 = Script::groovy("p", "return 1 ");

        assert_eq!(client.reconcile_script(&v1).unwrap(), Reconciliation::Created);
        assert_eq!(client.reconcile_script(&v1).unwrap(), Reconciliation::Unchanged);
        assert_eq!(client.reconcile_script(&v2).unwrap(), Reconciliation::Updated);
    }

    #[test]
    fn test_concurrent_create_is_absorbed() {
        let (client, server) = setup();
        // The server says "missing" once, but the name is already taken
        server.put_script(Script::groovy("p1", "return 1"));
        server.inject_failure(Route::GetScript, FailureConfig::status(404).with_fail_count(1));

        let result = client
            .ensure_and_execute(&Script::groovy("p1", "return 1"), None)
            .unwrap();

        assert_eq!(result.result, "1");
        assert_eq!(server.call_count(Route::GetScript), 2);
        assert_eq!(server.call_count(Route::UpdateScript), 0);
    }

    #[test]
    fn test_get_failure_propagates() {
        let (client, server) = setup();
        server.inject_failure(Route::GetScript, FailureConfig::status(403));

        let err = client
            .ensure_and_execute(&Script::groovy("p1", "return 1"), None)
            .unwrap_err();

        assert!(matches!(err, NexusError::UnexpectedStatus { status: 403, .. }));
        assert_eq!(server.call_count(Route::CreateScript), 0);
    }

    #[test]
    fn test_create_failure_propagates() {
        let (client, server) = setup();
        server.inject_failure(Route::CreateScript, FailureConfig::status(401));

        let err = client
            .ensure_and_execute(&Script::groovy("p1", "return 1"), None)
            .unwrap_err();

        assert!(matches!(err, NexusError::UnexpectedStatus { status: 401, .. }));
        assert_eq!(server.call_count(Route::RunScript), 0);
    }

    #[test]
    fn test_execution_error_after_reconcile() {
        let (client, _server) = setup();

        let err = client
            .ensure_and_execute(&Script::groovy("bad", "gah"), None)
            .unwrap_err();

        assert!(matches!(err, NexusError::Execution { .. }));
        assert!(err.to_string().contains("No such property: gah"));
    }

    #[test]
    fn test_lock_entries_released_after_run() {
        let (client, _server) = setup();

        for name in ["a", "b", "c"] {
            client
                .ensure_and_execute(&Script::groovy(name, "return 1"), None)
                .unwrap();
        }
        client
            .ensure_and_execute(&Script::groovy("bad", "gah"), None)
            .unwrap_err();

        assert!(client.script_locks().is_empty());
    }

    #[test]
    fn test_release_keeps_entry_while_held_elsewhere() {
        let locks = ScriptLocks::default();
        let first = locks.lock_for("p");
        let second = locks.lock_for("p");

        locks.release("p", first);
        assert_eq!(locks.len(), 1);

        locks.release("p", second);
        assert!(locks.is_empty());
    }

    #[test]
    fn test_locks_are_shared_per_name() {
        let locks = ScriptLocks::default();
        let a = locks.lock_for("a");
        let a_again = locks.clone().lock_for("a");
        let b = locks.lock_for("b");

        assert!(Arc::ptr_eq(&a, &a_again));
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
