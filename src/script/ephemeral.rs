//! Ephemeral scripts
//!
//! Create a throw-away script under a random name, run it once and delete
//! it again, whatever the outcome of the run.

use serde_json::Value;
use uuid::Uuid;

use nexus3_wire::{Script, ScriptResult, ScriptType};

use crate::client::NexusClient;
use crate::error::NexusResult;

/// Deletes the named script when dropped
///
/// Deletion failures are logged at debug level and otherwise ignored.
pub struct ScriptGuard<'a> {
    client: &'a NexusClient,
    name: String,
}

impl<'a> ScriptGuard<'a> {
    pub fn new(client: &'a NexusClient, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for ScriptGuard<'_> {
    fn drop(&mut self) {
        match self.client.delete_script(&self.name) {
            Ok(()) => tracing::debug!(script = %self.name, "deleted ephemeral script"),
            Err(e) => tracing::debug!(
                script = %self.name,
                error = %e,
                "failed to delete ephemeral script"
            ),
        }
    }
}

/// Script body to run once without keeping it on the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EphemeralScript {
    pub content: String,
    pub kind: ScriptType,
}

impl EphemeralScript {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: ScriptType::Groovy,
        }
    }

    pub fn execute(&self, client: &NexusClient, args: Option<&Value>) -> NexusResult<ScriptResult> {
        client.execute_ephemeral(&self.content, args)
    }
}

impl NexusClient {
    /// Run `content` once under a fresh random name
    ///
    /// If creation fails nothing is left behind; otherwise the script is
    /// deleted after the run, successful or not.
    pub fn execute_ephemeral(&self, content: &str, args: Option<&Value>) -> NexusResult<ScriptResult> {
        let script = Script::groovy(Uuid::new_v4().to_string(), content);
        self.create_script(&script)?;
        tracing::debug!(script = %script.name, "created ephemeral script");

        let _guard = ScriptGuard::new(self, script.name.as_str());
        self.execute_script(&script.name, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::error::NexusError;
    use crate::mock::{FailureConfig, MockNexus, Route};
    use crate::transport::MockTransport;

    fn setup() -> (NexusClient, MockNexus) {
        let server = MockNexus::new();
        let client = NexusClient::new(Arc::new(MockTransport::with_server(server.clone())));
        (client, server)
    }

    #[test]
    fn test_success_deletes_once() {
        let (client, server) = setup();

        let result = client.execute_ephemeral("return 'Hello World'", None).unwrap();

        assert_eq!(result.result, "Hello World");
        assert_eq!(
            server.call_routes(),
            vec![Route::CreateScript, Route::RunScript, Route::DeleteScript]
        );
        assert!(server.script_names().is_empty());
    }

    #[test]
    fn test_name_is_a_uuid() {
        let (client, server) = setup();
        client.execute_ephemeral("return 1", None).unwrap();

        let calls = server.calls();
        let run_path = calls[1].path.trim_end_matches("/run");
        let run_name = run_path.rsplit('/').next().unwrap();
        assert!(Uuid::parse_str(run_name).is_ok());
        assert_eq!(calls[2].path, format!("service/rest/v1/script/{}", run_name));
    }

    #[test]
    fn test_execution_error_still_deletes() {
        let (client, server) = setup();

        let err = client.execute_ephemeral("gah", None).unwrap_err();

        assert!(matches!(err, NexusError::Execution { .. }));
        assert_eq!(server.call_count(Route::DeleteScript), 1);
        assert!(server.script_names().is_empty());
    }

    #[test]
    fn test_create_failure_skips_delete() {
        let (client, server) = setup();
        server.inject_failure(Route::CreateScript, FailureConfig::status(401));

        assert!(client.execute_ephemeral("return 1", None).is_err());
        assert_eq!(server.call_count(Route::RunScript), 0);
        assert_eq!(server.call_count(Route::DeleteScript), 0);
    }

    #[test]
    fn test_delete_failure_is_swallowed() {
        let (client, server) = setup();
        server.inject_failure(Route::DeleteScript, FailureConfig::status(500));

        let result = client.execute_ephemeral("return 7", None).unwrap();
        assert_eq!(result.result, "7");
        assert_eq!(server.call_count(Route::DeleteScript), 1);
    }

    #[test]
    fn test_ephemeral_script_value() {
        let (client, server) = setup();
        let script = EphemeralScript::new("return args");

        let result = script
            .execute(&client, Some(&serde_json::json!(["a", 1])))
            .unwrap();
        assert_eq!(result.result, r#"["a",1]"#);
        assert!(server.script_names().is_empty());
    }
}
