//! Procedure registry
//!
//! CRUD and execution of named scripts stored on the server.

use serde_json::Value;

use nexus3_wire::{endpoints, Script, ScriptResult, CONTENT_TYPE_SCRIPT_ARGS};

use crate::client::{ErrorPolicy, NexusClient, StatusMap};
use crate::error::{NexusError, NexusResult};
use crate::transport::HttpRequest;

/// Longest slice of an unreadable error body quoted in a protocol error
const BODY_EXCERPT_CHARS: usize = 200;

impl NexusClient {
    /// Fetch a stored script by name
    pub fn get_script(&self, name: &str) -> NexusResult<Script> {
        require_name(name)?;
        let policy = ErrorPolicy::from(
            StatusMap::new().on(404, NexusError::NotFound, format!("Script {} does not exist", name)),
        );
        self.execute_json(&HttpRequest::get(endpoints::script(name)), &policy)
    }

    /// All stored scripts, in server order
    pub fn list_scripts(&self) -> NexusResult<Vec<Script>> {
        self.execute_json(&HttpRequest::get(endpoints::SCRIPTS), &ErrorPolicy::unmapped())
    }

    /// Store a new script
    ///
    /// Nexus answers a duplicate name with a 500, reported as `AlreadyExists`.
    pub fn create_script(&self, script: &Script) -> NexusResult<()> {
        validate_script(script)?;
        let policy = ErrorPolicy::from(StatusMap::new().on(
            500,
            NexusError::AlreadyExists,
            format!(
                "Script with name {} already exists, use update instead",
                script.name
            ),
        ));
        let request = HttpRequest::post(endpoints::SCRIPTS).with_json(script)?;
        self.execute(&request, &policy)?;
        Ok(())
    }

    /// Replace the content of an existing script
    pub fn update_script(&self, script: &Script) -> NexusResult<()> {
        validate_script(script)?;
        let policy = ErrorPolicy::from(StatusMap::new().on(
            404,
            NexusError::NotFound,
            format!("Script with name {} doesn't exist", script.name),
        ));
        let request = HttpRequest::put(endpoints::script(&script.name)).with_json(script)?;
        self.execute(&request, &policy)?;
        Ok(())
    }

    pub fn delete_script(&self, name: &str) -> NexusResult<()> {
        require_name(name)?;
        let policy = ErrorPolicy::from(
            StatusMap::new().on(404, NexusError::NotFound, format!("Script {} does not exist", name)),
        );
        self.execute(&HttpRequest::delete(endpoints::script(name)), &policy)?;
        Ok(())
    }

    /// Run a stored script
    ///
    /// `args` is sent as JSON text; `None` sends an empty body. When the
    /// script raises, the server answers with a `ScriptResult` whose `result`
    /// holds the exception text; that becomes `NexusError::Execution`.
    pub fn execute_script(&self, name: &str, args: Option<&Value>) -> NexusResult<ScriptResult> {
        require_name(name)?;
        let body = match args {
            Some(args) => serde_json::to_vec(args)?,
            None => Vec::new(),
        };
        let request = HttpRequest::post(endpoints::script_run(name))
            .with_body(body, CONTENT_TYPE_SCRIPT_ARGS);

        match self.execute(&request, &ErrorPolicy::ResponseBody) {
            Ok(body) => serde_json::from_slice(&body).map_err(|e| {
                NexusError::Protocol(format!(
                    "script {} returned an unreadable result: {}",
                    name, e
                ))
            }),
            Err(NexusError::ErrorResponse { status, body }) => {
                Err(execution_error(name, status, &body))
            }
            Err(e) => Err(e),
        }
    }
}

/// Error for a failed run: the engine's exception text when the body is a
/// well-formed result, a protocol error otherwise
fn execution_error(name: &str, status: u16, body: &str) -> NexusError {
    match serde_json::from_str::<ScriptResult>(body) {
        Ok(result) => NexusError::Execution {
            script: name.to_string(),
            message: result.result,
        },
        Err(e) => NexusError::Protocol(format!(
            "script {} failed with status {} and an unreadable body ({}): {}",
            name,
            status,
            e,
            excerpt(body)
        )),
    }
}

fn excerpt(body: &str) -> String {
    if body.chars().count() <= BODY_EXCERPT_CHARS {
        body.to_string()
    } else {
        let cut: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
        format!("{}...", cut)
    }
}

fn require_name(name: &str) -> NexusResult<()> {
    if name.is_empty() {
        return Err(NexusError::InvalidArgument(
            "Script name must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Reject scripts the server would not accept
pub(crate) fn validate_script(script: &Script) -> NexusResult<()> {
    if script.name.is_empty() || script.content.is_empty() {
        return Err(NexusError::InvalidArgument(
            "Script instance must contain a name and content".to_string(),
        ));
    }
    Ok(())
}
