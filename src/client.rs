//! Nexus Client
//!
//! Owns the transport and turns raw HTTP responses into typed results.
//! Resource operations live in `script` and `resources` as further
//! `impl NexusClient` blocks.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::{NexusError, NexusResult};
use crate::script::ScriptLocks;
use crate::transport::{HttpRequest, HttpTransport, Transport};
use nexus3_wire::endpoints;

/// Per-call mapping from HTTP status to a typed error with a fixed message
#[derive(Debug, Clone, Default)]
pub struct StatusMap {
    entries: Vec<(u16, fn(String) -> NexusError, String)>,
}

impl StatusMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `status` to `error(message)`
    pub fn on(mut self, status: u16, error: fn(String) -> NexusError, message: impl Into<String>) -> Self {
        self.entries.push((status, error, message.into()));
        self
    }

    fn lookup(&self, status: u16) -> Option<NexusError> {
        self.entries
            .iter()
            .find(|(code, _, _)| *code == status)
            .map(|(_, error, message)| error(message.clone()))
    }
}

/// What a non-2xx response turns into
#[derive(Debug, Clone)]
pub enum ErrorPolicy {
    /// Mapped through the status map; unmapped statuses become
    /// `NexusError::UnexpectedStatus`
    StatusMap(StatusMap),
    /// The response body itself becomes the error (`NexusError::ErrorResponse`)
    ResponseBody,
}

impl ErrorPolicy {
    /// Status map with no entries; every failure is `UnexpectedStatus`
    pub fn unmapped() -> Self {
        ErrorPolicy::StatusMap(StatusMap::new())
    }
}

impl From<StatusMap> for ErrorPolicy {
    fn from(map: StatusMap) -> Self {
        ErrorPolicy::StatusMap(map)
    }
}

/// Nexus 3 client
///
/// Cheap to clone; clones share the transport and the script lock table.
#[derive(Clone)]
pub struct NexusClient {
    transport: Arc<dyn Transport>,
    script_locks: ScriptLocks,
}

impl NexusClient {
    /// Create a client over an existing transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            script_locks: ScriptLocks::default(),
        }
    }

    /// Build an HTTP client for `config` and ping the server
    ///
    /// Fails when the server is unreachable or rejects the credentials.
    pub fn connect(config: &ClientConfig) -> NexusResult<Self> {
        let transport = HttpTransport::new(config)?;
        let client = Self::new(Arc::new(transport));
        client.status()?;
        Ok(client)
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Server root URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    pub(crate) fn script_locks(&self) -> &ScriptLocks {
        &self.script_locks
    }

    /// Ping the server
    ///
    /// The status endpoint answers non-200 when the server cannot serve
    /// requests or the credentials are invalid.
    pub fn status(&self) -> NexusResult<()> {
        let response = self.transport.send(&HttpRequest::get(endpoints::STATUS))?;
        if response.status != 200 {
            return Err(NexusError::Unavailable(
                "Credentials are invalid or Nexus is unable to serve requests".to_string(),
            ));
        }
        Ok(())
    }

    /// Send a request and return the body of a 2xx response
    pub fn execute(&self, request: &HttpRequest, policy: &ErrorPolicy) -> NexusResult<Vec<u8>> {
        let response = self.transport.send(request)?;

        if response.is_success() {
            return Ok(response.body);
        }

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status = response.status,
            "request failed"
        );

        Err(match policy {
            ErrorPolicy::ResponseBody => NexusError::ErrorResponse {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            },
            ErrorPolicy::StatusMap(map) => {
                map.lookup(response.status)
                    .unwrap_or_else(|| NexusError::UnexpectedStatus {
                        method: request.method.to_string(),
                        url: request
                            .url(self.base_url())
                            .map(|url| url.to_string())
                            .unwrap_or_else(|_| format!("{}/{}", self.base_url(), request.path)),
                        status: response.status,
                    })
            }
        })
    }

    /// `execute` and decode the body as JSON
    pub(crate) fn execute_json<T: DeserializeOwned>(
        &self,
        request: &HttpRequest,
        policy: &ErrorPolicy,
    ) -> NexusResult<T> {
        let body = self.execute(request, policy)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FailureConfig, MockNexus, Route};
    use crate::transport::MockTransport;

    fn client_with(server: MockNexus) -> NexusClient {
        NexusClient::new(Arc::new(MockTransport::with_server(server)))
    }

    #[test]
    fn test_status_ok() {
        let client = client_with(MockNexus::new());
        client.status().unwrap();
    }

    #[test]
    fn test_status_unavailable() {
        let server = MockNexus::new();
        server.inject_failure(Route::Status, FailureConfig::status(401));
        let client = client_with(server);

        let err = client.status().unwrap_err();
        assert!(matches!(err, NexusError::Unavailable(_)));
    }

    #[test]
    fn test_status_map_applies() {
        let client = client_with(MockNexus::new());
        let policy = ErrorPolicy::from(
            StatusMap::new().on(404, NexusError::NotFound, "Script nope does not exist"),
        );

        let err = client
            .execute(&HttpRequest::get(endpoints::script("nope")), &policy)
            .unwrap_err();
        assert!(matches!(err, NexusError::NotFound(ref m) if m == "Script nope does not exist"));
    }

    #[test]
    fn test_unmapped_status_uses_safety_belt() {
        let client = client_with(MockNexus::new());

        let err = client
            .execute(&HttpRequest::get(endpoints::script("nope")), &ErrorPolicy::unmapped())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "GET http://nexus.mock:8081/service/rest/v1/script/nope returned a status code of 404"
        );
    }

    #[test]
    fn test_safety_belt_url_keeps_query() {
        let server = MockNexus::new();
        server.inject_failure(Route::ListComponents, FailureConfig::status(502));
        let client = client_with(server);

        let request = HttpRequest::get(endpoints::COMPONENTS)
            .with_query("repository", "maven releases")
            .with_query("continuationToken", "tok");
        let err = client.execute(&request, &ErrorPolicy::unmapped()).unwrap_err();

        match err {
            NexusError::UnexpectedStatus { url, status, .. } => {
                assert_eq!(status, 502);
                assert_eq!(
                    url,
                    "http://nexus.mock:8081/service/rest/v1/components?repository=maven+releases&continuationToken=tok"
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_response_body_policy_keeps_body() {
        let server = MockNexus::new();
        server.inject_failure(
            Route::Repositories,
            FailureConfig::with_body(503, "maintenance window"),
        );
        let client = client_with(server);

        let err = client
            .execute(&HttpRequest::get(endpoints::REPOSITORIES), &ErrorPolicy::ResponseBody)
            .unwrap_err();
        match err {
            NexusError::ErrorResponse { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance window");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
