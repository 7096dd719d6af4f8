//! Transport Layer
//!
//! Abstracts the HTTP connection for testability. Provides:
//! - Transport trait: send one request, get status + body back
//! - MockTransport: in-process mock Nexus for unit tests
//! - HttpTransport: real HTTP with basic auth for production

use std::fmt;
use std::time::Duration;

use reqwest::blocking::multipart;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::mock::MockNexus;
use nexus3_wire::CONTENT_TYPE_JSON;

/// HTTP methods used by the Nexus API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Value of one multipart form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File { file_name: String, content: Vec<u8> },
}

/// One named multipart form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub value: FormValue,
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FormValue::Text(value.into()),
        }
    }

    pub fn file(name: impl Into<String>, file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            value: FormValue::File {
                file_name: file_name.into(),
                content,
            },
        }
    }
}

/// Request body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestBody {
    #[default]
    Empty,
    Bytes(Vec<u8>),
    /// Encoded by the HTTP library; the content type carries the boundary
    Multipart(Vec<FormPart>),
}

/// A request relative to the server root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    /// Path without a leading slash, e.g. `service/rest/v1/script`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Defaults to `application/json`
    pub content_type: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            content_type: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Serialize `value` as the JSON body
    pub fn with_json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.body = RequestBody::Bytes(serde_json::to_vec(value)?);
        self.content_type = Some(CONTENT_TYPE_JSON.to_string());
        Ok(self)
    }

    pub fn with_body(mut self, body: Vec<u8>, content_type: impl Into<String>) -> Self {
        self.body = RequestBody::Bytes(body);
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self.content_type = None;
        self
    }

    pub fn content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or(CONTENT_TYPE_JSON)
    }

    /// Value of the first query parameter named `key`
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Absolute URL under `base_url`, query parameters encoded
    pub fn url(&self, base_url: &str) -> Result<reqwest::Url, TransportError> {
        let raw = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        );
        let mut url = reqwest::Url::parse(&raw)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", raw, e)))?;

        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

/// Raw response: status code and body bytes, whatever the status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport trait for HTTP communication
///
/// Implementations attach authentication and own timeouts. Non-2xx statuses
/// are not errors at this layer.
pub trait Transport: Send + Sync {
    /// Send a request and return the raw response
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Server root URL without a trailing slash
    fn base_url(&self) -> &str;
}

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Mock transport for testing - routes requests to a MockNexus in-process
pub struct MockTransport {
    server: MockNexus,
}

impl MockTransport {
    /// Create a new mock transport with a fresh mock server
    pub fn new() -> Self {
        Self {
            server: MockNexus::new(),
        }
    }

    /// Create a mock transport with a pre-configured server
    pub fn with_server(server: MockNexus) -> Self {
        Self { server }
    }

    /// Get a reference to the underlying mock server for test configuration
    pub fn server(&self) -> &MockNexus {
        &self.server
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        Ok(self.server.handle_request(request))
    }

    fn base_url(&self) -> &str {
        self.server.base_url()
    }
}

/// HTTP transport for production use
///
/// Every request carries basic auth; nothing is cached between requests.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
    username: String,
    password: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.host.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn url_for(&self, request: &HttpRequest) -> Result<reqwest::Url, TransportError> {
        request.url(&self.base_url)
    }

    fn build_form(parts: &[FormPart]) -> multipart::Form {
        parts.iter().fold(multipart::Form::new(), |form, part| match &part.value {
            FormValue::Text(text) => form.text(part.name.clone(), text.clone()),
            FormValue::File { file_name, content } => form.part(
                part.name.clone(),
                multipart::Part::bytes(content.clone()).file_name(file_name.clone()),
            ),
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = self.url_for(request)?;

        let builder = self
            .client
            .request(request.method.into(), url)
            .basic_auth(&self.username, Some(&self.password));

        let builder = match &request.body {
            RequestBody::Empty => builder.header(CONTENT_TYPE, request.content_type()),
            RequestBody::Bytes(bytes) => builder
                .header(CONTENT_TYPE, request.content_type())
                .body(bytes.clone()),
            RequestBody::Multipart(parts) => builder.multipart(Self::build_form(parts)),
        };

        let response = builder.send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?.to_vec();

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status,
            bytes = body.len(),
            "http exchange"
        );

        Ok(HttpResponse { status, body })
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus3_wire::endpoints;

    fn http_transport(host: &str) -> HttpTransport {
        let config = ClientConfig {
            host: host.to_string(),
            ..ClientConfig::default()
        };
        HttpTransport::new(&config).unwrap()
    }

    #[test]
    fn test_mock_transport_status() {
        let transport = MockTransport::new();
        let response = transport.send(&HttpRequest::get(endpoints::STATUS)).unwrap();
        assert!(response.is_success());
    }

    #[test]
    fn test_mock_transport_with_server_config() {
        let server = MockNexus::new();
        server.add_repository("raw-hosted", "raw", "hosted");

        let transport = MockTransport::with_server(server);
        let response = transport
            .send(&HttpRequest::get(endpoints::REPOSITORIES))
            .unwrap();

        assert_eq!(response.status, 200);
        let repos: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(repos[0]["name"], "raw-hosted");
    }

    #[test]
    fn test_default_content_type_is_json() {
        let request = HttpRequest::get(endpoints::SCRIPTS);
        assert_eq!(request.content_type(), "application/json");

        let request = HttpRequest::post("x").with_body(b"{}".to_vec(), "text/plain");
        assert_eq!(request.content_type(), "text/plain");
    }

    #[test]
    fn test_url_joins_host_and_path() {
        let transport = http_transport("http://localhost:8081/");
        let url = transport
            .url_for(&HttpRequest::get(endpoints::script("hello")))
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8081/service/rest/v1/script/hello");
    }

    #[test]
    fn test_url_encodes_query_parameters() {
        let transport = http_transport("http://nexus.example:8081");
        let request = HttpRequest::get(endpoints::ASSETS)
            .with_query("repository", "maven releases")
            .with_query("continuationToken", "a+b/c");

        let url = transport.url_for(&request).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("repository".to_string(), "maven releases".to_string()),
                ("continuationToken".to_string(), "a+b/c".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_host_is_rejected() {
        let transport = http_transport("not a url");
        let err = transport.url_for(&HttpRequest::get(endpoints::STATUS)).unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl(_)));
    }
}
