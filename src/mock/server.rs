//! Mock Nexus Implementation
//!
//! In-process stand-in for a Nexus 3 server. Requests are routed by method
//! and path and answered from `MockState`; a tiny script engine stands in
//! for the Groovy console.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use sha2::{Digest, Sha256};

use nexus3_wire::endpoints::{QUERY_CONTINUATION_TOKEN, QUERY_REPOSITORY};
use nexus3_wire::{
    Asset, BlobStore, BlobStoreQuotaStatus, Component, CreateBlobStoreInput, DeleteBlobStoreInput,
    Format, ListingPage, Repository, Script, ScriptResult,
};

use crate::resources::blobstores::{
    CREATE_BLOBSTORE_SCRIPT, DELETE_BLOBSTORE_SCRIPT, LIST_BLOBSTORES_SCRIPT,
};
use crate::transport::{HttpRequest, HttpResponse, RequestBody};

use super::failure::{FailureConfig, FailureInjector, Route};
use super::state::{store_of_type, CallRecord, MockState, UploadRecord};

/// Root URL the mock server pretends to live at
pub const MOCK_BASE_URL: &str = "http://nexus.mock:8081";

const DEFAULT_PAGE_SIZE: usize = 10;

/// Handler standing in for a script body: receives the raw argument text
/// (empty when none was sent), returns the result text or the exception text
pub type ScriptHandler = Arc<dyn Fn(&str) -> Result<String, String> + Send + Sync>;

/// Configurable mock Nexus server for testing
///
/// Clones share state, so a test can keep one handle for assertions while
/// another sits inside a `MockTransport`.
#[derive(Clone)]
pub struct MockNexus {
    state: Arc<Mutex<MockState>>,
    failures: Arc<Mutex<FailureInjector>>,
    /// Script handlers keyed by script content
    handlers: Arc<Mutex<HashMap<String, ScriptHandler>>>,
    page_size: Arc<Mutex<usize>>,
}

impl Default for MockNexus {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNexus {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::new())),
            failures: Arc::new(Mutex::new(FailureInjector::new())),
            handlers: Arc::new(Mutex::new(HashMap::new())),
            page_size: Arc::new(Mutex::new(DEFAULT_PAGE_SIZE)),
        }
    }

    pub fn base_url(&self) -> &str {
        MOCK_BASE_URL
    }

    // === Public API for test configuration ===

    /// Inject a failure configuration for a route
    pub fn inject_failure(&self, route: Route, config: FailureConfig) {
        self.failures.lock().unwrap().inject(route, config);
    }

    /// Clear all failure injections
    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// Items per page of asset and component listings
    pub fn set_page_size(&self, size: usize) {
        *self.page_size.lock().unwrap() = size.max(1);
    }

    pub fn add_repository(&self, name: &str, format: &str, repo_type: &str) -> Repository {
        let repository = Repository {
            name: name.to_string(),
            format: format.to_string(),
            repo_type: repo_type.to_string(),
            url: format!("{}/repository/{}", MOCK_BASE_URL, name),
        };
        let mut state = self.state.lock().unwrap();
        state.repositories.push(repository.clone());
        state.assets.entry(name.to_string()).or_default();
        state.components.entry(name.to_string()).or_default();
        repository
    }

    /// Store a file in `repository` and list it as an asset
    pub fn add_asset(&self, repository: &str, path: &str, content: &[u8]) -> Asset {
        let mut state = self.state.lock().unwrap();
        let asset = Self::new_asset(&mut state, repository, path, content);
        state
            .assets
            .entry(repository.to_string())
            .or_default()
            .push(asset.clone());
        asset
    }

    /// Store a component made of `files` (path, content) in `repository`
    pub fn add_component(
        &self,
        repository: &str,
        name: &str,
        version: Option<&str>,
        files: &[(&str, &[u8])],
    ) -> Component {
        let mut state = self.state.lock().unwrap();
        let mut assets = Vec::with_capacity(files.len());
        for (path, content) in files {
            let asset = Self::new_asset(&mut state, repository, path, content);
            state
                .assets
                .entry(repository.to_string())
                .or_default()
                .push(asset.clone());
            assets.push(asset);
        }

        let format = state
            .repositories
            .iter()
            .find(|r| r.name == repository)
            .map(|r| r.format.clone())
            .unwrap_or_else(|| "raw".to_string());

        let component = Component {
            id: state.next_id("component"),
            repository: repository.to_string(),
            format,
            group: None,
            name: name.to_string(),
            version: version.map(str::to_string),
            assets,
        };
        state
            .components
            .entry(repository.to_string())
            .or_default()
            .push(component.clone());
        component
    }

    fn new_asset(state: &mut MockState, repository: &str, path: &str, content: &[u8]) -> Asset {
        let download_path = format!("repository/{}/{}", repository, path);
        state.downloads.insert(download_path.clone(), content.to_vec());

        let format = state
            .repositories
            .iter()
            .find(|r| r.name == repository)
            .map(|r| r.format.clone())
            .unwrap_or_else(|| "raw".to_string());

        let mut checksum = std::collections::BTreeMap::new();
        checksum.insert("sha256".to_string(), hex::encode(Sha256::digest(content)));

        Asset {
            id: state.next_id("asset"),
            download_url: format!("{}/{}", MOCK_BASE_URL, download_path),
            path: path.to_string(),
            repository: repository.to_string(),
            format,
            checksum,
        }
    }

    /// Replace the bytes served for an asset without touching its checksum
    pub fn corrupt_download(&self, asset: &Asset, content: &[u8]) {
        let path = asset
            .download_url
            .trim_start_matches(MOCK_BASE_URL)
            .trim_start_matches('/')
            .to_string();
        self.state.lock().unwrap().downloads.insert(path, content.to_vec());
    }

    pub fn add_format(&self, format: Format) {
        let mut state = self.state.lock().unwrap();
        state.formats.retain(|f| f.name != format.name);
        state.formats.push(format);
    }

    pub fn add_blob_store(&self, store: BlobStore) {
        self.state.lock().unwrap().blob_stores.push(store);
    }

    pub fn blob_store_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .blob_stores
            .iter()
            .filter_map(|b| b.name().map(str::to_string))
            .collect()
    }

    pub fn set_quota_status(&self, id: &str, status: BlobStoreQuotaStatus) {
        self.state
            .lock()
            .unwrap()
            .quota_statuses
            .insert(id.to_string(), status);
    }

    /// Store a script directly, bypassing the API (for test setup)
    pub fn put_script(&self, script: Script) {
        let mut state = self.state.lock().unwrap();
        state.remove_script(&script.name);
        state.scripts.push(script);
    }

    /// Stored copy of a script (for test assertions)
    pub fn script(&self, name: &str) -> Option<Script> {
        self.state.lock().unwrap().script(name).cloned()
    }

    pub fn script_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.scripts.iter().map(|s| s.name.clone()).collect()
    }

    /// Run `handler` whenever a script with exactly this content executes
    pub fn register_script_handler<F>(&self, content: &str, handler: F)
    where
        F: Fn(&str) -> Result<String, String> + Send + Sync + 'static,
    {
        self.handlers
            .lock()
            .unwrap()
            .insert(content.to_string(), Arc::new(handler));
    }

    pub fn uploads(&self) -> Vec<UploadRecord> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, route: Route) -> usize {
        self.state.lock().unwrap().call_count(route)
    }

    /// Routes of all recorded calls, in arrival order
    pub fn call_routes(&self) -> Vec<Route> {
        let state = self.state.lock().unwrap();
        state.calls.iter().filter_map(|c| c.route).collect()
    }

    pub fn reset_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    // === Request handling ===

    /// Handle one request (in-process library mode)
    pub fn handle_request(&self, request: &HttpRequest) -> HttpResponse {
        let route = Route::of(request.method, &request.path);

        self.state.lock().unwrap().calls.push(CallRecord {
            method: request.method,
            path: request.path.clone(),
            route,
        });

        let Some(route) = route else {
            return HttpResponse::new(404, Vec::new());
        };

        if let Some(failure) = self.failures.lock().unwrap().check(route) {
            if let Some(delay) = failure.delay {
                std::thread::sleep(delay);
            }
            if let Some(status) = failure.status {
                return HttpResponse::new(status, failure.body.unwrap_or_default());
            }
        }

        let id = last_segment(&request.path);
        match route {
            Route::Status => HttpResponse::new(200, Vec::new()),
            Route::ListScripts => {
                let state = self.state.lock().unwrap();
                json_response(200, &state.scripts)
            }
            Route::GetScript => self.handle_get_script(id),
            Route::CreateScript => self.handle_create_script(request),
            Route::UpdateScript => self.handle_update_script(id, request),
            Route::DeleteScript => {
                if self.state.lock().unwrap().remove_script(id) {
                    HttpResponse::new(204, Vec::new())
                } else {
                    HttpResponse::new(404, Vec::new())
                }
            }
            Route::RunScript => self.handle_run_script(request),
            Route::Repositories => {
                let state = self.state.lock().unwrap();
                json_response(200, &state.repositories)
            }
            Route::ListAssets => {
                let state = self.state.lock().unwrap();
                self.paginate(request, &state.assets)
            }
            Route::GetAsset => {
                let state = self.state.lock().unwrap();
                match state.find_asset(id) {
                    Some(asset) => json_response(200, asset),
                    None => HttpResponse::new(404, Vec::new()),
                }
            }
            Route::DeleteAsset => {
                if self.state.lock().unwrap().remove_asset(id) {
                    HttpResponse::new(204, Vec::new())
                } else {
                    HttpResponse::new(404, Vec::new())
                }
            }
            Route::ListComponents => {
                let state = self.state.lock().unwrap();
                self.paginate(request, &state.components)
            }
            Route::GetComponent => {
                let state = self.state.lock().unwrap();
                match state.find_component(id) {
                    Some(component) => json_response(200, component),
                    None => HttpResponse::new(404, Vec::new()),
                }
            }
            Route::DeleteComponent => {
                if self.state.lock().unwrap().remove_component(id) {
                    HttpResponse::new(204, Vec::new())
                } else {
                    HttpResponse::new(404, Vec::new())
                }
            }
            Route::UploadComponent => self.handle_upload(request),
            Route::ListFormats => {
                let state = self.state.lock().unwrap();
                json_response(200, &state.formats)
            }
            Route::GetFormat => {
                let format_name = request
                    .path
                    .trim_end_matches("/upload-specs")
                    .rsplit('/')
                    .next()
                    .unwrap_or_default();
                let state = self.state.lock().unwrap();
                match state.find_format(format_name) {
                    Some(format) => json_response(200, format),
                    None => HttpResponse::new(404, Vec::new()),
                }
            }
            Route::QuotaStatus => {
                let store_id = request
                    .path
                    .trim_end_matches("/quota-status")
                    .rsplit('/')
                    .next()
                    .unwrap_or_default();
                let state = self.state.lock().unwrap();
                match state.quota_statuses.get(store_id) {
                    Some(status) => json_response(200, status),
                    None => HttpResponse::new(404, Vec::new()),
                }
            }
            Route::Download => {
                let state = self.state.lock().unwrap();
                match state.downloads.get(request.path.trim_start_matches('/')) {
                    Some(content) => HttpResponse::new(200, content.clone()),
                    None => HttpResponse::new(404, Vec::new()),
                }
            }
        }
    }

    fn handle_get_script(&self, name: &str) -> HttpResponse {
        let state = self.state.lock().unwrap();
        match state.script(name) {
            Some(script) => json_response(200, script),
            None => HttpResponse::new(404, Vec::new()),
        }
    }

    fn handle_create_script(&self, request: &HttpRequest) -> HttpResponse {
        let script: Script = match serde_json::from_slice(body_bytes(request)) {
            Ok(script) => script,
            Err(e) => return HttpResponse::new(400, e.to_string()),
        };

        let mut state = self.state.lock().unwrap();
        if state.script(&script.name).is_some() {
            // Nexus answers a duplicate name with a bare server error
            return HttpResponse::new(500, Vec::new());
        }
        state.scripts.push(script);
        HttpResponse::new(204, Vec::new())
    }

    fn handle_update_script(&self, name: &str, request: &HttpRequest) -> HttpResponse {
        let update: Script = match serde_json::from_slice(body_bytes(request)) {
            Ok(script) => script,
            Err(e) => return HttpResponse::new(400, e.to_string()),
        };

        let mut state = self.state.lock().unwrap();
        match state.script_mut(name) {
            Some(script) => {
                script.content = update.content;
                script.kind = update.kind;
                HttpResponse::new(204, Vec::new())
            }
            None => HttpResponse::new(404, Vec::new()),
        }
    }

    fn handle_run_script(&self, request: &HttpRequest) -> HttpResponse {
        let name = request
            .path
            .trim_end_matches("/run")
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();

        let content = match self.state.lock().unwrap().script(&name) {
            Some(script) => script.content.clone(),
            None => return HttpResponse::new(404, Vec::new()),
        };
        let args = String::from_utf8_lossy(body_bytes(request)).into_owned();

        let handler = self.handlers.lock().unwrap().get(&content).cloned();
        let outcome = match handler {
            Some(handler) => handler(&args),
            None => self.run_builtin(&content, &args),
        };

        match outcome {
            Ok(result) => json_response(200, &ScriptResult { name, result }),
            Err(message) => json_response(
                500,
                &ScriptResult {
                    name,
                    result: message,
                },
            ),
        }
    }

    /// Stand-in for the Groovy engine
    fn run_builtin(&self, content: &str, args: &str) -> Result<String, String> {
        if content == CREATE_BLOBSTORE_SCRIPT {
            return self.run_create_blob_store(args);
        }
        if content == DELETE_BLOBSTORE_SCRIPT {
            return self.run_delete_blob_store(args);
        }
        if content == LIST_BLOBSTORES_SCRIPT {
            let state = self.state.lock().unwrap();
            return serde_json::to_string(&state.blob_stores).map_err(|e| e.to_string());
        }
        evaluate(content, args)
    }

    fn run_create_blob_store(&self, args: &str) -> Result<String, String> {
        let input: CreateBlobStoreInput = parse_args(args)?;
        let mut state = self.state.lock().unwrap();
        if state.blob_store(&input.name).is_some() {
            return Ok("exists".to_string());
        }
        state
            .blob_stores
            .push(store_of_type(&input.name, input.store_type.as_str()));
        Ok("created".to_string())
    }

    fn run_delete_blob_store(&self, args: &str) -> Result<String, String> {
        let input: DeleteBlobStoreInput = parse_args(args)?;
        let mut state = self.state.lock().unwrap();
        let before = state.blob_stores.len();
        state.blob_stores.retain(|b| b.name() != Some(input.name.as_str()));
        if state.blob_stores.len() == before {
            Ok("not exists".to_string())
        } else {
            Ok("deleted".to_string())
        }
    }

    fn handle_upload(&self, request: &HttpRequest) -> HttpResponse {
        let Some(repository) = request.query_param(QUERY_REPOSITORY) else {
            return HttpResponse::new(422, "repository is required");
        };
        let RequestBody::Multipart(parts) = &request.body else {
            return HttpResponse::new(400, "multipart body required");
        };

        let mut state = self.state.lock().unwrap();
        if !state.has_repository(repository) {
            return HttpResponse::new(404, Vec::new());
        }
        state.uploads.push(UploadRecord {
            repository: repository.to_string(),
            parts: parts.clone(),
        });
        HttpResponse::new(204, Vec::new())
    }

    fn paginate<T: Clone + Serialize>(
        &self,
        request: &HttpRequest,
        by_repository: &std::collections::BTreeMap<String, Vec<T>>,
    ) -> HttpResponse {
        let Some(repository) = request.query_param(QUERY_REPOSITORY) else {
            return HttpResponse::new(422, "repository is required");
        };
        let Some(items) = by_repository.get(repository) else {
            return HttpResponse::new(404, Vec::new());
        };

        let offset = match request.query_param(QUERY_CONTINUATION_TOKEN) {
            Some(token) => match usize::from_str_radix(token, 16) {
                Ok(offset) => offset,
                Err(_) => return HttpResponse::new(400, "invalid continuation token"),
            },
            None => 0,
        };

        let page_size = *self.page_size.lock().unwrap();
        let end = offset.saturating_add(page_size).min(items.len());
        let page_items = items.get(offset..end).map(<[T]>::to_vec).unwrap_or_default();
        let token = (end < items.len()).then(|| format!("{:016x}", end));

        json_response(200, &ListingPage::new(page_items, token))
    }
}

fn json_response<T: Serialize + ?Sized>(status: u16, value: &T) -> HttpResponse {
    match serde_json::to_vec(value) {
        Ok(body) => HttpResponse::new(status, body),
        Err(e) => HttpResponse::new(500, e.to_string()),
    }
}

fn body_bytes(request: &HttpRequest) -> &[u8] {
    match &request.body {
        RequestBody::Bytes(bytes) => bytes,
        RequestBody::Empty | RequestBody::Multipart(_) => &[],
    }
}

fn last_segment(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}

fn parse_args<T: serde::de::DeserializeOwned>(args: &str) -> Result<T, String> {
    serde_json::from_str(args).map_err(|e| {
        format!(
            "javax.script.ScriptException: groovy.json.JsonException: {}",
            e
        )
    })
}

/// Evaluate the handful of one-line forms the mock understands:
/// `return <literal>`, `return args` and `throw new <Class>('<message>')`.
/// Anything else fails the way Groovy fails on an unknown identifier.
fn evaluate(content: &str, args: &str) -> Result<String, String> {
    let body = content.trim();

    if let Some(expr) = body.strip_prefix("return ") {
        let expr = expr.trim();
        if expr == "args" {
            return Ok(args.to_string());
        }
        if let Some(text) = unquote(expr) {
            return Ok(text.to_string());
        }
        if expr.parse::<i64>().is_ok() || expr == "true" || expr == "false" {
            return Ok(expr.to_string());
        }
        return Err(missing_property(expr));
    }

    if let Some(rest) = body.strip_prefix("throw new ") {
        if let Some((class, message)) = rest.split_once('(') {
            let message = message.trim_end_matches(')');
            let message = unquote(message).unwrap_or(message);
            return Err(format!("{}: {}", class.trim(), message));
        }
    }

    let token = body.split_whitespace().next().unwrap_or_default();
    Err(missing_property(token))
}

fn unquote(expr: &str) -> Option<&str> {
    ['\'', '"'].iter().find_map(|q| {
        expr.strip_prefix(*q)
            .and_then(|rest| rest.strip_suffix(*q))
    })
}

fn missing_property(identifier: &str) -> String {
    format!(
        "javax.script.ScriptException: groovy.lang.MissingPropertyException: No such property: {} for class: Script1",
        identifier
    )
}
