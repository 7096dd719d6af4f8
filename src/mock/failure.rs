//! Failure Injection for Mock Nexus
//!
//! Supports configurable failure injection for testing error paths.

use std::collections::HashMap;
use std::time::Duration;

use crate::transport::Method;

/// Endpoint family a request is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Status,
    ListScripts,
    GetScript,
    CreateScript,
    UpdateScript,
    DeleteScript,
    RunScript,
    Repositories,
    ListAssets,
    GetAsset,
    DeleteAsset,
    ListComponents,
    GetComponent,
    DeleteComponent,
    UploadComponent,
    ListFormats,
    GetFormat,
    QuotaStatus,
    Download,
}

impl Route {
    /// Classify a request path (no leading slash) and method
    pub fn of(method: Method, path: &str) -> Option<Route> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

        if segments.first() == Some(&"repository") && segments.len() > 2 {
            return (method == Method::Get).then_some(Route::Download);
        }

        let rest = match segments.as_slice() {
            ["service", "rest", "v1", rest @ ..] => rest,
            _ => return None,
        };

        let route = match (method, rest) {
            (Method::Get, ["status"]) => Route::Status,
            (Method::Get, ["script"]) => Route::ListScripts,
            (Method::Post, ["script"]) => Route::CreateScript,
            (Method::Get, ["script", _]) => Route::GetScript,
            (Method::Put, ["script", _]) => Route::UpdateScript,
            (Method::Delete, ["script", _]) => Route::DeleteScript,
            (Method::Post, ["script", _, "run"]) => Route::RunScript,
            (Method::Get, ["repositories"]) => Route::Repositories,
            (Method::Get, ["assets"]) => Route::ListAssets,
            (Method::Get, ["assets", _]) => Route::GetAsset,
            (Method::Delete, ["assets", _]) => Route::DeleteAsset,
            (Method::Get, ["components"]) => Route::ListComponents,
            (Method::Post, ["components"]) => Route::UploadComponent,
            (Method::Get, ["components", _]) => Route::GetComponent,
            (Method::Delete, ["components", _]) => Route::DeleteComponent,
            (Method::Get, ["formats", "upload-specs"]) => Route::ListFormats,
            (Method::Get, ["formats", _, "upload-specs"]) => Route::GetFormat,
            (Method::Get, ["blobstores", _, "quota-status"]) => Route::QuotaStatus,
            _ => return None,
        };
        Some(route)
    }
}

/// Failure configuration for a route
#[derive(Debug, Clone, Default)]
pub struct FailureConfig {
    /// Status to answer with instead of handling the request
    pub status: Option<u16>,
    /// Body of the injected response
    pub body: Option<String>,
    /// Delay to add before responding
    pub delay: Option<Duration>,
    /// Number of times to fail before succeeding (None = always fail)
    pub fail_count: Option<u32>,
}

impl FailureConfig {
    /// Answer with `status` and an empty body
    pub fn status(status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Answer with `status` and `body`
    pub fn with_body(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: Some(body.into()),
            ..Self::default()
        }
    }

    /// Handle the request normally, but only after `duration`
    pub fn delay(duration: Duration) -> Self {
        Self {
            delay: Some(duration),
            ..Self::default()
        }
    }

    /// Set the number of times to fail before succeeding
    pub fn with_fail_count(mut self, count: u32) -> Self {
        self.fail_count = Some(count);
        self
    }
}

/// Failure injector for the mock server
#[derive(Debug, Default)]
pub struct FailureInjector {
    configs: HashMap<Route, FailureConfig>,
    /// Call counts per route (for fail_count tracking)
    call_counts: HashMap<Route, u32>,
}

impl FailureInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a failure for a route
    pub fn inject(&mut self, route: Route, config: FailureConfig) {
        self.configs.insert(route, config);
        self.call_counts.insert(route, 0);
    }

    /// Clear all failure injections
    pub fn clear(&mut self) {
        self.configs.clear();
        self.call_counts.clear();
    }

    /// Clear failure injection for a specific route
    pub fn clear_route(&mut self, route: Route) {
        self.configs.remove(&route);
        self.call_counts.remove(&route);
    }

    /// Failure to apply to this call of `route`, if any
    pub fn check(&mut self, route: Route) -> Option<FailureConfig> {
        let config = self.configs.get(&route)?;
        let count = self.call_counts.entry(route).or_insert(0);
        *count += 1;

        if let Some(fail_limit) = config.fail_count {
            if *count > fail_limit {
                return None;
            }
        }

        Some(config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_classification() {
        assert_eq!(Route::of(Method::Get, "service/rest/v1/status"), Some(Route::Status));
        assert_eq!(
            Route::of(Method::Post, "service/rest/v1/script/p1/run"),
            Some(Route::RunScript)
        );
        assert_eq!(
            Route::of(Method::Get, "service/rest/v1/formats/raw/upload-specs"),
            Some(Route::GetFormat)
        );
        assert_eq!(
            Route::of(Method::Get, "repository/raw-hosted/dir/a.txt"),
            Some(Route::Download)
        );
        assert_eq!(Route::of(Method::Get, "service/rest/v1/nope"), None);
        assert_eq!(Route::of(Method::Put, "service/rest/v1/assets/abc"), None);
    }

    #[test]
    fn test_failure_injector_basic() {
        let mut injector = FailureInjector::new();
        assert!(injector.check(Route::GetScript).is_none());

        injector.inject(Route::GetScript, FailureConfig::status(403));
        let config = injector.check(Route::GetScript).unwrap();
        assert_eq!(config.status, Some(403));
        assert!(injector.check(Route::ListScripts).is_none());
    }

    #[test]
    fn test_failure_injector_fail_count() {
        let mut injector = FailureInjector::new();

        // Fail twice, then succeed
        injector.inject(Route::RunScript, FailureConfig::status(503).with_fail_count(2));

        assert!(injector.check(Route::RunScript).is_some());
        assert!(injector.check(Route::RunScript).is_some());
        assert!(injector.check(Route::RunScript).is_none());
    }

    #[test]
    fn test_failure_injector_clear() {
        let mut injector = FailureInjector::new();

        injector.inject(Route::DeleteScript, FailureConfig::status(500));
        assert!(injector.check(Route::DeleteScript).is_some());

        injector.clear_route(Route::DeleteScript);
        assert!(injector.check(Route::DeleteScript).is_none());
    }
}
