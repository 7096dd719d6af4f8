//! REST endpoint paths, relative to the server root.

pub const STATUS: &str = "service/rest/v1/status";
pub const SCRIPTS: &str = "service/rest/v1/script";
pub const REPOSITORIES: &str = "service/rest/v1/repositories";
pub const ASSETS: &str = "service/rest/v1/assets";
pub const COMPONENTS: &str = "service/rest/v1/components";
pub const FORMATS_UPLOAD_SPECS: &str = "service/rest/v1/formats/upload-specs";

/// Query parameter carrying the scoping repository of a listing.
pub const QUERY_REPOSITORY: &str = "repository";

/// Query parameter carrying the page cursor of a listing.
pub const QUERY_CONTINUATION_TOKEN: &str = "continuationToken";

pub fn script(name: &str) -> String {
    format!("{}/{}", SCRIPTS, name)
}

pub fn script_run(name: &str) -> String {
    format!("{}/{}/run", SCRIPTS, name)
}

pub fn asset(id: &str) -> String {
    format!("{}/{}", ASSETS, id)
}

pub fn component(id: &str) -> String {
    format!("{}/{}", COMPONENTS, id)
}

pub fn format_upload_specs(format: &str) -> String {
    format!("service/rest/v1/formats/{}/upload-specs", format)
}

pub fn blob_store_quota_status(id: &str) -> String {
    format!("service/rest/v1/blobstores/{}/quota-status", id)
}
