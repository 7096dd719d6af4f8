//! Nexus 3 Wire Types
//!
//! JSON shapes exchanged with a Nexus 3 server: the script API, paginated
//! listings, and the resource records returned by the REST API.

pub mod asset;
pub mod blobstore;
pub mod endpoints;
pub mod format;
pub mod page;
pub mod repository;
pub mod script;

pub use asset::{Asset, Component};
pub use blobstore::{
    BlobDir, BlobIdStream, BlobStore, BlobStoreConfig, BlobStoreMetrics, BlobStoreQuotaStatus,
    BlobStoreType, CreateBlobStoreInput, DeleteBlobStoreInput, S3BlobStoreConfig, StateGuard,
};
pub use format::{Format, FormatField};
pub use page::ListingPage;
pub use repository::Repository;
pub use script::{Script, ScriptResult, ScriptType};

/// Content type used for every JSON request body.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Content type the script run endpoint expects for its argument payload.
pub const CONTENT_TYPE_SCRIPT_ARGS: &str = "text/plain";
