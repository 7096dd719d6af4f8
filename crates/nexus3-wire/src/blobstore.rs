//! Blob store records and script inputs.
//!
//! Nexus has no REST endpoint for managing blob stores, so these shapes are
//! what the blob store scripts consume and emit. `BlobStore` mirrors the bean
//! properties the list script flattens into JSON, which is why almost every
//! field is optional.

use serde::{Deserialize, Serialize};

/// Backend type of a blob store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlobStoreType {
    #[default]
    File,
    S3,
}

impl BlobStoreType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlobStoreType::File => "File",
            BlobStoreType::S3 => "S3",
        }
    }
}

/// A blob store as reported by the list script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobStore {
    pub groupable: Option<bool>,
    pub content_dir: Option<BlobDir>,
    pub metrics: Option<BlobStoreMetrics>,
    pub blob_id_stream: Option<BlobIdStream>,
    pub relative_blob_dir: Option<BlobDir>,
    pub absolute_blob_dir: Option<BlobDir>,
    pub writable: Option<bool>,
    pub storage_available: Option<bool>,
    #[serde(rename = "blobStoreConfiguration")]
    pub config: Option<BlobStoreConfig>,
    pub started: Option<bool>,
    pub state_guard: Option<StateGuard>,
}

impl BlobStore {
    /// Configured name, if the server reported a configuration block.
    pub fn name(&self) -> Option<&str> {
        self.config.as_ref().and_then(|c| c.name.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobDir {
    pub absolute: Option<bool>,
    pub path_for_permission_check: Option<String>,
    pub name_count: Option<i64>,
    pub path_for_exception_message: Option<String>,
    pub empty: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobStoreMetrics {
    pub unlimited: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobIdStream {
    pub parallel: Option<bool>,
    pub stream_flags: Option<i64>,
    pub ordered: Option<bool>,
    pub stream_and_op_flags: Option<i64>,
}

/// Name and type of a blob store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobStoreConfig {
    pub writable: Option<bool>,
    #[serde(rename = "type")]
    pub store_type: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateGuard {
    pub current: Option<String>,
}

/// Response of `GET /blobstores/{id}/quota-status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobStoreQuotaStatus {
    pub is_violation: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub blob_store_name: String,
}

/// Arguments of the create-blobstore script.
///
/// File stores need `path`; S3 stores need `s3_config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBlobStoreInput {
    pub name: String,
    #[serde(rename = "type")]
    pub store_type: BlobStoreType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(rename = "config", default, skip_serializing_if = "Option::is_none")]
    pub s3_config: Option<S3BlobStoreConfig>,
}

impl CreateBlobStoreInput {
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store_type: BlobStoreType::File,
            path: Some(path.into()),
            s3_config: None,
        }
    }

    pub fn s3(name: impl Into<String>, config: S3BlobStoreConfig) -> Self {
        Self {
            name: name.into(),
            store_type: BlobStoreType::S3,
            path: None,
            s3_config: Some(config),
        }
    }
}

/// S3 bucket settings for an S3-backed blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3BlobStoreConfig {
    pub bucket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(rename = "accessKeyId", default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assume_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Days deleted blobs are kept in the bucket; -1 disables expiry.
    #[serde(default = "default_expiration")]
    pub expiration: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_type: Option<String>,
}

fn default_expiration() -> i32 {
    -1
}

impl S3BlobStoreConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            assume_role: None,
            region: None,
            endpoint: None,
            expiration: default_expiration(),
            signer_type: None,
        }
    }
}

/// Arguments of the delete-blobstore script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteBlobStoreInput {
    pub name: String,
    #[serde(default)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_input_file_shape() {
        let input = CreateBlobStoreInput::file("store-a", "/nexus-data/blobs/a");
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value, json!({"name": "store-a", "type": "File", "path": "/nexus-data/blobs/a"}));
    }

    #[test]
    fn test_create_input_s3_shape() {
        let mut config = S3BlobStoreConfig::new("bucket-1");
        config.region = Some("us-east-1".to_string());
        let value = serde_json::to_value(CreateBlobStoreInput::s3("s3-store", config)).unwrap();

        assert_eq!(value["type"], "S3");
        assert_eq!(value["config"]["bucket"], "bucket-1");
        assert!(value["config"].get("accessKeyId").is_none());
        assert_eq!(value["config"]["region"], "us-east-1");
        assert_eq!(value["config"]["expiration"], -1);
    }

    #[test]
    fn test_blob_store_name_from_configuration() {
        let store: BlobStore = serde_json::from_value(json!({
            "started": true,
            "blobStoreConfiguration": {"name": "default", "type": "File", "writable": true}
        }))
        .unwrap();
        assert_eq!(store.name(), Some("default"));
        assert_eq!(store.started, Some(true));
    }
}
