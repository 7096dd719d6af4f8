//! Blob stores
//!
//! Nexus 3 has no REST API for creating, listing or deleting blob stores,
//! so those operations run Groovy scripts through the reconciliation bridge.
//! Only the quota status has a REST endpoint.

use nexus3_wire::{
    endpoints, BlobStore, BlobStoreQuotaStatus, BlobStoreType, CreateBlobStoreInput,
    DeleteBlobStoreInput, Script,
};

use crate::client::{ErrorPolicy, NexusClient, StatusMap};
use crate::error::{NexusError, NexusResult};
use crate::transport::HttpRequest;

pub const CREATE_BLOBSTORE_SCRIPT_NAME: &str = "nexus3-go-create-blobstore";
pub const DELETE_BLOBSTORE_SCRIPT_NAME: &str = "nexus3-go-delete-blobstore";
pub const LIST_BLOBSTORES_SCRIPT_NAME: &str = "nexus3-go-list-blobstores";

/// Answers `created` or `exists`
pub(crate) const CREATE_BLOBSTORE_SCRIPT: &str = r#"
import groovy.json.JsonSlurper

parsed_args = new JsonSlurper().parseText(args)
existingBlobStore = blobStore.getBlobStoreManager().get(parsed_args.name)
if (existingBlobStore == null) {
  if (parsed_args.type == "S3") {
      blobStore.createS3BlobStore(parsed_args.name, parsed_args.config)
      msg = "created"
  } else {
      blobStore.createFileBlobStore(parsed_args.name, parsed_args.path)
      msg = "created"
  }
} else {
    msg = "exists"
}
return msg
"#;

/// Answers `deleted` or `not exists`
pub(crate) const DELETE_BLOBSTORE_SCRIPT: &str = r#"
import groovy.json.JsonSlurper

parsed_args = new JsonSlurper().parseText(args)
existingBlobStore = blobStore.getBlobStoreManager().get(parsed_args.name)
if (existingBlobStore != null) {
	if (parsed_args.force) {
		blobStore.getBlobStoreManager().forceDelete(parsed_args.name)
		msg = "deleted"
	} else {
		blobStore.getBlobStoreManager().delete(parsed_args.name)
		msg = "deleted"
	}
} else {
	msg = "not exists"
}
return msg
"#;

/// Answers a JSON array of flattened blob store properties
pub(crate) const LIST_BLOBSTORES_SCRIPT: &str = r#"
import groovy.json.JsonOutput

def res = []

blobStore.blobStoreManager.browse()*.each { store ->
	 def storeMap = [:]
   props = store.getProperties()
	 props.each { k, v ->
		 if (v instanceof String || v instanceof Boolean || v instanceof Integer) {
			 storeMap[k] = v
		 } else {
			 storeMap[k] = [:]
			 v.getProperties().each { x, y ->
				 if (y instanceof String || y instanceof Boolean || y instanceof Integer) {
					 storeMap[k][x] = y
				 }
			 }
		 }
	 }
	 res << storeMap
}
def json = JsonOutput.toJson(res)
return json
"#;

const RESULT_EXISTS: &str = "exists";
const RESULT_NOT_EXISTS: &str = "not exists";

impl NexusClient {
    pub fn list_blob_stores(&self) -> NexusResult<Vec<BlobStore>> {
        let script = Script::groovy(LIST_BLOBSTORES_SCRIPT_NAME, LIST_BLOBSTORES_SCRIPT);
        let result = self.ensure_and_execute(&script, None)?;
        serde_json::from_str(&result.result).map_err(|e| {
            NexusError::Protocol(format!("blob store listing is not a JSON array: {}", e))
        })
    }

    /// Look up a blob store by its configured name
    pub fn get_blob_store(&self, name: &str) -> NexusResult<BlobStore> {
        self.list_blob_stores()?
            .into_iter()
            .find(|store| store.name() == Some(name))
            .ok_or_else(|| NexusError::NotFound(format!("Blobstore {} does not exist", name)))
    }

    /// Create a blob store and return it as the server reports it
    pub fn create_blob_store(&self, input: &CreateBlobStoreInput) -> NexusResult<BlobStore> {
        validate_create(input)?;

        let script = Script::groovy(CREATE_BLOBSTORE_SCRIPT_NAME, CREATE_BLOBSTORE_SCRIPT);
        let args = serde_json::to_value(input)?;
        let result = self.ensure_and_execute(&script, Some(&args))?;

        if result.result == RESULT_EXISTS {
            return Err(NexusError::AlreadyExists(format!(
                "Blobstore {} already exists",
                input.name
            )));
        }
        self.get_blob_store(&input.name)
    }

    pub fn delete_blob_store(&self, input: &DeleteBlobStoreInput) -> NexusResult<()> {
        if input.name.is_empty() {
            return Err(NexusError::InvalidArgument(
                "Blobstore name is required".to_string(),
            ));
        }

        let script = Script::groovy(DELETE_BLOBSTORE_SCRIPT_NAME, DELETE_BLOBSTORE_SCRIPT);
        let args = serde_json::to_value(input)?;
        let result = self.ensure_and_execute(&script, Some(&args))?;

        if result.result == RESULT_NOT_EXISTS {
            return Err(NexusError::NotFound(format!(
                "Blobstore {} does not exist",
                input.name
            )));
        }
        Ok(())
    }

    pub fn get_blob_store_quota_status(&self, id: &str) -> NexusResult<BlobStoreQuotaStatus> {
        let policy = ErrorPolicy::from(StatusMap::new().on(
            404,
            NexusError::NotFound,
            format!("No status with id {} found", id),
        ));
        self.execute_json(&HttpRequest::get(endpoints::blob_store_quota_status(id)), &policy)
    }
}

fn validate_create(input: &CreateBlobStoreInput) -> NexusResult<()> {
    if input.name.is_empty() {
        return Err(NexusError::InvalidArgument(
            "Blobstore name is required".to_string(),
        ));
    }
    match input.store_type {
        BlobStoreType::File if input.path.as_deref().map_or(true, str::is_empty) => Err(
            NexusError::InvalidArgument("File blob stores require a path".to_string()),
        ),
        BlobStoreType::S3
            if input
                .s3_config
                .as_ref()
                .map_or(true, |config| config.bucket.is_empty()) =>
        {
            Err(NexusError::InvalidArgument(
                "S3 blob stores require a config with a bucket".to_string(),
            ))
        }
        _ => Ok(()),
    }
}
