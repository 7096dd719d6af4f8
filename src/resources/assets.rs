//! Assets
//!
//! Paginated listing per repository, lookup, deletion and download.

use sha2::{Digest, Sha256};

use nexus3_wire::endpoints::{self, QUERY_CONTINUATION_TOKEN, QUERY_REPOSITORY};
use nexus3_wire::{Asset, ListingPage};

use crate::client::{ErrorPolicy, NexusClient, StatusMap};
use crate::error::{NexusError, NexusResult};
use crate::paging::{collect_all, traverse, PageRequest};
use crate::transport::HttpRequest;

/// One page request of an asset listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListAssetsInput {
    pub repository: String,
    pub continuation_token: Option<String>,
}

impl ListAssetsInput {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            continuation_token: None,
        }
    }
}

impl From<&PageRequest> for ListAssetsInput {
    fn from(request: &PageRequest) -> Self {
        Self {
            repository: request.scope.clone(),
            continuation_token: request.continuation_token.clone(),
        }
    }
}

impl NexusClient {
    /// One page of the assets in a repository
    pub fn list_assets(&self, input: &ListAssetsInput) -> NexusResult<ListingPage<Asset>> {
        if input.repository.is_empty() {
            return Err(NexusError::InvalidArgument(
                "Repository is required to list assets".to_string(),
            ));
        }

        let mut request =
            HttpRequest::get(endpoints::ASSETS).with_query(QUERY_REPOSITORY, &input.repository);
        if let Some(token) = &input.continuation_token {
            request = request.with_query(QUERY_CONTINUATION_TOKEN, token);
        }

        let policy = ErrorPolicy::from(
            StatusMap::new()
                .on(
                    403,
                    NexusError::PermissionDenied,
                    format!("Insufficient permissions to list assets in {}", input.repository),
                )
                .on(
                    404,
                    NexusError::NotFound,
                    format!("Repository {} does not exist", input.repository),
                ),
        );
        self.execute_json(&request, &policy)
    }

    /// Walk asset pages starting at `input`; see [`traverse`]
    pub fn list_assets_pages<H>(&self, input: &ListAssetsInput, handle_page: H) -> NexusResult<()>
    where
        H: FnMut(ListingPage<Asset>, bool) -> NexusResult<bool>,
    {
        let initial = PageRequest {
            scope: input.repository.clone(),
            continuation_token: input.continuation_token.clone(),
        };
        traverse(
            initial,
            |request| self.list_assets(&ListAssetsInput::from(request)),
            handle_page,
        )
    }

    /// Every asset in a repository
    pub fn list_all_assets(&self, repository: &str) -> NexusResult<Vec<Asset>> {
        collect_all(PageRequest::first(repository), |request| {
            self.list_assets(&ListAssetsInput::from(request))
        })
    }

    pub fn get_asset(&self, id: &str) -> NexusResult<Asset> {
        require_id(id)?;
        let policy = asset_policy(id, format!("Insufficient permissions to get asset {}", id));
        self.execute_json(&HttpRequest::get(endpoints::asset(id)), &policy)
    }

    pub fn delete_asset(&self, id: &str) -> NexusResult<()> {
        require_id(id)?;
        let policy = asset_policy(id, format!("Insufficient permissions to delete {}", id));
        self.execute(&HttpRequest::delete(endpoints::asset(id)), &policy)?;
        Ok(())
    }

    /// Fetch the content of an asset from its download URL
    pub fn download_asset(&self, asset: &Asset) -> NexusResult<Vec<u8>> {
        let path = asset
            .download_url
            .strip_prefix(self.base_url())
            .ok_or_else(|| {
                NexusError::InvalidArgument(format!(
                    "Download URL {} is not served by {}",
                    asset.download_url,
                    self.base_url()
                ))
            })?
            .trim_start_matches('/');

        self.execute(&HttpRequest::get(path), &ErrorPolicy::unmapped())
    }

    /// Download and check the content against the reported sha256, if any
    pub fn download_asset_verified(&self, asset: &Asset) -> NexusResult<Vec<u8>> {
        let data = self.download_asset(asset)?;

        if let Some(expected) = asset.checksum("sha256") {
            let actual = hex::encode(Sha256::digest(&data));
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(NexusError::Protocol(format!(
                    "sha256 mismatch for {}: expected {}, got {}",
                    asset.path, expected, actual
                )));
            }
        }

        Ok(data)
    }
}

fn asset_policy(id: &str, denied: String) -> ErrorPolicy {
    ErrorPolicy::from(
        StatusMap::new()
            .on(403, NexusError::PermissionDenied, denied)
            .on(404, NexusError::NotFound, format!("Asset {} does not exist", id))
            .on(422, NexusError::InvalidArgument, format!("Malformed asset ID: {}", id)),
    )
}

fn require_id(id: &str) -> NexusResult<()> {
    if id.is_empty() {
        return Err(NexusError::InvalidArgument("Asset ID is required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::mock::{FailureConfig, MockNexus, Route};
    use crate::transport::MockTransport;

    fn setup() -> (NexusClient, MockNexus) {
        let server = MockNexus::new();
        server.add_repository("raw-hosted", "raw", "hosted");
        let client = NexusClient::new(Arc::new(MockTransport::with_server(server.clone())));
        (client, server)
    }

    #[test]
    fn test_list_assets_first_page() {
        let (client, server) = setup();
        server.set_page_size(2);
        for path in ["a", "b", "c"] {
            server.add_asset("raw-hosted", path, b"x");
        }

        let page = client.list_assets(&ListAssetsInput::new("raw-hosted")).unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(!page.is_last());
    }

    #[test]
    fn test_list_all_assets_spans_pages() {
        let (client, server) = setup();
        server.set_page_size(2);
        for path in ["a", "b", "c", "d", "e"] {
            server.add_asset("raw-hosted", path, path.as_bytes());
        }

        let paths: Vec<String> = client
            .list_all_assets("raw-hosted")
            .unwrap()
            .into_iter()
            .map(|a| a.path)
            .collect();
        assert_eq!(paths, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(server.call_count(Route::ListAssets), 3);
    }

    #[test]
    fn test_list_assets_error_mapping() {
        let (client, server) = setup();

        let err = client.list_assets(&ListAssetsInput::new("missing")).unwrap_err();
        assert_eq!(err.to_string(), "Repository missing does not exist");

        server.inject_failure(Route::ListAssets, FailureConfig::status(403));
        let err = client.list_assets(&ListAssetsInput::new("raw-hosted")).unwrap_err();
        assert!(matches!(err, NexusError::PermissionDenied(ref m)
            if m == "Insufficient permissions to list assets in raw-hosted"));
    }

    #[test]
    fn test_unmapped_listing_status_names_repository() {
        let (client, server) = setup();
        server.inject_failure(Route::ListAssets, FailureConfig::status(500));

        let err = client.list_assets(&ListAssetsInput::new("raw-hosted")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "GET http://nexus.mock:8081/service/rest/v1/assets?repository=raw-hosted returned a status code of 500"
        );
    }

    #[test]
    fn test_list_assets_requires_repository() {
        let (client, server) = setup();
        let err = client.list_assets(&ListAssetsInput::default()).unwrap_err();
        assert!(matches!(err, NexusError::InvalidArgument(_)));
        assert!(server.calls().is_empty());
    }

    #[test]
    fn test_get_and_delete_asset() {
        let (client, server) = setup();
        let asset = server.add_asset("raw-hosted", "docs/readme.txt", b"hello");

        let fetched = client.get_asset(&asset.id).unwrap();
        assert_eq!(fetched, asset);

        client.delete_asset(&asset.id).unwrap();
        let err = client.get_asset(&asset.id).unwrap_err();
        assert_eq!(err.to_string(), format!("Asset {} does not exist", asset.id));
    }

    #[test]
    fn test_malformed_asset_id() {
        let (client, server) = setup();
        server.inject_failure(Route::GetAsset, FailureConfig::status(422));

        let err = client.get_asset("%%%").unwrap_err();
        assert_eq!(err.to_string(), "Malformed asset ID: %%%");
    }

    #[test]
    fn test_download_asset() {
        let (client, server) = setup();
        let asset = server.add_asset("raw-hosted", "dir/file.bin", b"\x00\x01payload");

        let data = client.download_asset(&asset).unwrap();
        assert_eq!(data, b"\x00\x01payload".to_vec());
        assert_eq!(server.calls().last().unwrap().path, "repository/raw-hosted/dir/file.bin");
    }

    #[test]
    fn test_download_from_foreign_host_rejected() {
        let (client, server) = setup();
        let mut asset = server.add_asset("raw-hosted", "a", b"a");
        asset.download_url = "http://elsewhere:8081/repository/raw-hosted/a".to_string();

        let err = client.download_asset(&asset).unwrap_err();
        assert!(matches!(err, NexusError::InvalidArgument(_)));
    }

    #[test]
    fn test_verified_download_detects_mismatch() {
        let (client, server) = setup();
        let asset = server.add_asset("raw-hosted", "a.txt", b"original");

        assert_eq!(client.download_asset_verified(&asset).unwrap(), b"original".to_vec());

        server.corrupt_download(&asset, b"tampered");
        let err = client.download_asset_verified(&asset).unwrap_err();
        assert!(matches!(err, NexusError::Protocol(ref m) if m.contains("sha256 mismatch")));
    }

    #[test]
    fn test_pages_handler_sees_last_flag() {
        let (client, server) = setup();
        server.set_page_size(1);
        server.add_asset("raw-hosted", "a", b"a");
        server.add_asset("raw-hosted", "b", b"b");

        let mut flags = Vec::new();
        client
            .list_assets_pages(&ListAssetsInput::new("raw-hosted"), |page, last| {
                assert_eq!(page.items.len(), 1);
                flags.push(last);
                Ok(true)
            })
            .unwrap();
        assert_eq!(flags, vec![false, true]);
    }
}
