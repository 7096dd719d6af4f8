//! Components
//!
//! Paginated listing per repository, lookup, deletion and multipart upload.
//! Uploads are checked against the format's upload spec before anything is
//! sent.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use nexus3_wire::endpoints::{self, QUERY_CONTINUATION_TOKEN, QUERY_REPOSITORY};
use nexus3_wire::{Component, Format, ListingPage};

use crate::client::{ErrorPolicy, NexusClient, StatusMap};
use crate::error::{NexusError, NexusResult};
use crate::paging::{collect_all, traverse, PageRequest};
use crate::transport::{FormPart, HttpRequest};

/// One page request of a component listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListComponentsInput {
    pub repository: String,
    pub continuation_token: Option<String>,
}

impl ListComponentsInput {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            continuation_token: None,
        }
    }
}

impl From<&PageRequest> for ListComponentsInput {
    fn from(request: &PageRequest) -> Self {
        Self {
            repository: request.scope.clone(),
            continuation_token: request.continuation_token.clone(),
        }
    }
}

/// A file to upload as part of a component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadAsset {
    pub file_name: String,
    pub content: Vec<u8>,
    /// Per-asset fields, e.g. `filename` for raw or `extension` for maven2
    pub config: BTreeMap<String, String>,
}

impl UploadAsset {
    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content,
            config: BTreeMap::new(),
        }
    }

    /// Read a file from disk; the part is named after the file's base name
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let content = fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Self::new(file_name, content))
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}

/// Parameters of a component upload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadComponentInput {
    pub repository: String,
    /// Upload format, e.g. `raw` or `maven2`
    pub component_type: String,
    pub component_config: BTreeMap<String, String>,
    pub assets: Vec<UploadAsset>,
}

impl UploadComponentInput {
    pub fn new(repository: impl Into<String>, component_type: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            component_type: component_type.into(),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.component_config.insert(key.into(), value.into());
        self
    }

    pub fn with_asset(mut self, asset: UploadAsset) -> Self {
        self.assets.push(asset);
        self
    }
}

impl NexusClient {
    /// One page of the components in a repository
    pub fn list_components(&self, input: &ListComponentsInput) -> NexusResult<ListingPage<Component>> {
        if input.repository.is_empty() {
            return Err(NexusError::InvalidArgument(
                "Repository is required to list components".to_string(),
            ));
        }

        let mut request = HttpRequest::get(endpoints::COMPONENTS)
            .with_query(QUERY_REPOSITORY, &input.repository);
        if let Some(token) = &input.continuation_token {
            request = request.with_query(QUERY_CONTINUATION_TOKEN, token);
        }

        let policy = ErrorPolicy::from(
            StatusMap::new()
                .on(
                    403,
                    NexusError::PermissionDenied,
                    format!("Insufficient permissions to list components in {}", input.repository),
                )
                .on(
                    404,
                    NexusError::NotFound,
                    format!("Repository {} does not exist", input.repository),
                ),
        );
        self.execute_json(&request, &policy)
    }

    /// Walk component pages starting at `input`; see [`traverse`]
    pub fn list_components_pages<H>(
        &self,
        input: &ListComponentsInput,
        handle_page: H,
    ) -> NexusResult<()>
    where
        H: FnMut(ListingPage<Component>, bool) -> NexusResult<bool>,
    {
        let initial = PageRequest {
            scope: input.repository.clone(),
            continuation_token: input.continuation_token.clone(),
        };
        traverse(
            initial,
            |request| self.list_components(&ListComponentsInput::from(request)),
            handle_page,
        )
    }

    /// Every component in a repository
    pub fn list_all_components(&self, repository: &str) -> NexusResult<Vec<Component>> {
        collect_all(PageRequest::first(repository), |request| {
            self.list_components(&ListComponentsInput::from(request))
        })
    }

    pub fn get_component(&self, id: &str) -> NexusResult<Component> {
        require_id(id)?;
        let policy = component_policy(id, format!("Insufficient permissions to get component {}", id));
        self.execute_json(&HttpRequest::get(endpoints::component(id)), &policy)
    }

    pub fn delete_component(&self, id: &str) -> NexusResult<()> {
        require_id(id)?;
        let policy = component_policy(id, format!("Insufficient permissions to delete {}", id));
        self.execute(&HttpRequest::delete(endpoints::component(id)), &policy)?;
        Ok(())
    }

    /// Upload a component after checking it against its format's spec
    pub fn upload_component(&self, input: &UploadComponentInput) -> NexusResult<()> {
        if input.repository.is_empty() {
            return Err(NexusError::InvalidArgument(
                "Repository is required to upload a component".to_string(),
            ));
        }
        if input.assets.is_empty() {
            return Err(NexusError::InvalidArgument(
                "At least one asset must be provided to upload a component".to_string(),
            ));
        }
        if input.component_type.is_empty() {
            return Err(NexusError::InvalidArgument(
                "Component type is required to upload a component".to_string(),
            ));
        }

        let format = self.get_format(&input.component_type)?;
        check_required_fields(input, &format)?;

        let request = HttpRequest::post(endpoints::COMPONENTS)
            .with_query(QUERY_REPOSITORY, &input.repository)
            .with_multipart(upload_parts(input));

        let policy = ErrorPolicy::from(
            StatusMap::new()
                .on(
                    403,
                    NexusError::PermissionDenied,
                    "Insufficient permissions to upload component",
                )
                .on(
                    404,
                    NexusError::NotFound,
                    format!("Repository {} does not exist", input.repository),
                ),
        );
        self.execute(&request, &policy)?;

        tracing::debug!(
            repository = %input.repository,
            component_type = %input.component_type,
            assets = input.assets.len(),
            "uploaded component"
        );
        Ok(())
    }
}

fn component_policy(id: &str, denied: String) -> ErrorPolicy {
    ErrorPolicy::from(
        StatusMap::new()
            .on(403, NexusError::PermissionDenied, denied)
            .on(404, NexusError::NotFound, format!("Component {} does not exist", id))
            .on(422, NexusError::InvalidArgument, format!("Malformed component ID: {}", id)),
    )
}

fn require_id(id: &str) -> NexusResult<()> {
    if id.is_empty() {
        return Err(NexusError::InvalidArgument("Component ID is required".to_string()));
    }
    Ok(())
}

/// Every non-optional field of the spec must be present; the file part
/// (`asset`) itself is not a config field
fn check_required_fields(input: &UploadComponentInput, format: &Format) -> NexusResult<()> {
    let component_fields = format.required_component_fields();
    if component_fields
        .iter()
        .any(|field| !input.component_config.contains_key(*field))
    {
        return Err(NexusError::InvalidArgument(format!(
            "{} requires the following component fields: [{}]",
            input.component_type,
            component_fields.join(", ")
        )));
    }

    let asset_fields = format.required_asset_fields();
    for asset in &input.assets {
        if asset_fields.iter().any(|field| !asset.config.contains_key(*field)) {
            return Err(NexusError::InvalidArgument(format!(
                "{} requires the following asset fields: [{}]",
                input.component_type,
                asset_fields.join(", ")
            )));
        }
    }

    Ok(())
}

/// Multipart fields: `{type}.{key}` for the component, then the files.
/// A single file is `{type}.asset` with fields `{type}.asset.{key}`;
/// several are numbered `{type}.asset{i}` and `{type}.asset{i}.{key}`.
fn upload_parts(input: &UploadComponentInput) -> Vec<FormPart> {
    let kind = &input.component_type;
    let mut parts: Vec<FormPart> = input
        .component_config
        .iter()
        .map(|(key, value)| FormPart::text(format!("{}.{}", kind, key), value.as_str()))
        .collect();

    let single = input.assets.len() == 1;
    for (index, asset) in input.assets.iter().enumerate() {
        let prefix = if single {
            format!("{}.asset", kind)
        } else {
            format!("{}.asset{}", kind, index)
        };

        parts.push(FormPart::file(
            prefix.as_str(),
            asset.file_name.as_str(),
            asset.content.clone(),
        ));
        for (key, value) in &asset.config {
            parts.push(FormPart::text(format!("{}.{}", prefix, key), value.as_str()));
        }
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    use crate::mock::{FailureConfig, MockNexus, Route};
    use crate::transport::{FormValue, MockTransport};

    fn setup() -> (NexusClient, MockNexus) {
        let server = MockNexus::new();
        server.add_repository("raw-hosted", "raw", "hosted");
        let client = NexusClient::new(Arc::new(MockTransport::with_server(server.clone())));
        (client, server)
    }

    fn raw_upload(files: &[&str]) -> UploadComponentInput {
        let mut input = UploadComponentInput::new("raw-hosted", "raw").with_field("directory", "/docs");
        for name in files {
            input = input.with_asset(
                UploadAsset::new(*name, name.as_bytes().to_vec()).with_field("filename", *name),
            );
        }
        input
    }

    #[test]
    fn test_single_asset_field_names() {
        let parts = upload_parts(&raw_upload(&["a.txt"]));
        let names: Vec<&str> = parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["raw.directory", "raw.asset", "raw.asset.filename"]);

        match &parts[1].value {
            FormValue::File { file_name, content } => {
                assert_eq!(file_name, "a.txt");
                assert_eq!(content, b"a.txt");
            }
            other => panic!("expected file part, got {other:?}"),
        }
    }

    #[test]
    fn test_multiple_asset_field_names() {
        let parts = upload_parts(&raw_upload(&["a.txt", "b.txt"]));
        let names: Vec<&str> = parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "raw.directory",
                "raw.asset0",
                "raw.asset0.filename",
                "raw.asset1",
                "raw.asset1.filename",
            ]
        );
    }

    #[test]
    fn test_upload_reaches_server() {
        let (client, server) = setup();
        client.upload_component(&raw_upload(&["a.txt"])).unwrap();

        let uploads = server.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].repository, "raw-hosted");
        assert_eq!(uploads[0].text("raw.directory"), Some("/docs"));
        assert_eq!(uploads[0].text("raw.asset.filename"), Some("a.txt"));
    }

    #[test]
    fn test_upload_requires_assets() {
        let (client, server) = setup();
        let input = UploadComponentInput::new("raw-hosted", "raw").with_field("directory", "/");

        let err = client.upload_component(&input).unwrap_err();
        assert_eq!(
            err.to_string(),
            "At least one asset must be provided to upload a component"
        );
        assert!(server.calls().is_empty());
    }

    #[test]
    fn test_upload_missing_component_field() {
        let (client, server) = setup();
        let input = UploadComponentInput::new("raw-hosted", "raw")
            .with_asset(UploadAsset::new("a", b"a".to_vec()).with_field("filename", "a"));

        let err = client.upload_component(&input).unwrap_err();
        assert_eq!(
            err.to_string(),
            "raw requires the following component fields: [directory]"
        );
        assert_eq!(server.call_count(Route::UploadComponent), 0);
    }

    #[test]
    fn test_upload_missing_asset_field() {
        let (client, _server) = setup();
        let input = UploadComponentInput::new("raw-hosted", "raw")
            .with_field("directory", "/")
            .with_asset(UploadAsset::new("a", b"a".to_vec()));

        let err = client.upload_component(&input).unwrap_err();
        assert_eq!(err.to_string(), "raw requires the following asset fields: [filename]");
    }

    #[test]
    fn test_upload_unknown_format() {
        let (client, _server) = setup();
        let input = UploadComponentInput::new("raw-hosted", "cobol")
            .with_asset(UploadAsset::new("a", b"a".to_vec()));

        let err = client.upload_component(&input).unwrap_err();
        assert_eq!(err.to_string(), "The format cobol does not exist");
    }

    #[test]
    fn test_upload_to_missing_repository() {
        let (client, _server) = setup();
        let mut input = raw_upload(&["a.txt"]);
        input.repository = "nowhere".to_string();

        let err = client.upload_component(&input).unwrap_err();
        assert_eq!(err.to_string(), "Repository nowhere does not exist");
    }

    #[test]
    fn test_upload_permission_denied() {
        let (client, server) = setup();
        server.inject_failure(Route::UploadComponent, FailureConfig::status(403));

        let err = client.upload_component(&raw_upload(&["a.txt"])).unwrap_err();
        assert!(matches!(err, NexusError::PermissionDenied(_)));
    }

    #[test]
    fn test_upload_asset_from_path() {
        let mut temp = tempfile::NamedTempFile::new().unwrap();
        temp.write_all(b"from disk").unwrap();

        let asset = UploadAsset::from_path(temp.path()).unwrap();
        assert_eq!(asset.content, b"from disk".to_vec());
        assert_eq!(
            asset.file_name,
            temp.path().file_name().unwrap().to_string_lossy()
        );
    }

    #[test]
    fn test_list_get_delete_components() {
        let (client, server) = setup();
        server.set_page_size(1);
        let first = server.add_component("raw-hosted", "docs", Some("1.0"), &[("docs/a", &b"a"[..])]);
        server.add_component("raw-hosted", "docs", Some("2.0"), &[("docs/b", &b"b"[..])]);

        let all = client.list_all_components("raw-hosted").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].version.as_deref(), Some("1.0"));
        assert_eq!(all[0].assets.len(), 1);

        assert_eq!(client.get_component(&first.id).unwrap(), first);
        client.delete_component(&first.id).unwrap();
        let err = client.get_component(&first.id).unwrap_err();
        assert_eq!(err.to_string(), format!("Component {} does not exist", first.id));
    }

    #[test]
    fn test_list_components_unknown_repository() {
        let (client, _server) = setup();
        let err = client
            .list_components(&ListComponentsInput::new("nope"))
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
