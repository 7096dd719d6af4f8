//! Mock Nexus State Management
//!
//! Scripts, repositories, assets, components, formats and blob stores held
//! by the mock server.

use std::collections::{BTreeMap, HashMap};

use nexus3_wire::{
    Asset, BlobStore, BlobStoreConfig, BlobStoreQuotaStatus, Component, Format, FormatField,
    Repository, Script,
};

use crate::transport::{FormPart, FormValue, Method};

use super::failure::Route;

/// One request seen by the mock server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub method: Method,
    pub path: String,
    /// None for paths the server does not know
    pub route: Option<Route>,
}

/// A multipart upload accepted by the components endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRecord {
    pub repository: String,
    pub parts: Vec<FormPart>,
}

impl UploadRecord {
    /// Text value of the field named `name`
    pub fn text(&self, name: &str) -> Option<&str> {
        self.parts.iter().find(|p| p.name == name).and_then(|p| match &p.value {
            FormValue::Text(text) => Some(text.as_str()),
            FormValue::File { .. } => None,
        })
    }

    /// Names of all fields, in submission order
    pub fn field_names(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.name.as_str()).collect()
    }
}

/// Mock server state container
#[derive(Debug, Default)]
pub struct MockState {
    /// Stored scripts in creation order
    pub scripts: Vec<Script>,
    pub repositories: Vec<Repository>,
    /// Assets per repository, in listing order
    pub assets: BTreeMap<String, Vec<Asset>>,
    /// Components per repository, in listing order
    pub components: BTreeMap<String, Vec<Component>>,
    pub formats: Vec<Format>,
    pub blob_stores: Vec<BlobStore>,
    pub quota_statuses: HashMap<String, BlobStoreQuotaStatus>,
    /// Download bodies keyed by path below the server root
    pub downloads: HashMap<String, Vec<u8>>,
    pub uploads: Vec<UploadRecord>,
    pub calls: Vec<CallRecord>,
    /// Counter for generating unique IDs
    id_counter: u64,
}

impl MockState {
    /// State of a freshly installed server: a `default` file blob store and
    /// the `raw` upload format
    pub fn new() -> Self {
        let mut state = Self::default();
        state.blob_stores.push(file_blob_store("default"));
        state.formats.push(raw_format());
        state
    }

    /// Generate a unique ID
    pub fn next_id(&mut self, prefix: &str) -> String {
        self.id_counter += 1;
        format!("{}-{:08x}", prefix, self.id_counter)
    }

    pub fn script(&self, name: &str) -> Option<&Script> {
        self.scripts.iter().find(|s| s.name == name)
    }

    pub fn script_mut(&mut self, name: &str) -> Option<&mut Script> {
        self.scripts.iter_mut().find(|s| s.name == name)
    }

    /// Remove a script, returning whether it existed
    pub fn remove_script(&mut self, name: &str) -> bool {
        let before = self.scripts.len();
        self.scripts.retain(|s| s.name != name);
        self.scripts.len() != before
    }

    pub fn has_repository(&self, name: &str) -> bool {
        self.repositories.iter().any(|r| r.name == name)
    }

    pub fn find_asset(&self, id: &str) -> Option<&Asset> {
        self.assets.values().flatten().find(|a| a.id == id)
    }

    /// Remove an asset from its repository listing and any component
    pub fn remove_asset(&mut self, id: &str) -> bool {
        let mut removed = false;
        for assets in self.assets.values_mut() {
            let before = assets.len();
            assets.retain(|a| a.id != id);
            removed |= assets.len() != before;
        }
        for component in self.components.values_mut().flatten() {
            component.assets.retain(|a| a.id != id);
        }
        removed
    }

    pub fn find_component(&self, id: &str) -> Option<&Component> {
        self.components.values().flatten().find(|c| c.id == id)
    }

    /// Remove a component together with its assets
    pub fn remove_component(&mut self, id: &str) -> bool {
        let Some(component) = self.find_component(id).cloned() else {
            return false;
        };
        for asset in &component.assets {
            self.remove_asset(&asset.id);
        }
        for components in self.components.values_mut() {
            components.retain(|c| c.id != id);
        }
        true
    }

    pub fn find_format(&self, name: &str) -> Option<&Format> {
        self.formats.iter().find(|f| f.name == name)
    }

    pub fn blob_store(&self, name: &str) -> Option<&BlobStore> {
        self.blob_stores.iter().find(|b| b.name() == Some(name))
    }

    /// Number of recorded calls routed to `route`
    pub fn call_count(&self, route: Route) -> usize {
        self.calls.iter().filter(|c| c.route == Some(route)).count()
    }
}

/// A started, writable file blob store named `name`
pub fn file_blob_store(name: &str) -> BlobStore {
    store_of_type(name, "File")
}

pub fn store_of_type(name: &str, store_type: &str) -> BlobStore {
    BlobStore {
        writable: Some(true),
        started: Some(true),
        storage_available: Some(true),
        config: Some(BlobStoreConfig {
            writable: Some(true),
            store_type: Some(store_type.to_string()),
            name: Some(name.to_string()),
        }),
        ..BlobStore::default()
    }
}

/// Upload spec of the `raw` format as shipped with Nexus 3
fn raw_format() -> Format {
    let field = |name: &str, field_type: &str, optional: bool, group: &str| FormatField {
        name: name.to_string(),
        field_type: field_type.to_string(),
        description: None,
        optional,
        group: Some(group.to_string()),
    };

    Format {
        name: "raw".to_string(),
        multiple_upload: true,
        component_fields: vec![field("directory", "STRING", false, "Component attributes")],
        asset_fields: vec![
            field("asset", "FILE", false, "Asset attributes"),
            field("filename", "STRING", false, "Asset attributes"),
        ],
    }
}
