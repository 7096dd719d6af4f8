//! REST resources
//!
//! `impl NexusClient` blocks for repositories, assets, components, formats
//! and blob stores.

mod assets;
pub(crate) mod blobstores;
mod components;
mod formats;
mod repositories;

pub use assets::ListAssetsInput;
pub use blobstores::{
    CREATE_BLOBSTORE_SCRIPT_NAME, DELETE_BLOBSTORE_SCRIPT_NAME, LIST_BLOBSTORES_SCRIPT_NAME,
};
pub use components::{ListComponentsInput, UploadAsset, UploadComponentInput};
