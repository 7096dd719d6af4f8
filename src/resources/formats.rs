//! Upload formats

use nexus3_wire::{endpoints, Format};

use crate::client::{ErrorPolicy, NexusClient, StatusMap};
use crate::error::{NexusError, NexusResult};
use crate::transport::HttpRequest;

impl NexusClient {
    /// Upload specs of every format the server supports
    pub fn list_formats(&self) -> NexusResult<Vec<Format>> {
        self.execute_json(
            &HttpRequest::get(endpoints::FORMATS_UPLOAD_SPECS),
            &ErrorPolicy::unmapped(),
        )
    }

    /// Upload spec of one format
    pub fn get_format(&self, name: &str) -> NexusResult<Format> {
        let policy = ErrorPolicy::from(StatusMap::new().on(
            404,
            NexusError::NotFound,
            format!("The format {} does not exist", name),
        ));
        self.execute_json(&HttpRequest::get(endpoints::format_upload_specs(name)), &policy)
    }
}
