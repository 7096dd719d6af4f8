//! Repositories

use nexus3_wire::{endpoints, Repository};

use crate::client::{ErrorPolicy, NexusClient};
use crate::error::NexusResult;
use crate::transport::HttpRequest;

impl NexusClient {
    /// All repositories visible to the configured user
    pub fn list_repositories(&self) -> NexusResult<Vec<Repository>> {
        self.execute_json(&HttpRequest::get(endpoints::REPOSITORIES), &ErrorPolicy::unmapped())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::mock::MockNexus;
    use crate::transport::MockTransport;

    #[test]
    fn test_list_repositories() {
        let server = MockNexus::new();
        server.add_repository("maven-releases", "maven2", "hosted");
        server.add_repository("npm-proxy", "npm", "proxy");
        let client = NexusClient::new(Arc::new(MockTransport::with_server(server)));

        let repos = client.list_repositories().unwrap();
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].name, "maven-releases");
        assert_eq!(repos[1].repo_type, "proxy");
        assert_eq!(repos[1].url, "http://nexus.mock:8081/repository/npm-proxy");
    }
}
