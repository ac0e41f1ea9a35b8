use serde::{Deserialize, Serialize};

use super::server::ServerSpec;
use super::service::ServiceSpec;

/// Descriptor of a deployable artifact, i.e. what an artifact resolver yields for a URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSpec {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Source locator the artifact was obtained from.
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub services: Vec<ServiceSpec>,
    #[serde(default)]
    pub servers: Vec<ServerSpec>,
}

fn default_version() -> String {
    "0.0.0".to_string()
}

impl ArtifactSpec {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            version: default_version(),
            uri: String::new(),
            services: Vec::new(),
            servers: Vec::new(),
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    pub fn with_service(mut self, service: ServiceSpec) -> Self {
        self.services.push(service);
        self
    }

    pub fn with_server(mut self, server: ServerSpec) -> Self {
        self.servers.push(server);
        self
    }
}

/// A registered artifact. Its services live in the registry's service index and are
/// referenced here by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    id: String,
    name: String,
    version: String,
    uri: String,
    service_ids: Vec<String>,
    servers: Vec<ServerSpec>,
    /// Number of currently started services of this artifact.
    usage: usize,
}

impl Artifact {
    pub fn from_spec(spec: &ArtifactSpec) -> Self {
        Self {
            id: spec.id.clone(),
            name: spec.name.clone(),
            version: spec.version.clone(),
            uri: spec.uri.clone(),
            service_ids: spec.services.iter().map(|s| s.id.clone()).collect(),
            servers: spec.servers.clone(),
            usage: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn service_ids(&self) -> &[String] {
        &self.service_ids
    }

    pub fn servers(&self) -> &[ServerSpec] {
        &self.servers
    }

    pub fn usage(&self) -> usize {
        self.usage
    }

    pub fn is_in_use(&self) -> bool {
        self.usage > 0
    }

    /// Adds `delta` to the usage counter, never dropping below zero.
    pub fn adjust_usage(&mut self, delta: i64) -> usize {
        self.usage = if delta < 0 {
            self.usage.saturating_sub(delta.unsigned_abs() as usize)
        } else {
            self.usage.saturating_add(delta as usize)
        };
        self.usage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::kind::ServiceKind;

    #[test]
    fn test_descriptor_parse() {
        let json = r#"{
            "id": "a1",
            "services": [
                {"id": "s1", "name": "Source", "kind": "SOURCE",
                 "outputs": [{"name": "raw", "data_type": "Double"}]},
                {"id": "s2", "name": "Sink", "kind": "SINK",
                 "inputs": [{"name": "raw"}]}
            ],
            "servers": [{"id": "broker", "port": 9000}]
        }"#;
        let spec: ArtifactSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.services.len(), 2);
        assert_eq!(spec.services[0].kind, ServiceKind::Source);
        assert!(spec.services[1].deployable);
        assert_eq!(spec.servers[0].host, "localhost");

        let artifact = Artifact::from_spec(&spec);
        assert_eq!(artifact.service_ids(), ["s1".to_string(), "s2".to_string()]);
        assert_eq!(artifact.usage(), 0);
    }

    #[test]
    fn test_usage_never_negative() {
        let mut artifact = Artifact::from_spec(&ArtifactSpec::new("a"));
        assert_eq!(artifact.adjust_usage(2), 2);
        assert_eq!(artifact.adjust_usage(-1), 1);
        assert_eq!(artifact.adjust_usage(-5), 0);
        assert!(!artifact.is_in_use());
    }
}
