use serde::{Deserialize, Serialize};

/// A host-pinned auxiliary server carried by an artifact.
///
/// Several application instances may declare the same server; it is started once per
/// device and shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSpec {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Host the server is pinned to. Remapped by the `servers` start option.
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    /// Key under which the server factory knows the implementation.
    #[serde(default)]
    pub implementation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_version() -> String {
    "0.0.0".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

impl ServerSpec {
    pub fn new(id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            implementation: id.clone(),
            id,
            version: default_version(),
            host: host.into(),
            port,
            memory: None,
            args: Vec::new(),
        }
    }

    /// `host:port` as announced to the network manager.
    pub fn address(&self, host: &str) -> String {
        format!("{}:{}", host, self.port)
    }
}
