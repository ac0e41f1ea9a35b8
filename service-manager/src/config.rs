use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;

/// Prefix of the environment variables overriding the file settings,
/// e.g. `EDGEFLOW__POLL_INTERVAL_MS=50`.
pub const ENV_PREFIX: &str = "EDGEFLOW";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ManagerConfig {
    pub log_level: String,

    /// Directory scanned for artifact descriptors at startup.
    pub artifacts_dir: Option<String>,

    // Substrate polling
    pub poll_interval_ms: u64,
    pub deploy_timeout_ms: u64,
    pub stop_timeout_ms: u64,
    pub ensemble_timeout_ms: u64,
    /// Timeout of one request to a service's admin port.
    pub control_timeout_ms: u64,

    // Identities of this device, matched against server hosts
    pub hostname: String,
    pub device_id: String,
    pub host_ids: Vec<String>,

    /// Server ids never started on this device.
    pub disabled_servers: Vec<String>,

    pub port_range_start: u16,
    pub port_range_end: u16,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            artifacts_dir: None,

            poll_interval_ms: 200,
            deploy_timeout_ms: 10_000,
            stop_timeout_ms: 10_000,
            ensemble_timeout_ms: 5_000,
            control_timeout_ms: 5_000,

            hostname: std::env::var("HOSTNAME").unwrap_or_default(),
            device_id: String::new(),
            host_ids: Vec::new(),

            disabled_servers: Vec::new(),

            port_range_start: 7000,
            port_range_end: 7999,
        }
    }
}

impl ManagerConfig {
    /// Loads the configuration from an optional file, overridden by `EDGEFLOW__*` variables.
    /// Missing settings keep their defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        builder = match path {
            Some(path) => builder.add_source(config::File::from(path)),
            None => builder.add_source(config::File::with_name("edgeflow").required(false)),
        };
        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn deploy_timeout(&self) -> Duration {
        Duration::from_millis(self.deploy_timeout_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    pub fn ensemble_timeout(&self) -> Duration {
        Duration::from_millis(self.ensemble_timeout_ms)
    }

    pub fn control_timeout(&self) -> Duration {
        Duration::from_millis(self.control_timeout_ms)
    }

    /// Whether `host` denotes this device.
    pub fn is_this_device(&self, host: &str) -> bool {
        host == "localhost"
            || host == "127.0.0.1"
            || (!self.hostname.is_empty() && host == self.hostname)
            || (!self.device_id.is_empty() && host == self.device_id)
            || self.host_ids.iter().any(|id| id == host)
    }

    pub fn is_server_disabled(&self, server_id: &str) -> bool {
        self.disabled_servers.iter().any(|id| id == server_id)
    }
}
