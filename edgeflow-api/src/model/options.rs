//! Options accepted by a start request.
//!
//! Options travel as a flat string map, each value being a JSON document:
//!
//! | key         | JSON shape                          |
//! |-------------|-------------------------------------|
//! | `ensemble`  | `{"member": "leader"}`              |
//! | `args`      | `["--flag", "value"]`               |
//! | `servers`   | `{"server": "host"}`                |
//! | `params`    | `{"service": {"name": value}}`      |
//! | `memLimits` | `{"service": 512}` (MiB)            |

use log::warn;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{ApiError, Result};

pub const OPTION_ENSEMBLE: &str = "ensemble";
pub const OPTION_ARGS: &str = "args";
pub const OPTION_SERVERS: &str = "servers";
pub const OPTION_PARAMS: &str = "params";
pub const OPTION_MEMORY_LIMITS: &str = "memLimits";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartOptions {
    /// Ensemble member id -> leader id, overriding the declared leaders for one start.
    pub ensemble: HashMap<String, String>,
    /// Extra command-line tokens appended for every deployed service.
    pub args: Vec<String>,
    /// Server id -> host, overriding the host declared by the artifact.
    pub servers: HashMap<String, String>,
    /// Service id -> parameter name -> value, applied once the service runs.
    pub params: HashMap<String, HashMap<String, String>>,
    /// Service id -> memory limit in MiB.
    pub mem_limits: HashMap<String, u64>,
}

impl StartOptions {
    /// Parses the flat option map. Unknown keys are ignored.
    pub fn from_map(options: &HashMap<String, String>) -> Result<Self> {
        let mut result = StartOptions::default();
        for (key, value) in options {
            match key.as_str() {
                OPTION_ENSEMBLE => result.ensemble = parse(key, value)?,
                OPTION_ARGS => result.args = parse(key, value)?,
                OPTION_SERVERS => result.servers = parse(key, value)?,
                OPTION_PARAMS => {
                    let raw: HashMap<String, HashMap<String, Value>> = parse(key, value)?;
                    result.params = raw
                        .into_iter()
                        .map(|(service, values)| {
                            let values = values
                                .into_iter()
                                .map(|(name, value)| (name, value_to_string(value)))
                                .collect();
                            (service, values)
                        })
                        .collect();
                }
                OPTION_MEMORY_LIMITS => result.mem_limits = parse(key, value)?,
                _ => warn!("Ignoring unknown start option '{}'", key),
            }
        }
        Ok(result)
    }

    pub fn is_empty(&self) -> bool {
        *self == StartOptions::default()
    }

    /// Leader override for `member`, if any.
    pub fn leader_of(&self, member: &str) -> Option<&str> {
        self.ensemble.get(member).map(String::as_str)
    }

    pub fn params_for(&self, service: &str) -> Option<&HashMap<String, String>> {
        self.params.get(service)
    }

    pub fn memory_limit(&self, service: &str) -> Option<u64> {
        self.mem_limits.get(service).copied()
    }

    pub fn server_host(&self, server: &str) -> Option<&str> {
        self.servers.get(server).map(String::as_str)
    }
}

fn parse<T: DeserializeOwned>(key: &str, value: &str) -> Result<T> {
    serde_json::from_str(value).map_err(|e| ApiError::MalformedOption {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

// Parameter values are passed on as plain strings; JSON strings lose their quotes.
fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
