use edgeflow_api::ServiceState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Administrative commands accepted by a service manager.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum AdminCommand {
    AddArtifact {
        uri: String,
    },
    RemoveArtifact {
        id: String,
    },
    StartService {
        ids: Vec<String>,
        #[serde(default)]
        options: HashMap<String, String>,
    },
    StopService {
        ids: Vec<String>,
    },
    MigrateService {
        id: String,
        resource: String,
    },
    SwitchToService {
        old: String,
        new: String,
    },
    PassivateService {
        id: String,
    },
    ActivateService {
        id: String,
    },
    ReconfigureService {
        id: String,
        values: HashMap<String, String>,
    },
    GetServiceState {
        id: String,
    },
    SetServiceState {
        id: String,
        state: ServiceState,
    },
    GetServiceInstanceCount {
        id: String,
    },
    ListArtifacts,
    Shutdown,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum AdminResponse {
    Success(String),
    Id(String),
    State(ServiceState),
    Count(usize),
    Artifacts(Vec<ArtifactSummary>),
    Error { kind: ErrorKind, message: String },
}

impl AdminResponse {
    pub fn is_error(&self) -> bool {
        matches!(self, AdminResponse::Error { .. })
    }
}

/// Category of a failed command, so callers can react without parsing messages.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    UnknownEntity,
    DuplicateId,
    IllegalState,
    DeploymentFailure,
    AggregatedFailure,
    Unimplemented,
    Collaborator,
    Config,
    Protocol,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ArtifactSummary {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub usage: usize,
    pub services: Vec<ServiceSummary>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServiceSummary {
    pub id: String,
    pub state: ServiceState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_format() {
        let json = r#"{"StartService":{"ids":["a","b"]}}"#;
        let command: AdminCommand = serde_json::from_str(json).unwrap();
        assert_eq!(
            command,
            AdminCommand::StartService {
                ids: vec!["a".to_string(), "b".to_string()],
                options: HashMap::new(),
            }
        );

        let shutdown: AdminCommand = serde_json::from_str(r#""Shutdown""#).unwrap();
        assert_eq!(shutdown, AdminCommand::Shutdown);
    }

    #[test]
    fn test_response_wire_format() {
        let response = AdminResponse::State(ServiceState::Passivated);
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"State":"PASSIVATED"}"#
        );
    }
}
