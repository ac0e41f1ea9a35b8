//! Messages between the service manager and a running service implementation.

use edgeflow_api::ServiceState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ControlRequest {
    Activate,
    Passivate,
    Reconfigure { values: HashMap<String, String> },
    GetState,
    SetState { state: ServiceState },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ControlResponse {
    Ok,
    /// The state the service reports, possibly after moving on autonomously.
    State(ServiceState),
    Error(String),
}
