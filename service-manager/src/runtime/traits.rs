use anyhow::Result;
use async_trait::async_trait;
use edgeflow_api::{Service, ServiceState};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::layout::ConnectorView;

/// Everything a substrate needs to bring up one service process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentRequest {
    pub service_id: String,
    pub artifact_id: String,
    /// Source locator of the artifact holding the implementation.
    pub artifact_uri: String,
    pub args: Vec<String>,
    /// Memory cap in MiB.
    pub memory: Option<u64>,
    /// Functions bound in the process, `;`-separated.
    pub function_definition: String,
    /// Bindings to route through an external transport.
    pub external_connections: Vec<ConnectorView>,
    /// Ensemble members hosted by the same process.
    pub ensemble_members: Vec<String>,
    /// Address the control stub will connect to.
    pub admin_address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeploymentState {
    Deploying,
    Deployed,
    Undeploying,
    Undeployed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub state: DeploymentState,
    /// Diagnostic output, reported with failures.
    pub log: String,
}

impl StatusReport {
    pub fn new(state: DeploymentState) -> Self {
        Self {
            state,
            log: String::new(),
        }
    }

    pub fn failed(log: impl Into<String>) -> Self {
        Self {
            state: DeploymentState::Failed,
            log: log.into(),
        }
    }
}

/// Runs service processes: local processes, containers, remote nodes.
#[async_trait]
pub trait Substrate: Send + Sync {
    /// Starts a deployment and returns its id. The deployment settles asynchronously,
    /// see [`Substrate::status`].
    async fn deploy(&self, request: &DeploymentRequest) -> Result<String>;

    async fn status(&self, deployment_id: &str) -> Result<StatusReport>;

    /// Starts tearing a deployment down.
    async fn undeploy(&self, deployment_id: &str) -> Result<()>;

    /// Moves a stopped service to another resource.
    async fn relocate(&self, service_id: &str, resource: &str) -> Result<()> {
        anyhow::bail!(
            "relocating '{}' to '{}' is not supported by this substrate",
            service_id,
            resource
        )
    }
}

/// Control channel into a running service implementation.
#[async_trait]
pub trait ControlStub: Send + Sync {
    async fn activate(&self) -> Result<()>;

    async fn passivate(&self) -> Result<()>;

    async fn reconfigure(&self, values: &HashMap<String, String>) -> Result<()>;

    async fn state(&self) -> Result<ServiceState>;

    /// Forwards a state change. Returns the state the service reports afterwards,
    /// which differs if it moved on by itself.
    async fn set_state(&self, state: ServiceState) -> Result<ServiceState>;
}

#[async_trait]
pub trait StubFactory: Send + Sync {
    async fn attach(&self, service: &Service) -> Result<Arc<dyn ControlStub>>;
}

/// Registry of network endpoints shared by all services on a device.
pub trait NetworkManager: Send + Sync {
    /// Registers an address under `key`: the given one, or a freshly allocated local port.
    /// Reserving an already registered key returns its address.
    fn reserve_port(&self, key: &str, address: Option<&str>) -> Result<String>;

    fn release_port(&self, key: &str) -> Result<()>;

    fn port(&self, key: &str) -> Option<String>;

    /// Number of users registered for `key`.
    fn registered_instances(&self, key: &str) -> usize;

    fn register_instance(&self, key: &str);

    fn unregister_instance(&self, key: &str);
}

/// Key under which the control address of a service is registered.
pub fn admin_key(service_id: &str) -> String {
    format!("admin_{}", service_id)
}
