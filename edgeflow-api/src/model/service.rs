use serde::{Deserialize, Serialize};

use super::connector::Connector;
use super::kind::ServiceKind;
use super::parameter::ParameterDescriptor;
use super::state::ServiceState;

/// Descriptor of a service as shipped inside an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub kind: ServiceKind,
    /// Relocatable (`true`) or fixed to the device it was added to.
    #[serde(default = "default_deployable")]
    pub deployable: bool,
    /// Id of the service this one is co-located with in one process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ensemble_leader: Option<String>,
    #[serde(default)]
    pub inputs: Vec<Connector>,
    #[serde(default)]
    pub outputs: Vec<Connector>,
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    /// Memory cap in MiB, `None` leaves it to the substrate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,
    /// Command-line tokens always passed to the service implementation.
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_version() -> String {
    "0.0.0".to_string()
}

fn default_deployable() -> bool {
    true
}

impl ServiceSpec {
    pub fn new(id: impl Into<String>, kind: ServiceKind) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            version: default_version(),
            kind,
            deployable: true,
            ensemble_leader: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            parameters: Vec::new(),
            memory: None,
            args: Vec::new(),
        }
    }

    /// Adds an input connector on channel `name`.
    pub fn input(mut self, name: &str, data_type: &str) -> Self {
        self.inputs.push(Connector::new(name, self.id.as_str(), data_type));
        self
    }

    /// Adds an output connector on channel `name`.
    pub fn output(mut self, name: &str, data_type: &str) -> Self {
        self.outputs.push(Connector::new(name, self.id.as_str(), data_type));
        self
    }

    pub fn leader(mut self, leader: &str) -> Self {
        self.ensemble_leader = Some(leader.to_string());
        self
    }

    pub fn parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }
}

/// A registered service: its descriptor plus the runtime view the manager keeps of it.
///
/// Back-references to the owning artifact and to the ensemble leader are plain ids,
/// resolved through the registry when needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    id: String,
    name: String,
    description: String,
    version: String,
    kind: ServiceKind,
    deployable: bool,
    state: ServiceState,
    artifact_id: String,
    /// Leader as declared by the descriptor.
    declared_leader: Option<String>,
    /// Leader in effect, possibly overridden by a start option.
    ensemble_leader: Option<String>,
    inputs: Vec<Connector>,
    outputs: Vec<Connector>,
    parameters: Vec<ParameterDescriptor>,
    memory: Option<u64>,
    args: Vec<String>,
}

impl Service {
    /// Creates the registry entry for `spec` owned by artifact `artifact_id`.
    pub fn from_spec(spec: &ServiceSpec, artifact_id: &str) -> Self {
        Self {
            id: spec.id.clone(),
            name: spec.name.clone(),
            description: spec.description.clone(),
            version: spec.version.clone(),
            kind: spec.kind,
            deployable: spec.deployable,
            state: ServiceState::Available,
            artifact_id: artifact_id.to_string(),
            declared_leader: spec.ensemble_leader.clone(),
            ensemble_leader: spec.ensemble_leader.clone(),
            inputs: spec.inputs.iter().map(|c| c.owned_by(&spec.id)).collect(),
            outputs: spec.outputs.iter().map(|c| c.owned_by(&spec.id)).collect(),
            parameters: spec.parameters.clone(),
            memory: spec.memory,
            args: spec.args.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn is_deployable(&self) -> bool {
        self.deployable
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    pub fn ensemble_leader(&self) -> Option<&str> {
        self.ensemble_leader.as_deref()
    }

    pub fn declared_leader(&self) -> Option<&str> {
        self.declared_leader.as_deref()
    }

    /// A top-level service has no ensemble leader. It may lead others.
    pub fn is_top_level(&self) -> bool {
        self.ensemble_leader.is_none()
    }

    pub fn inputs(&self) -> &[Connector] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Connector] {
        &self.outputs
    }

    /// All connectors, inputs first.
    pub fn connectors(&self) -> impl Iterator<Item = &Connector> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    pub fn has_input(&self, channel: &str) -> bool {
        self.inputs.iter().any(|c| c.name() == channel)
    }

    pub fn has_output(&self, channel: &str) -> bool {
        self.outputs.iter().any(|c| c.name() == channel)
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    pub fn memory(&self) -> Option<u64> {
        self.memory
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Sets the state without validation. Validation belongs to the registry.
    pub fn set_state(&mut self, state: ServiceState) {
        self.state = state;
    }

    pub fn set_ensemble_leader(&mut self, leader: Option<String>) {
        self.ensemble_leader = leader;
    }

    /// Restores the leader declared by the descriptor.
    pub fn reset_ensemble_leader(&mut self) {
        self.ensemble_leader = self.declared_leader.clone();
    }
}
