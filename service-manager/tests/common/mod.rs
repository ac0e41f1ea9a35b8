#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use edgeflow_api::{ArtifactSpec, ServerSpec, Service, ServiceKind, ServiceSpec, ServiceState};
use service_manager::event_bus::{Mutation, NotificationSink, Topic};
use service_manager::layout::{AlwaysAvailable, AvailabilityPredicate};
use service_manager::registry::ArtifactResolver;
use service_manager::runtime::{
    ControlStub, DeploymentRequest, DeploymentState, LocalNetworkManager, StatusReport,
    StubFactory, Substrate,
};
use service_manager::servers::{Server, ServerFactory};
use service_manager::{Collaborators, ManagerConfig, Orchestrator};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

// --- Mock Substrate ---
#[derive(Default)]
pub struct MockSubstrate {
    pub deployed: Mutex<Vec<DeploymentRequest>>,
    pub undeployed: Mutex<Vec<String>>,
    pub relocated: Mutex<Vec<(String, String)>>,
    /// Services whose deployment reports a failure.
    pub failing: Mutex<HashSet<String>>,
    /// Services whose deployment never settles.
    pub hanging: Mutex<HashSet<String>>,
    /// Services whose undeploy call errors.
    pub refusing_undeploy: Mutex<HashSet<String>>,
    /// Services reporting a failure once undeployed.
    pub crashing_on_stop: Mutex<HashSet<String>>,
    stopped: Mutex<HashSet<String>>,
}

impl MockSubstrate {
    pub fn fail(&self, service_id: &str) {
        self.failing.lock().unwrap().insert(service_id.to_string());
    }

    pub fn hang(&self, service_id: &str) {
        self.hanging.lock().unwrap().insert(service_id.to_string());
    }

    pub fn refuse_undeploy(&self, service_id: &str) {
        self.refusing_undeploy
            .lock()
            .unwrap()
            .insert(service_id.to_string());
    }

    pub fn crash_on_stop(&self, service_id: &str) {
        self.crashing_on_stop
            .lock()
            .unwrap()
            .insert(service_id.to_string());
    }

    pub fn deployed_ids(&self) -> Vec<String> {
        self.deployed
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.service_id.clone())
            .collect()
    }

    pub fn request_of(&self, service_id: &str) -> Option<DeploymentRequest> {
        self.deployed
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.service_id == service_id)
            .cloned()
    }

    pub fn undeployed_ids(&self) -> Vec<String> {
        self.undeployed.lock().unwrap().clone()
    }
}

fn service_of(deployment_id: &str) -> &str {
    deployment_id.strip_prefix("dep-").unwrap_or(deployment_id)
}

#[async_trait]
impl Substrate for MockSubstrate {
    async fn deploy(&self, request: &DeploymentRequest) -> Result<String> {
        self.deployed.lock().unwrap().push(request.clone());
        self.stopped.lock().unwrap().remove(&request.service_id);
        Ok(format!("dep-{}", request.service_id))
    }

    async fn status(&self, deployment_id: &str) -> Result<StatusReport> {
        let service = service_of(deployment_id);
        if self.failing.lock().unwrap().contains(service) {
            return Ok(StatusReport::failed(format!("{} crashed", service)));
        }
        if self.stopped.lock().unwrap().contains(service) {
            return Ok(StatusReport::new(DeploymentState::Undeployed));
        }
        if self.hanging.lock().unwrap().contains(service) {
            return Ok(StatusReport::new(DeploymentState::Deploying));
        }
        Ok(StatusReport::new(DeploymentState::Deployed))
    }

    async fn undeploy(&self, deployment_id: &str) -> Result<()> {
        let service = service_of(deployment_id).to_string();
        self.undeployed.lock().unwrap().push(service.clone());
        if self.refusing_undeploy.lock().unwrap().contains(&service) {
            anyhow::bail!("{} cannot be undeployed", service);
        }
        if self.crashing_on_stop.lock().unwrap().contains(&service) {
            self.failing.lock().unwrap().insert(service.clone());
        }
        self.stopped.lock().unwrap().insert(service);
        Ok(())
    }

    async fn relocate(&self, service_id: &str, resource: &str) -> Result<()> {
        self.relocated
            .lock()
            .unwrap()
            .push((service_id.to_string(), resource.to_string()));
        Ok(())
    }
}

// --- Mock Control Stubs ---
pub struct MockStub {
    id: String,
    calls: Arc<Mutex<Vec<String>>>,
    reject: Arc<Mutex<HashSet<String>>>,
    reported: Arc<Mutex<HashMap<String, ServiceState>>>,
}

impl MockStub {
    fn record(&self, call: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("{}:{}", self.id, call));
        if self.reject.lock().unwrap().contains(&self.id) {
            anyhow::bail!("{} refuses {}", self.id, call);
        }
        Ok(())
    }
}

#[async_trait]
impl ControlStub for MockStub {
    async fn activate(&self) -> Result<()> {
        self.record("activate")
    }

    async fn passivate(&self) -> Result<()> {
        self.record("passivate")
    }

    async fn reconfigure(&self, values: &HashMap<String, String>) -> Result<()> {
        let mut keys: Vec<&String> = values.keys().collect();
        keys.sort();
        let keys: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
        self.record(&format!("reconfigure({})", keys.join(",")))
    }

    async fn state(&self) -> Result<ServiceState> {
        self.record("state")?;
        Ok(ServiceState::Running)
    }

    async fn set_state(&self, state: ServiceState) -> Result<ServiceState> {
        self.record(&format!("set_state({})", state))?;
        Ok(self
            .reported
            .lock()
            .unwrap()
            .get(&self.id)
            .copied()
            .unwrap_or(state))
    }
}

#[derive(Default)]
pub struct MockStubFactory {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub attached: Mutex<Vec<String>>,
    /// Services whose stub fails every call.
    pub reject: Arc<Mutex<HashSet<String>>>,
    /// State a service reports after `set_state`.
    pub reported: Arc<Mutex<HashMap<String, ServiceState>>>,
}

impl MockStubFactory {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reject(&self, service_id: &str) {
        self.reject.lock().unwrap().insert(service_id.to_string());
    }
}

#[async_trait]
impl StubFactory for MockStubFactory {
    async fn attach(&self, service: &Service) -> Result<Arc<dyn ControlStub>> {
        self.attached.lock().unwrap().push(service.id().to_string());
        Ok(Arc::new(MockStub {
            id: service.id().to_string(),
            calls: self.calls.clone(),
            reject: self.reject.clone(),
            reported: self.reported.clone(),
        }))
    }
}

// --- Mock Servers ---
pub struct MockServer {
    id: String,
    events: Arc<Mutex<Vec<String>>>,
}

impl Server for MockServer {
    fn start(&self) -> Result<()> {
        self.events.lock().unwrap().push(format!("start:{}", self.id));
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.events.lock().unwrap().push(format!("stop:{}", self.id));
        Ok(())
    }
}

#[derive(Default)]
pub struct MockServerFactory {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl MockServerFactory {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ServerFactory for MockServerFactory {
    fn create(&self, spec: &ServerSpec, _host: &str) -> Result<Arc<dyn Server>> {
        Ok(Arc::new(MockServer {
            id: spec.id.clone(),
            events: self.events.clone(),
        }))
    }
}

// --- Recording notification sink ---
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<(Topic, Mutation)>>,
    /// Records, then reports every notification as failed.
    pub refusing: Mutex<bool>,
}

impl RecordingSink {
    pub fn refuse(&self) {
        *self.refusing.lock().unwrap() = true;
    }

    /// State changes announced for `id`, as `(from, to)` pairs.
    pub fn transitions_of(&self, id: &str) -> Vec<(ServiceState, ServiceState)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, mutation)| match mutation {
                Mutation::StateChanged { id: m, from, to } if m == id => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, topic: Topic, mutation: Mutation) -> Result<()> {
        self.events.lock().unwrap().push((topic, mutation));
        if *self.refusing.lock().unwrap() {
            anyhow::bail!("notification consumer unreachable");
        }
        Ok(())
    }
}

// --- In-memory descriptors ---
#[derive(Default)]
pub struct MapResolver {
    pub descriptors: Mutex<HashMap<String, ArtifactSpec>>,
}

#[async_trait]
impl ArtifactResolver for MapResolver {
    async fn resolve(&self, uri: &str) -> Result<ArtifactSpec> {
        self.descriptors
            .lock()
            .unwrap()
            .get(uri)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("nothing at {}", uri))
    }
}

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub substrate: Arc<MockSubstrate>,
    pub stubs: Arc<MockStubFactory>,
    pub servers: Arc<MockServerFactory>,
    pub network: Arc<LocalNetworkManager>,
    pub sink: Arc<RecordingSink>,
    pub resolver: Arc<MapResolver>,
}

pub fn fast_config() -> ManagerConfig {
    ManagerConfig {
        poll_interval_ms: 5,
        deploy_timeout_ms: 100,
        stop_timeout_ms: 100,
        ensemble_timeout_ms: 100,
        hostname: "edge-1".into(),
        ..ManagerConfig::default()
    }
}

pub fn harness() -> Harness {
    harness_with(fast_config(), Arc::new(AlwaysAvailable))
}

pub fn harness_with(config: ManagerConfig, predicate: Arc<dyn AvailabilityPredicate>) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();

    let substrate = Arc::new(MockSubstrate::default());
    let stubs = Arc::new(MockStubFactory::default());
    let servers = Arc::new(MockServerFactory::default());
    let network = Arc::new(LocalNetworkManager::new(
        config.port_range_start,
        config.port_range_end,
    ));
    let sink = Arc::new(RecordingSink::default());
    let resolver = Arc::new(MapResolver::default());

    let orchestrator = Orchestrator::new(
        config,
        Collaborators {
            substrate: substrate.clone(),
            stubs: stubs.clone(),
            network: network.clone(),
            sink: sink.clone(),
            resolver: resolver.clone(),
            servers: servers.clone(),
            predicate,
        },
    );
    Harness {
        orchestrator,
        substrate,
        stubs,
        servers,
        network,
        sink,
        resolver,
    }
}

pub fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

pub fn options(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// `source --ch--> sink` in artifact "app".
pub fn pipeline() -> ArtifactSpec {
    ArtifactSpec::new("app")
        .with_service(ServiceSpec::new("source", ServiceKind::Source).output("ch", "int"))
        .with_service(ServiceSpec::new("sink", ServiceKind::Sink).input("ch", "int"))
}

/// Leader "y" hosting member "x" in artifact "ens".
pub fn ensemble() -> ArtifactSpec {
    ArtifactSpec::new("ens")
        .with_service(
            ServiceSpec::new("y", ServiceKind::Transformation)
                .input("in", "int")
                .output("mid", "int"),
        )
        .with_service(
            ServiceSpec::new("x", ServiceKind::Sink)
                .input("mid", "int")
                .leader("y"),
        )
}
