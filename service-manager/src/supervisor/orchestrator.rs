use edgeflow_api::{ArtifactSpec, Service, ServiceState, StartOptions};
use edgeflow_protocol::{ArtifactSummary, ServiceSummary};
use log::{error, info, warn};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::config::ManagerConfig;
use crate::error::{ManagerError, Result};
use crate::event_bus::{EventBus, Mutation, NotificationSink, Topic};
use crate::layout::classifier::{
    determine_external_connections, determine_functional_connections, function_definition,
};
use crate::layout::{
    schedule, AvailabilityPredicate, ConnectorView, PortAvailability, ScheduleDirection, Topology,
};
use crate::registry::{ArtifactResolver, FileArtifactResolver, Registry};
use crate::runtime::{
    admin_key, ControlStub, DeploymentRequest, DeploymentState, LocalNetworkManager,
    NetworkManager, ProcessSubstrate, StatusReport, StubFactory, Substrate, TcpStubFactory,
};
use crate::servers::{ProcessServerFactory, ServerFactory, ServerManager};

/// The external systems an [`Orchestrator`] works with.
pub struct Collaborators {
    pub substrate: Arc<dyn Substrate>,
    pub stubs: Arc<dyn StubFactory>,
    pub network: Arc<dyn NetworkManager>,
    pub sink: Arc<dyn NotificationSink>,
    pub resolver: Arc<dyn ArtifactResolver>,
    pub servers: Arc<dyn ServerFactory>,
    pub predicate: Arc<dyn AvailabilityPredicate>,
}

impl Collaborators {
    /// Collaborators of a single device: one process of `launcher` per deployment, ports
    /// from the configured range, descriptors from disk and notifications on `bus`.
    pub fn local(config: &ManagerConfig, launcher: impl Into<PathBuf>, bus: &EventBus) -> Self {
        let network: Arc<dyn NetworkManager> = Arc::new(LocalNetworkManager::new(
            config.port_range_start,
            config.port_range_end,
        ));
        Self {
            substrate: Arc::new(ProcessSubstrate::new(launcher)),
            stubs: Arc::new(TcpStubFactory::new(network.clone(), config.control_timeout())),
            network: network.clone(),
            sink: Arc::new(bus.clone()),
            resolver: Arc::new(FileArtifactResolver::new()),
            servers: Arc::new(ProcessServerFactory),
            predicate: Arc::new(PortAvailability::new(network)),
        }
    }
}

/// What the orchestrator knows about a started service beyond the registry.
#[derive(Default)]
struct ServiceRuntime {
    deployment_id: Option<String>,
    stub: Option<Arc<dyn ControlStub>>,
}

/// Drives services through their lifecycle.
///
/// Multi-service operations run sequentially in dependency order. Every id is attempted,
/// failures are collected and reported once as [`ManagerError::AggregatedFailure`].
/// Nothing is rolled back.
pub struct Orchestrator {
    config: ManagerConfig,
    registry: Arc<Registry>,
    substrate: Arc<dyn Substrate>,
    stubs: Arc<dyn StubFactory>,
    network: Arc<dyn NetworkManager>,
    sink: Arc<dyn NotificationSink>,
    resolver: Arc<dyn ArtifactResolver>,
    predicate: Arc<dyn AvailabilityPredicate>,
    servers: ServerManager,
    runtime: Mutex<HashMap<String, ServiceRuntime>>,
}

impl Orchestrator {
    pub fn new(config: ManagerConfig, collaborators: Collaborators) -> Self {
        let registry = Arc::new(Registry::new(collaborators.sink.clone()));
        let servers = ServerManager::new(
            config.clone(),
            collaborators.servers,
            collaborators.network.clone(),
            collaborators.sink.clone(),
        );
        Self {
            config,
            registry,
            substrate: collaborators.substrate,
            stubs: collaborators.stubs,
            network: collaborators.network,
            sink: collaborators.sink,
            resolver: collaborators.resolver,
            predicate: collaborators.predicate,
            servers,
            runtime: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn servers(&self) -> &ServerManager {
        &self.servers
    }

    fn runtime(&self) -> MutexGuard<'_, HashMap<String, ServiceRuntime>> {
        self.runtime.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deployment_id(&self, id: &str) -> Option<String> {
        self.runtime().get(id).and_then(|r| r.deployment_id.clone())
    }

    fn stub(&self, id: &str) -> Option<Arc<dyn ControlStub>> {
        self.runtime().get(id).and_then(|r| r.stub.clone())
    }

    /// Whether a deployment id is recorded for `id`.
    pub fn has_deployment(&self, id: &str) -> bool {
        self.deployment_id(id).is_some()
    }

    pub fn has_stub(&self, id: &str) -> bool {
        self.stub(id).is_some()
    }

    // ---- validation ----

    fn check_id(id: &str) -> Result<()> {
        if id.trim().is_empty() {
            Err(ManagerError::InvalidArgument("id must not be empty".to_string()))
        } else {
            Ok(())
        }
    }

    fn known_service(&self, id: &str) -> Result<Service> {
        Self::check_id(id)?;
        self.registry
            .service(id)
            .ok_or_else(|| ManagerError::unknown_service(id))
    }

    fn known_services(&self, ids: &[String]) -> Result<()> {
        for id in ids {
            self.known_service(id)?;
        }
        Ok(())
    }

    // ---- state changes ----

    fn notify_state(&self, id: &str, from: ServiceState, to: ServiceState) {
        let mutation = Mutation::StateChanged {
            id: id.to_string(),
            from,
            to,
        };
        if let Err(e) = self.sink.notify(Topic::Service, mutation) {
            warn!("Orchestrator: Notification for '{}' failed: {}", id, e);
        }
    }

    /// Validated transition of `id` to `to`, announced to the notification sink.
    fn transition(&self, id: &str, to: ServiceState) -> Result<ServiceState> {
        let from = self.registry.transition(id, to)?;
        if from != to {
            info!("Orchestrator: '{}' {} -> {}", id, from, to);
            self.notify_state(id, from, to);
        }
        Ok(from)
    }

    fn illegal_state(&self, id: &str, operation: &'static str) -> ManagerError {
        ManagerError::IllegalState {
            id: id.to_string(),
            state: self.registry.state(id).unwrap_or_default(),
            operation,
        }
    }

    // ---- artifacts ----

    /// Resolves the artifact at `uri` and registers it.
    pub async fn add_artifact(&self, uri: &str) -> Result<String> {
        Self::check_id(uri)?;
        let mut spec = self
            .resolver
            .resolve(uri)
            .await
            .map_err(|e| ManagerError::collaborator(uri, e))?;
        if spec.uri.is_empty() {
            spec.uri = uri.to_string();
        }
        self.registry.add_artifact(spec)
    }

    /// Registers an artifact from an already parsed descriptor.
    pub fn add_artifact_spec(&self, spec: ArtifactSpec) -> Result<String> {
        self.registry.add_artifact(spec)
    }

    /// Removes an artifact given by id or source locator. None of its services may be alive.
    pub async fn remove_artifact(&self, id_or_uri: &str) -> Result<()> {
        Self::check_id(id_or_uri)?;
        let artifact_id = self
            .registry
            .resolve_artifact_id(id_or_uri)
            .ok_or_else(|| ManagerError::unknown_artifact(id_or_uri))?;

        let services = self.registry.services_of(&artifact_id);
        if let Some(alive) = services.iter().find(|s| s.state().is_alive()) {
            return Err(ManagerError::IllegalState {
                id: alive.id().to_string(),
                state: alive.state(),
                operation: "remove",
            });
        }
        let in_use = self
            .registry
            .artifact(&artifact_id)
            .map_or(false, |a| a.is_in_use());
        if in_use {
            return Err(ManagerError::IllegalState {
                id: artifact_id,
                state: ServiceState::Running,
                operation: "remove",
            });
        }

        for service in &services {
            self.transition(service.id(), ServiceState::Undeploying)?;
            self.runtime().remove(service.id());
            if let Err(e) = self.network.release_port(&admin_key(service.id())) {
                warn!("Orchestrator: Failed to release admin port of '{}': {}", service.id(), e);
            }
        }
        self.registry.remove_artifact(&artifact_id)?;
        Ok(())
    }

    pub fn clone_artifact(&self, _id: &str, _target: &str) -> Result<String> {
        Err(ManagerError::Unimplemented("artifact cloning"))
    }

    pub fn update_artifact(&self, _id: &str, _uri: &str) -> Result<()> {
        Err(ManagerError::Unimplemented("artifact update"))
    }

    pub fn artifact_summaries(&self) -> Vec<ArtifactSummary> {
        self.registry
            .artifacts()
            .iter()
            .map(|artifact| ArtifactSummary {
                id: artifact.id().to_string(),
                name: artifact.name().to_string(),
                uri: artifact.uri().to_string(),
                usage: artifact.usage(),
                services: self
                    .registry
                    .services_of(artifact.id())
                    .iter()
                    .map(|s| ServiceSummary {
                        id: s.id().to_string(),
                        state: s.state(),
                    })
                    .collect(),
            })
            .collect()
    }

    // ---- start ----

    /// Starts `ids` in dependency order.
    ///
    /// # Arguments
    ///
    /// * `ids` - Services to start.
    /// * `options` - Flat option map, see [`StartOptions`].
    pub async fn start_service(&self, ids: &[String], options: &HashMap<String, String>) -> Result<()> {
        self.known_services(ids)?;
        let options = StartOptions::from_map(options)?;

        for (member, leader) in &options.ensemble {
            match self.registry.set_effective_leader(member, Some(leader.clone())) {
                Ok(()) => info!("Orchestrator: '{}' joins the ensemble of '{}'", member, leader),
                Err(_) => warn!("Orchestrator: Ensemble option names unknown service '{}'", member),
            }
        }

        let fresh_artifacts: Vec<_> = self
            .artifact_ids_of(ids)
            .iter()
            .filter_map(|id| self.registry.artifact(id))
            .filter(|a| !a.is_in_use())
            .collect();
        self.servers.start_servers(&options, &fresh_artifacts);

        let topology = self.registry.topology();
        let plan = schedule(ids, &topology, self.predicate.as_ref(), ScheduleDirection::Start);
        let external = determine_external_connections(&topology, &plan.order);
        info!("Orchestrator: Start order {:?}", plan.order);

        let mut failures = Vec::new();
        let mut failed_ids = Vec::new();
        for id in &plan.order {
            if let Err(e) = self.start_one(id, &options, &topology, &external).await {
                error!("Orchestrator: Starting '{}' failed: {}", id, e);
                failures.push(e);
                failed_ids.push(id.clone());
            }
        }

        // overrides only outlive the call for members that came up
        let stale: Vec<String> = failed_ids
            .into_iter()
            .filter(|id| options.ensemble.contains_key(id))
            .collect();
        if !stale.is_empty() {
            self.registry.reset_ensembles(&stale);
        }

        // hand back servers of artifacts that did not get a service running
        let unused: Vec<_> = fresh_artifacts
            .iter()
            .filter(|a| {
                self.registry
                    .artifact(a.id())
                    .map_or(false, |now| !now.is_in_use())
            })
            .cloned()
            .collect();
        if !unused.is_empty() {
            self.servers.stop_servers(&unused);
        }

        ManagerError::aggregate(failures)
    }

    async fn start_one(
        &self,
        id: &str,
        options: &StartOptions,
        topology: &Topology,
        external: &[ConnectorView],
    ) -> Result<()> {
        let service = self.known_service(id)?;
        if !service.state().is_startable() {
            return Err(self.illegal_state(id, "start"));
        }

        match service.ensemble_leader() {
            Some(leader) => {
                self.await_leader(id, leader).await?;
                self.transition(id, ServiceState::Starting)?;
            }
            None => self.deploy(&service, options, topology, external).await?,
        }

        let service = self.known_service(id)?;
        match self.stubs.attach(&service).await {
            Ok(stub) => self.runtime().entry(id.to_string()).or_default().stub = Some(stub),
            Err(e) => warn!("Orchestrator: No control stub for '{}': {:#}", id, e),
        }
        self.transition(id, ServiceState::Running)?;
        self.registry.adjust_usage(service.artifact_id(), 1)?;

        if let Some(values) = options.params_for(id) {
            self.reconfigure_service(id, values).await?;
        }
        Ok(())
    }

    async fn await_leader(&self, id: &str, leader: &str) -> Result<()> {
        let deadline = Instant::now() + self.config.ensemble_timeout();
        loop {
            let state = self.registry.state(leader);
            if state == Some(ServiceState::Running) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                warn!("Orchestrator: Leader '{}' of '{}' is not running", leader, id);
                return Err(ManagerError::IllegalState {
                    id: leader.to_string(),
                    state: state.unwrap_or_default(),
                    operation: "host ensemble member",
                });
            }
            sleep(self.config.poll_interval()).await;
        }
    }

    fn deployment_request(
        &self,
        service: &Service,
        options: &StartOptions,
        topology: &Topology,
        external: &[ConnectorView],
        admin_address: Option<String>,
    ) -> Result<DeploymentRequest> {
        let artifact = self
            .registry
            .artifact(service.artifact_id())
            .ok_or_else(|| ManagerError::unknown_artifact(service.artifact_id()))?;
        let members: Vec<String> = topology
            .members_of(service.id())
            .map(|m| m.id().to_string())
            .collect();
        let mut process: Vec<String> = vec![service.id().to_string()];
        process.extend(members.iter().cloned());
        let hosted: HashSet<&str> = process.iter().map(String::as_str).collect();

        let mut args = service.args().to_vec();
        args.extend(options.args.iter().cloned());

        Ok(DeploymentRequest {
            service_id: service.id().to_string(),
            artifact_id: artifact.id().to_string(),
            artifact_uri: artifact.uri().to_string(),
            args,
            memory: options.memory_limit(service.id()).or(service.memory()),
            function_definition: function_definition(&determine_functional_connections(
                topology, &process,
            )),
            external_connections: external
                .iter()
                .filter(|v| hosted.contains(v.service()))
                .cloned()
                .collect(),
            ensemble_members: members,
            admin_address,
        })
    }

    async fn deploy(
        &self,
        service: &Service,
        options: &StartOptions,
        topology: &Topology,
        external: &[ConnectorView],
    ) -> Result<()> {
        let id = service.id();
        let admin_address = self
            .network
            .reserve_port(&admin_key(id), None)
            .map_err(|e| ManagerError::collaborator(id, e))?;
        let request =
            self.deployment_request(service, options, topology, external, Some(admin_address))?;

        self.transition(id, ServiceState::Deploying)?;
        let deployment_id = match self.substrate.deploy(&request).await {
            Ok(deployment_id) => deployment_id,
            Err(e) => {
                self.fail_deployment(id);
                return Err(ManagerError::DeploymentFailure {
                    id: id.to_string(),
                    log: format!("{:#}", e),
                });
            }
        };
        self.runtime().entry(id.to_string()).or_default().deployment_id =
            Some(deployment_id.clone());

        let report = self
            .await_deployment(id, &deployment_id, self.config.deploy_timeout(), |state| {
                state != DeploymentState::Deploying
            })
            .await;
        match report {
            Ok(report) if report.state == DeploymentState::Deployed => {
                self.transition(id, ServiceState::Starting)?;
                Ok(())
            }
            Ok(report) if report.state == DeploymentState::Deploying => {
                warn!("Orchestrator: '{}' still deploying after timeout, continuing", id);
                self.transition(id, ServiceState::Starting)?;
                Ok(())
            }
            Ok(report) => {
                self.fail_deployment(id);
                Err(ManagerError::DeploymentFailure {
                    id: id.to_string(),
                    log: if report.log.is_empty() {
                        format!("deployment ended in state {:?}", report.state)
                    } else {
                        report.log
                    },
                })
            }
            Err(e) => {
                self.fail_deployment(id);
                Err(e)
            }
        }
    }

    fn fail_deployment(&self, id: &str) {
        if let Err(e) = self.transition(id, ServiceState::Failed) {
            error!("Orchestrator: Cannot mark '{}' failed: {}", id, e);
        }
        self.runtime().remove(id);
        if let Err(e) = self.network.release_port(&admin_key(id)) {
            warn!("Orchestrator: Failed to release admin port of '{}': {}", id, e);
        }
    }

    /// Polls the substrate until `settled` holds or `timeout` passed. The last report is
    /// returned either way.
    async fn await_deployment<F>(
        &self,
        id: &str,
        deployment_id: &str,
        timeout: Duration,
        settled: F,
    ) -> Result<StatusReport>
    where
        F: Fn(DeploymentState) -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            let report = self
                .substrate
                .status(deployment_id)
                .await
                .map_err(|e| ManagerError::collaborator(id, e))?;
            if settled(report.state) || Instant::now() >= deadline {
                return Ok(report);
            }
            sleep(self.config.poll_interval()).await;
        }
    }

    // ---- stop ----

    /// Stops `ids` in reverse dependency order.
    pub async fn stop_service(&self, ids: &[String]) -> Result<()> {
        self.known_services(ids)?;

        let artifact_ids = self.artifact_ids_of(ids);
        let in_use_before: HashSet<String> = artifact_ids
            .iter()
            .filter(|id| self.registry.artifact(id).map_or(false, |a| a.is_in_use()))
            .cloned()
            .collect();

        let topology = self.registry.topology();
        let plan = schedule(ids, &topology, self.predicate.as_ref(), ScheduleDirection::Stop);
        info!("Orchestrator: Stop order {:?}", plan.order);

        let mut failures = Vec::new();
        for id in &plan.order {
            if let Err(e) = self.stop_one(id).await {
                error!("Orchestrator: Stopping '{}' failed: {}", id, e);
                failures.push(e);
            }
        }
        self.registry.reset_ensembles(ids);

        let released: Vec<_> = in_use_before
            .iter()
            .filter_map(|id| self.registry.artifact(id))
            .filter(|a| !a.is_in_use())
            .collect();
        if !released.is_empty() {
            self.servers.stop_servers(&released);
        }

        ManagerError::aggregate(failures)
    }

    async fn stop_one(&self, id: &str) -> Result<()> {
        let service = self.known_service(id)?;
        let state = service.state();
        let deployment_id = self.deployment_id(id);
        let live_member = service.ensemble_leader().is_some() && state.is_alive();

        if deployment_id.is_none() && !live_member {
            self.runtime().remove(id);
            info!("Orchestrator: '{}' has no live deployment", id);
            return Ok(());
        }

        let result = self.undeploy(id, deployment_id.as_deref()).await;
        self.runtime().remove(id);
        if counts_as_usage(state) {
            self.registry.adjust_usage(service.artifact_id(), -1)?;
        }
        result
    }

    async fn undeploy(&self, id: &str, deployment_id: Option<&str>) -> Result<()> {
        self.transition(id, ServiceState::Stopping)?;
        let Some(deployment_id) = deployment_id else {
            // ensemble members go down with their leader's process
            self.transition(id, ServiceState::Stopped)?;
            return Ok(());
        };

        let outcome = match self.substrate.undeploy(deployment_id).await {
            Ok(()) => {
                self.await_deployment(id, deployment_id, self.config.stop_timeout(), |state| {
                    matches!(state, DeploymentState::Undeployed | DeploymentState::Failed)
                })
                .await
            }
            Err(e) => Err(ManagerError::collaborator(id, e)),
        };
        if let Err(e) = self.network.release_port(&admin_key(id)) {
            warn!("Orchestrator: Failed to release admin port of '{}': {}", id, e);
        }

        match outcome {
            Ok(report) if report.state == DeploymentState::Failed => {
                self.transition(id, ServiceState::Failed)?;
                Err(ManagerError::DeploymentFailure {
                    id: id.to_string(),
                    log: report.log,
                })
            }
            Ok(report) => {
                if report.state != DeploymentState::Undeployed {
                    warn!("Orchestrator: '{}' not confirmed undeployed, assuming stopped", id);
                }
                self.transition(id, ServiceState::Stopped)?;
                Ok(())
            }
            Err(e) => {
                self.transition(id, ServiceState::Failed)?;
                Err(e)
            }
        }
    }

    // ---- single-service operations ----

    /// Stops `old` and starts `new`. Nothing happens if both are the same.
    pub async fn switch_to_service(&self, old: &str, new: &str) -> Result<()> {
        self.known_service(old)?;
        self.known_service(new)?;
        if old == new {
            return Ok(());
        }
        self.stop_service(&[old.to_string()]).await?;
        self.start_service(&[new.to_string()], &HashMap::new()).await
    }

    /// Stops a running service and lets the substrate relocate it to `resource`.
    pub async fn migrate_service(&self, id: &str, resource: &str) -> Result<()> {
        let service = self.known_service(id)?;
        Self::check_id(resource)?;
        if service.state() != ServiceState::Running {
            return Err(self.illegal_state(id, "migrate"));
        }
        self.stop_service(&[id.to_string()]).await?;
        self.substrate
            .relocate(id, resource)
            .await
            .map_err(|e| ManagerError::collaborator(id, e))
    }

    fn require_stub(&self, id: &str, operation: &'static str) -> Result<Arc<dyn ControlStub>> {
        self.stub(id).ok_or_else(|| self.illegal_state(id, operation))
    }

    pub async fn passivate_service(&self, id: &str) -> Result<()> {
        let service = self.known_service(id)?;
        let stub = self.require_stub(id, "passivate")?;
        if service.state() != ServiceState::Running {
            return Err(self.illegal_state(id, "passivate"));
        }
        self.transition(id, ServiceState::Passivating)?;
        match stub.passivate().await {
            Ok(()) => {
                self.transition(id, ServiceState::Passivated)?;
                Ok(())
            }
            Err(e) => {
                self.transition(id, ServiceState::Running)?;
                Err(ManagerError::collaborator(id, e))
            }
        }
    }

    pub async fn activate_service(&self, id: &str) -> Result<()> {
        let service = self.known_service(id)?;
        let stub = self.require_stub(id, "activate")?;
        if service.state() != ServiceState::Passivated {
            return Err(self.illegal_state(id, "activate"));
        }
        self.transition(id, ServiceState::Passivating)?;
        match stub.activate().await {
            Ok(()) => {
                self.transition(id, ServiceState::Running)?;
                Ok(())
            }
            Err(e) => {
                self.transition(id, ServiceState::Passivated)?;
                Err(ManagerError::collaborator(id, e))
            }
        }
    }

    /// Applies new parameter values. The service returns to the state it held before, also
    /// when the service rejects the values.
    pub async fn reconfigure_service(&self, id: &str, values: &HashMap<String, String>) -> Result<()> {
        let service = self.known_service(id)?;
        let stub = self.require_stub(id, "reconfigure")?;
        let declared = service.parameters();
        if !declared.is_empty() {
            let unknown = values
                .keys()
                .find(|k| !declared.iter().any(|p| p.name() == k.as_str()));
            if let Some(unknown) = unknown {
                return Err(ManagerError::InvalidArgument(format!(
                    "'{}' declares no parameter '{}'",
                    id, unknown
                )));
            }
        }
        let prior = service.state();
        if !prior.can_return_from_reconfiguring() {
            return Err(self.illegal_state(id, "reconfigure"));
        }

        self.transition(id, ServiceState::Reconfiguring)?;
        let result = stub.reconfigure(values).await;
        self.transition(id, prior)?;
        result.map_err(|e| ManagerError::collaborator(id, e))
    }

    /// Administrative state override, forwarded to the service. A further transition the
    /// service reports in response is applied as well.
    pub async fn set_service_state(&self, id: &str, state: ServiceState) -> Result<()> {
        self.known_service(id)?;
        self.transition(id, state)?;
        let Some(stub) = self.stub(id) else {
            return Ok(());
        };
        match stub.set_state(state).await {
            Ok(reported) if reported != state => {
                if let Err(e) = self.transition(id, reported) {
                    warn!("Orchestrator: '{}' reported {}: {}", id, reported, e);
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Orchestrator: Forwarding state of '{}' failed: {:#}", id, e),
        }
        Ok(())
    }

    pub fn service_state(&self, id: &str) -> Result<ServiceState> {
        Ok(self.known_service(id)?.state())
    }

    pub fn service_instance_count(&self, id: &str) -> Result<usize> {
        self.known_service(id)?;
        Ok(self.registry.service_instance_count(id))
    }

    fn artifact_ids_of(&self, ids: &[String]) -> Vec<String> {
        let mut result: Vec<String> = Vec::new();
        for id in ids {
            if let Some(service) = self.registry.service(id) {
                if !result.iter().any(|a| a == service.artifact_id()) {
                    result.push(service.artifact_id().to_string());
                }
            }
        }
        result
    }
}

/// States in which a service counts towards the usage of its artifact.
fn counts_as_usage(state: ServiceState) -> bool {
    matches!(
        state,
        ServiceState::Running
            | ServiceState::Passivating
            | ServiceState::Passivated
            | ServiceState::Reconfiguring
    )
}
