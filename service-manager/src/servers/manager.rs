//! Co-located servers.
//!
//! Artifacts may carry auxiliary servers (brokers, databases) pinned to a host. When services
//! of such an artifact start on the server's host, the server is started once and shared by
//! all artifacts declaring it. Each declaring artifact counts as one registered instance at
//! the network manager; a server is stopped when the last instance is gone.

use anyhow::Result;
use edgeflow_api::{Artifact, ServerSpec, ServiceState, StartOptions};
use log::{error, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use crate::config::ManagerConfig;
use crate::event_bus::{Mutation, NotificationSink, Topic};
use crate::runtime::NetworkManager;

/// A server implementation the manager can run in-process.
pub trait Server: Send + Sync {
    /// Starts serving. For threaded servers this may block until [`Server::stop`] is called.
    fn start(&self) -> Result<()>;

    fn stop(&self) -> Result<()>;

    /// Whether `start` has to run on a thread of its own.
    fn threaded(&self) -> bool {
        false
    }
}

/// Creates server implementations by their implementation key.
pub trait ServerFactory: Send + Sync {
    fn create(&self, spec: &ServerSpec, host: &str) -> Result<Arc<dyn Server>>;
}

struct RunningServer {
    state: ServiceState,
    server: Arc<dyn Server>,
    thread: Option<JoinHandle<()>>,
}

pub struct ServerManager {
    config: ManagerConfig,
    factory: Arc<dyn ServerFactory>,
    network: Arc<dyn NetworkManager>,
    sink: Arc<dyn NotificationSink>,
    running: Mutex<HashMap<String, RunningServer>>,
}

impl ServerManager {
    pub fn new(
        config: ManagerConfig,
        factory: Arc<dyn ServerFactory>,
        network: Arc<dyn NetworkManager>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            config,
            factory,
            network,
            sink,
            running: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RunningServer>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, id: &str, from: ServiceState, to: ServiceState) {
        let mutation = Mutation::StateChanged {
            id: id.to_string(),
            from,
            to,
        };
        if let Err(e) = self.sink.notify(Topic::Server, mutation) {
            warn!("Servers: Notification failed: {}", e);
        }
    }

    fn set_state(&self, id: &str, to: ServiceState) {
        let from = {
            let mut running = self.lock();
            match running.get_mut(id) {
                Some(entry) => std::mem::replace(&mut entry.state, to),
                None => ServiceState::Available,
            }
        };
        self.notify(id, from, to);
    }

    /// Starts the servers of `artifacts` that belong on this device.
    ///
    /// # Arguments
    ///
    /// * `options` - Start options; the `servers` option remaps server hosts.
    /// * `artifacts` - Artifacts about to get their first started service.
    ///
    /// # Returns
    ///
    /// The ids of the servers started by this call. Failures are logged and skipped.
    pub fn start_servers(&self, options: &StartOptions, artifacts: &[Artifact]) -> Vec<String> {
        let mut started = Vec::new();
        for spec in artifacts.iter().flat_map(|a| a.servers().iter()) {
            let host = options.server_host(&spec.id).unwrap_or(spec.host.as_str());
            if self.config.is_server_disabled(&spec.id) {
                info!("Servers: '{}' is disabled on this device", spec.id);
                continue;
            }
            if !self.config.is_this_device(host) {
                info!("Servers: '{}' runs on '{}', not here", spec.id, host);
                continue;
            }
            self.network.register_instance(&spec.id);
            if self.network.port(&spec.id).is_some() {
                info!("Servers: '{}' is already running", spec.id);
                continue;
            }
            match self.start_server(spec, host) {
                Ok(()) => started.push(spec.id.clone()),
                Err(e) => {
                    error!("Servers: Failed to start '{}': {:#}", spec.id, e);
                    self.network.unregister_instance(&spec.id);
                    self.lock().remove(&spec.id);
                }
            }
        }
        started
    }

    fn start_server(&self, spec: &ServerSpec, host: &str) -> Result<()> {
        let server = self.factory.create(spec, host)?;
        self.lock().insert(
            spec.id.clone(),
            RunningServer {
                state: ServiceState::Available,
                server: server.clone(),
                thread: None,
            },
        );
        self.set_state(&spec.id, ServiceState::Starting);

        if let Err(e) = self.launch(spec, &server) {
            self.set_state(&spec.id, ServiceState::Failed);
            return Err(e);
        }

        match self.network.reserve_port(&spec.id, Some(&spec.address(host))) {
            Ok(address) => {
                info!("Servers: '{}' running at {}", spec.id, address);
                self.set_state(&spec.id, ServiceState::Running);
                Ok(())
            }
            Err(e) => {
                // already serving: take it down again before giving up the entry
                if let Err(stop_err) = server.stop() {
                    error!("Servers: Failed to stop '{}': {:#}", spec.id, stop_err);
                }
                if let Some(entry) = self.lock().get_mut(&spec.id) {
                    entry.thread = None;
                }
                self.set_state(&spec.id, ServiceState::Failed);
                Err(e)
            }
        }
    }

    fn launch(&self, spec: &ServerSpec, server: &Arc<dyn Server>) -> Result<()> {
        if !server.threaded() {
            return server.start();
        }
        let id = spec.id.clone();
        let runner = server.clone();
        let handle = std::thread::Builder::new()
            .name(format!("server-{}", spec.id))
            .spawn(move || {
                if let Err(e) = runner.start() {
                    error!("Servers: '{}' terminated: {:#}", id, e);
                }
            })?;
        if let Some(entry) = self.lock().get_mut(&spec.id) {
            entry.thread = Some(handle);
        }
        Ok(())
    }

    /// Releases the servers of `artifacts` and stops those no artifact uses any more.
    ///
    /// # Returns
    ///
    /// The ids of the servers stopped by this call.
    pub fn stop_servers(&self, artifacts: &[Artifact]) -> Vec<String> {
        let mut stopped = Vec::new();
        for spec in artifacts.iter().flat_map(|a| a.servers().iter()) {
            let is_running = self
                .lock()
                .get(&spec.id)
                .map_or(false, |entry| entry.state == ServiceState::Running);
            if self.network.registered_instances(&spec.id) > 0 {
                self.network.unregister_instance(&spec.id);
            }
            if !is_running || self.network.registered_instances(&spec.id) > 0 {
                continue;
            }
            self.stop_server(&spec.id);
            stopped.push(spec.id.clone());
        }
        stopped
    }

    fn stop_server(&self, id: &str) {
        self.set_state(id, ServiceState::Stopping);
        let server = self.lock().get(id).map(|entry| entry.server.clone());
        if let Some(server) = server {
            if let Err(e) = server.stop() {
                error!("Servers: Failed to stop '{}': {:#}", id, e);
            }
        }
        if let Err(e) = self.network.release_port(id) {
            warn!("Servers: Failed to release port of '{}': {}", id, e);
        }
        self.set_state(id, ServiceState::Stopped);
        // the server thread winds down on its own once stopped
        if let Some(entry) = self.lock().get_mut(id) {
            entry.thread = None;
        }
        info!("Servers: '{}' stopped", id);
    }

    pub fn running_servers_count(&self) -> usize {
        self.lock()
            .values()
            .filter(|entry| entry.state == ServiceState::Running)
            .count()
    }

    pub fn server_state(&self, id: &str) -> Option<ServiceState> {
        self.lock().get(id).map(|entry| entry.state)
    }
}
