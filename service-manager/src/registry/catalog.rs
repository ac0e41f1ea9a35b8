//! In-memory registry of the artifacts known to this manager and the services they contain.
//!
//! Pure bookkeeping: no I/O beyond the artifact notifications.
//! Services are owned by the registry's service index; artifacts reference them by id.

use edgeflow_api::{ids, Artifact, ArtifactSpec, Service, ServiceState};
use log::{info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{ManagerError, Result};
use crate::event_bus::{Mutation, NotificationSink, Topic};
use crate::layout::Topology;

#[derive(Debug, Default)]
struct Inner {
    /// In registration order.
    artifacts: Vec<Artifact>,
    services: HashMap<String, Service>,
}

impl Inner {
    fn artifact_index(&self, id: &str) -> Option<usize> {
        self.artifacts.iter().position(|a| a.id() == id)
    }

    fn resolve(&self, id_or_uri: &str) -> Option<usize> {
        self.artifact_index(id_or_uri).or_else(|| {
            self.artifacts
                .iter()
                .position(|a| !a.uri().is_empty() && a.uri() == id_or_uri)
        })
    }

    fn service_mut(&mut self, id: &str) -> Result<&mut Service> {
        self.services
            .get_mut(id)
            .ok_or_else(|| ManagerError::unknown_service(id))
    }

    fn ordered_services(&self) -> Vec<Service> {
        self.artifacts
            .iter()
            .flat_map(|a| a.service_ids().iter())
            .filter_map(|id| self.services.get(id).cloned())
            .collect()
    }
}

/// Thread-safe store of artifacts and the service index.
pub struct Registry {
    inner: RwLock<Inner>,
    sink: Arc<dyn NotificationSink>,
}

impl Registry {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            sink,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, mutation: Mutation) {
        if let Err(e) = self.sink.notify(Topic::Artifact, mutation) {
            warn!("Registry: Notification failed: {}", e);
        }
    }

    /// Registers an artifact and indexes its services in state `AVAILABLE`.
    ///
    /// # Arguments
    ///
    /// * `spec` - The artifact descriptor. Its id and every service id must be unused.
    ///
    /// # Returns
    ///
    /// The id of the registered artifact.
    pub fn add_artifact(&self, spec: ArtifactSpec) -> Result<String> {
        if spec.id.trim().is_empty() {
            return Err(ManagerError::InvalidArgument(
                "artifact id must not be empty".to_string(),
            ));
        }
        if spec.services.is_empty() {
            return Err(ManagerError::InvalidArgument(format!(
                "artifact '{}' contains no services",
                spec.id
            )));
        }

        {
            let mut inner = self.write();
            if inner.artifact_index(&spec.id).is_some() {
                return Err(ManagerError::DuplicateId(spec.id));
            }
            let mut seen = HashSet::new();
            for service in &spec.services {
                if service.id.trim().is_empty() {
                    return Err(ManagerError::InvalidArgument(format!(
                        "artifact '{}' contains a service without id",
                        spec.id
                    )));
                }
                if !seen.insert(service.id.as_str()) || inner.services.contains_key(&service.id) {
                    return Err(ManagerError::DuplicateId(service.id.clone()));
                }
            }

            for service in &spec.services {
                inner
                    .services
                    .insert(service.id.clone(), Service::from_spec(service, &spec.id));
            }
            inner.artifacts.push(Artifact::from_spec(&spec));
        }

        info!(
            "Registry: Added artifact '{}' with {} service(s)",
            spec.id,
            spec.services.len()
        );
        self.notify(Mutation::Added {
            id: spec.id.clone(),
        });
        Ok(spec.id)
    }

    /// Removes an artifact, given by id or by source locator, together with its services.
    pub fn remove_artifact(&self, id_or_uri: &str) -> Result<Artifact> {
        let artifact = {
            let mut inner = self.write();
            let index = inner
                .resolve(id_or_uri)
                .ok_or_else(|| ManagerError::unknown_artifact(id_or_uri))?;
            let artifact = inner.artifacts.remove(index);
            for id in artifact.service_ids() {
                inner.services.remove(id);
            }
            artifact
        };

        info!("Registry: Removed artifact '{}'", artifact.id());
        self.notify(Mutation::Removed {
            id: artifact.id().to_string(),
        });
        Ok(artifact)
    }

    /// Maps an artifact id or source locator to the artifact id.
    pub fn resolve_artifact_id(&self, id_or_uri: &str) -> Option<String> {
        let inner = self.read();
        inner
            .resolve(id_or_uri)
            .map(|index| inner.artifacts[index].id().to_string())
    }

    pub fn artifact(&self, id: &str) -> Option<Artifact> {
        let inner = self.read();
        inner.artifact_index(id).map(|i| inner.artifacts[i].clone())
    }

    pub fn artifact_ids(&self) -> Vec<String> {
        self.read()
            .artifacts
            .iter()
            .map(|a| a.id().to_string())
            .collect()
    }

    pub fn artifacts(&self) -> Vec<Artifact> {
        self.read().artifacts.clone()
    }

    pub fn contains_service(&self, id: &str) -> bool {
        self.read().services.contains_key(id)
    }

    pub fn service(&self, id: &str) -> Option<Service> {
        self.read().services.get(id).cloned()
    }

    /// All services, grouped by artifact in registration order.
    pub fn services(&self) -> Vec<Service> {
        self.read().ordered_services()
    }

    pub fn services_of(&self, artifact_id: &str) -> Vec<Service> {
        let inner = self.read();
        match inner.artifact_index(artifact_id) {
            Some(index) => inner.artifacts[index]
                .service_ids()
                .iter()
                .filter_map(|id| inner.services.get(id).cloned())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn state(&self, id: &str) -> Option<ServiceState> {
        self.read().services.get(id).map(|s| s.state())
    }

    /// Number of registered instances of the logical service `id`, the instance part ignored.
    pub fn service_instance_count(&self, id: &str) -> usize {
        self.read()
            .services
            .keys()
            .filter(|other| ids::same_logical_service(id, other))
            .count()
    }

    /// Snapshot of all services, for the classifier and the scheduler.
    pub fn topology(&self) -> Topology {
        Topology::new(self.services())
    }

    /// Moves `id` to `to` if the lifecycle allows it.
    ///
    /// # Returns
    ///
    /// The state held before.
    pub fn transition(&self, id: &str, to: ServiceState) -> Result<ServiceState> {
        let mut inner = self.write();
        let service = inner.service_mut(id)?;
        let from = service.state();
        from.transition(to)?;
        service.set_state(to);
        Ok(from)
    }

    pub fn set_effective_leader(&self, id: &str, leader: Option<String>) -> Result<()> {
        let mut inner = self.write();
        inner.service_mut(id)?.set_ensemble_leader(leader);
        Ok(())
    }

    /// Restores the declared ensemble leaders of `ids`. Unknown ids are skipped.
    pub fn reset_ensembles(&self, ids: &[String]) {
        let mut inner = self.write();
        for id in ids {
            if let Some(service) = inner.services.get_mut(id) {
                service.reset_ensemble_leader();
            }
        }
    }

    /// Adds `delta` to the usage counter of an artifact and returns the new value.
    pub fn adjust_usage(&self, artifact_id: &str, delta: i64) -> Result<usize> {
        let mut inner = self.write();
        let index = inner
            .artifact_index(artifact_id)
            .ok_or_else(|| ManagerError::unknown_artifact(artifact_id))?;
        Ok(inner.artifacts[index].adjust_usage(delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::EventBus;
    use edgeflow_api::{ServiceKind, ServiceSpec};

    fn registry() -> (Registry, EventBus) {
        let bus = EventBus::default();
        (Registry::new(Arc::new(bus.clone())), bus)
    }

    fn artifact(id: &str, services: &[&str]) -> ArtifactSpec {
        services.iter().fold(
            ArtifactSpec::new(id).with_uri(format!("file:///artifacts/{}.json", id)),
            |spec, service| spec.with_service(ServiceSpec::new(*service, ServiceKind::Transformation)),
        )
    }

    #[tokio::test]
    async fn test_add_and_remove() {
        let (registry, bus) = registry();
        let mut rx = bus.subscribe();

        let id = registry.add_artifact(artifact("a1", &["s1", "s2"])).unwrap();
        assert_eq!(id, "a1");
        assert_eq!(registry.state("s1"), Some(ServiceState::Available));
        assert_eq!(registry.service("s2").unwrap().artifact_id(), "a1");
        assert_eq!(rx.recv().await.unwrap().mutation, Mutation::Added { id: "a1".into() });

        let removed = registry.remove_artifact("a1").unwrap();
        assert_eq!(removed.service_ids().len(), 2);
        assert!(registry.service("s1").is_none());
        assert!(registry.artifacts().is_empty());
        assert_eq!(rx.recv().await.unwrap().mutation, Mutation::Removed { id: "a1".into() });
    }

    #[test]
    fn test_remove_by_uri() {
        let (registry, _bus) = registry();
        registry.add_artifact(artifact("a1", &["s1"])).unwrap();
        let removed = registry.remove_artifact("file:///artifacts/a1.json").unwrap();
        assert_eq!(removed.id(), "a1");
        assert!(matches!(
            registry.remove_artifact("a1"),
            Err(ManagerError::UnknownEntity { .. })
        ));
    }

    #[test]
    fn test_duplicates_rejected() {
        let (registry, _bus) = registry();
        registry.add_artifact(artifact("a1", &["s1"])).unwrap();

        assert!(matches!(
            registry.add_artifact(artifact("a1", &["x"])),
            Err(ManagerError::DuplicateId(id)) if id == "a1"
        ));
        assert!(matches!(
            registry.add_artifact(artifact("a2", &["s1"])),
            Err(ManagerError::DuplicateId(id)) if id == "s1"
        ));
        assert!(matches!(
            registry.add_artifact(artifact("a3", &["t", "t"])),
            Err(ManagerError::DuplicateId(id)) if id == "t"
        ));
        // failed registrations leave nothing behind
        assert_eq!(registry.artifact_ids(), vec!["a1".to_string()]);
        assert!(!registry.contains_service("x"));
    }

    #[test]
    fn test_invalid_artifacts() {
        let (registry, _bus) = registry();
        assert!(matches!(
            registry.add_artifact(ArtifactSpec::new("empty")),
            Err(ManagerError::InvalidArgument(_))
        ));
        assert!(matches!(
            registry.add_artifact(artifact("", &["s"])),
            Err(ManagerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_instance_count() {
        let (registry, _bus) = registry();
        registry
            .add_artifact(artifact("a1", &["recv@app@1", "recv@app@2", "recv@other@1", "send@app@1"]))
            .unwrap();
        assert_eq!(registry.service_instance_count("recv@app@1"), 2);
        assert_eq!(registry.service_instance_count("recv@app"), 2);
        assert_eq!(registry.service_instance_count("recv@other@9"), 1);
        assert_eq!(registry.service_instance_count("nothing"), 0);
    }

    #[test]
    fn test_validated_transition() {
        let (registry, _bus) = registry();
        registry.add_artifact(artifact("a1", &["s1"])).unwrap();

        assert_eq!(
            registry.transition("s1", ServiceState::Deploying).unwrap(),
            ServiceState::Available
        );
        assert!(registry.transition("s1", ServiceState::Passivated).is_err());
        assert_eq!(registry.state("s1"), Some(ServiceState::Deploying));
        assert!(matches!(
            registry.transition("nope", ServiceState::Running),
            Err(ManagerError::UnknownEntity { .. })
        ));
    }

    #[test]
    fn test_usage_and_leaders() {
        let (registry, _bus) = registry();
        registry.add_artifact(artifact("a1", &["s1", "s2"])).unwrap();

        assert_eq!(registry.adjust_usage("a1", 1).unwrap(), 1);
        assert_eq!(registry.adjust_usage("a1", -2).unwrap(), 0);

        registry
            .set_effective_leader("s1", Some("s2".to_string()))
            .unwrap();
        assert_eq!(registry.service("s1").unwrap().ensemble_leader(), Some("s2"));
        registry.reset_ensembles(&["s1".to_string()]);
        assert!(registry.service("s1").unwrap().is_top_level());
    }
}
