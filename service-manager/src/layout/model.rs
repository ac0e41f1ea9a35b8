use edgeflow_api::{Connector, Direction, Service};
use serde::Serialize;
use std::collections::HashMap;

/// Id-indexed snapshot of the locally known services.
///
/// The classifier and the scheduler work on a snapshot so that no registry lock is held
/// while they run.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    services: Vec<Service>,
    index: HashMap<String, usize>,
}

impl Topology {
    pub fn new(services: Vec<Service>) -> Self {
        let index = services
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id().to_string(), i))
            .collect();
        Self { services, index }
    }

    pub fn get(&self, id: &str) -> Option<&Service> {
        self.index.get(id).map(|&i| &self.services[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Effective ensemble leader of `id`.
    pub fn leader_of(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(|s| s.ensemble_leader())
    }

    /// Services whose effective leader is `leader`.
    pub fn members_of<'a>(&'a self, leader: &'a str) -> impl Iterator<Item = &'a Service> + 'a {
        self.services
            .iter()
            .filter(move |s| s.ensemble_leader() == Some(leader))
    }

    /// Services declaring an input on `channel`.
    pub fn consumers_of<'a>(&'a self, channel: &'a str) -> impl Iterator<Item = &'a Service> + 'a {
        self.services.iter().filter(move |s| s.has_input(channel))
    }
}

/// A connector as seen from a classification: which way it points and, where it
/// matters, the service on the other end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectorView {
    pub connector: Connector,
    pub direction: Direction,
    /// Service on the other end. `None` if it is not known locally.
    pub partner: Option<String>,
}

impl ConnectorView {
    pub fn new(connector: &Connector, direction: Direction, partner: Option<&str>) -> Self {
        Self {
            connector: connector.clone(),
            direction,
            partner: partner.map(str::to_string),
        }
    }

    pub fn channel(&self) -> &str {
        self.connector.name()
    }

    /// Id of the service declaring the connector.
    pub fn service(&self) -> &str {
        self.connector.service()
    }
}
