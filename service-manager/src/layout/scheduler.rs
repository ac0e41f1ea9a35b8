//! Dependency-ordered start and stop sequences.
//!
//! The order is computed as an iterative fixpoint over the target services:
//!
//! 1. Channels that link ensemble members inside their ensemble never need an external
//!    transport. Of the remaining channels, those produced and consumed locally are
//!    *locally resolvable*.
//! 2. In each round every unordered service is visited in input order. An ensemble member is
//!    orderable once its leader is ordered. Any other service is deferred in the first round
//!    if one of its outputs is locally resolvable, so that services depending on external
//!    prerequisites come first. Otherwise each output that is not yet known to be available
//!    is tested with the [`AvailabilityPredicate`]; if all pass, the service is ordered and
//!    its outputs become known-available.
//! 3. After the first round, the computation stops as soon as a round orders nothing new.
//! 4. Services left over (cycles, unavailable prerequisites) are appended in input order.
//!
//! A stop sequence is the reversed start sequence.

use edgeflow_api::Connector;
use log::{debug, warn};
use std::collections::HashSet;
use std::sync::Arc;

use crate::layout::classifier::{ensemble_connector_names, internal_connector_names};
use crate::layout::model::Topology;
use crate::runtime::NetworkManager;

/// Tests whether the upstream of a connector is already reachable.
pub trait AvailabilityPredicate: Send + Sync {
    fn test(&self, connector: &Connector) -> bool;
}

impl<F> AvailabilityPredicate for F
where
    F: Fn(&Connector) -> bool + Send + Sync,
{
    fn test(&self, connector: &Connector) -> bool {
        self(connector)
    }
}

/// Considers every connector available.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAvailable;

impl AvailabilityPredicate for AlwaysAvailable {
    fn test(&self, _connector: &Connector) -> bool {
        true
    }
}

/// A channel is available when the network manager has a port registered for it.
pub struct PortAvailability {
    network: Arc<dyn NetworkManager>,
}

impl PortAvailability {
    pub fn new(network: Arc<dyn NetworkManager>) -> Self {
        Self { network }
    }
}

impl AvailabilityPredicate for PortAvailability {
    fn test(&self, connector: &Connector) -> bool {
        self.network.port(connector.name()).is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleDirection {
    Start,
    Stop,
}

/// An availability check that did not pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedCheck {
    pub service: String,
    pub channel: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    /// Every target id exactly once, in execution order.
    pub order: Vec<String>,
    pub failed_checks: Vec<FailedCheck>,
    /// Ids that could not be ordered and were appended in input order.
    pub fallback: Vec<String>,
}

/// Computes the execution order of `targets`.
///
/// # Arguments
///
/// * `targets` - Service ids to order. Duplicates are dropped, ids unknown to the topology
///   have no prerequisites.
/// * `topology` - All locally known services.
/// * `predicate` - Decides whether an output channel is already reachable.
/// * `direction` - Start order or its reverse.
pub fn schedule(
    targets: &[String],
    topology: &Topology,
    predicate: &dyn AvailabilityPredicate,
    direction: ScheduleDirection,
) -> Schedule {
    let mut seen = HashSet::new();
    let unique: Vec<String> = targets
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect();

    let ensemble = ensemble_connector_names(topology, &unique);
    let resolvable: HashSet<String> = internal_connector_names(topology)
        .difference(&ensemble)
        .cloned()
        .collect();

    let mut result = Schedule::default();
    let mut ordered: HashSet<String> = HashSet::new();
    let mut known_available: HashSet<String> = HashSet::new();
    let mut round = 0;

    while ordered.len() < unique.len() {
        round += 1;
        let first_round = round == 1;
        let mut added = false;

        for id in &unique {
            if ordered.contains(id) {
                continue;
            }
            let orderable = match topology.get(id) {
                None => true,
                Some(service) => match service.ensemble_leader() {
                    Some(leader) => ordered.contains(leader),
                    None if first_round
                        && service.outputs().iter().any(|o| resolvable.contains(o.name())) =>
                    {
                        debug!("Scheduler: Deferring '{}', outputs resolvable locally", id);
                        false
                    }
                    None => {
                        let mut available = true;
                        for output in service.outputs() {
                            let channel = output.name();
                            if known_available.contains(channel) || ensemble.contains(channel) {
                                continue;
                            }
                            if !predicate.test(output) {
                                warn!(
                                    "Scheduler: Channel '{}' of '{}' is not available yet",
                                    channel, id
                                );
                                result.failed_checks.push(FailedCheck {
                                    service: id.clone(),
                                    channel: channel.to_string(),
                                });
                                available = false;
                                break;
                            }
                        }
                        if available {
                            known_available
                                .extend(service.outputs().iter().map(|o| o.name().to_string()));
                        }
                        available
                    }
                },
            };
            if orderable {
                ordered.insert(id.clone());
                result.order.push(id.clone());
                added = true;
            }
        }

        if !first_round && !added {
            break;
        }
    }

    for id in &unique {
        if !ordered.contains(id) {
            warn!("Scheduler: No dependency order for '{}', appending", id);
            result.fallback.push(id.clone());
            result.order.push(id.clone());
        }
    }

    if direction == ScheduleDirection::Stop {
        result.order.reverse();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgeflow_api::{ArtifactSpec, Service, ServiceKind, ServiceSpec};

    fn topology(artifacts: Vec<ArtifactSpec>) -> Topology {
        Topology::new(
            artifacts
                .iter()
                .flat_map(|a| a.services.iter().map(move |s| Service::from_spec(s, &a.id)))
                .collect(),
        )
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_targets() {
        let topo = Topology::default();
        let result = schedule(&[], &topo, &AlwaysAvailable, ScheduleDirection::Start);
        assert!(result.order.is_empty());
        assert!(result.failed_checks.is_empty());
    }

    #[test]
    fn test_duplicates_and_stop_reversal() {
        let topo = topology(vec![ArtifactSpec::new("a")
            .with_service(ServiceSpec::new("x", ServiceKind::Sink))
            .with_service(ServiceSpec::new("y", ServiceKind::Sink))]);
        let targets = ids(&["x", "y", "x"]);

        let start = schedule(&targets, &topo, &AlwaysAvailable, ScheduleDirection::Start);
        assert_eq!(start.order, ids(&["x", "y"]));
        let stop = schedule(&targets, &topo, &AlwaysAvailable, ScheduleDirection::Stop);
        assert_eq!(stop.order, ids(&["y", "x"]));
    }

    #[test]
    fn test_cycle_falls_back() {
        let topo = topology(vec![ArtifactSpec::new("a")
            .with_service(ServiceSpec::new("A", ServiceKind::Transformation).input("y", "Int").output("x", "Int"))
            .with_service(ServiceSpec::new("B", ServiceKind::Transformation).input("x", "Int").output("y", "Int"))]);
        let never = |_: &Connector| false;

        let result = schedule(&ids(&["A", "B"]), &topo, &never, ScheduleDirection::Start);
        assert_eq!(result.order, ids(&["A", "B"]));
        assert_eq!(result.fallback, ids(&["A", "B"]));
        assert!(!result.failed_checks.is_empty());
    }
}
