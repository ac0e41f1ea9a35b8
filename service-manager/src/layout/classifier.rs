//! Connector classification.
//!
//! When only part of an application runs on this device, some of its bindings cannot use an
//! in-process channel and must be routed through an external transport. The functions here
//! split the connectors of a target set `S` (given as service ids) against the full local
//! [`Topology`] accordingly.
//!
//! All functions are pure. Ids in `targets` that the topology does not know are ignored.

use edgeflow_api::{Direction, Service, ServiceKind};
use std::collections::HashSet;

use crate::layout::model::{ConnectorView, Topology};

fn resolve<'a>(topology: &'a Topology, targets: &[String]) -> Vec<&'a Service> {
    let mut seen = HashSet::new();
    targets
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .filter_map(|id| topology.get(id))
        .collect()
}

/// Channel names a member of `targets` uses inside its ensemble, i.e. the names of its
/// connectors that pair with a complementary connector of its leader or of a fellow member.
pub fn ensemble_connector_names(topology: &Topology, targets: &[String]) -> HashSet<String> {
    let mut names = HashSet::new();
    for service in resolve(topology, targets) {
        let Some(leader) = service.ensemble_leader() else {
            continue;
        };
        let group: Vec<&Service> = topology
            .get(leader)
            .into_iter()
            .chain(topology.members_of(leader))
            .filter(|other| other.id() != service.id())
            .collect();

        for output in service.outputs() {
            if group.iter().any(|other| other.has_input(output.name())) {
                names.insert(output.name().to_string());
            }
        }
        for input in service.inputs() {
            if group.iter().any(|other| other.has_output(input.name())) {
                names.insert(input.name().to_string());
            }
        }
    }
    names
}

/// Channel names produced and consumed by locally known services, i.e. resolvable without
/// an external transport.
pub fn internal_connector_names(topology: &Topology) -> HashSet<String> {
    let produced: HashSet<&str> = topology
        .services()
        .iter()
        .flat_map(|s| s.outputs().iter().map(|c| c.name()))
        .collect();
    topology
        .services()
        .iter()
        .flat_map(|s| s.inputs().iter().map(|c| c.name()))
        .filter(|name| produced.contains(name))
        .map(str::to_string)
        .collect()
}

/// Connectors of `targets` that cross the boundary of the target set.
///
/// * Outputs of top-level targets whose consumer lies outside the set, one view per outside
///   consumer, or a single view without partner if no local service consumes the channel.
/// * Outputs of top-level services of the same artifacts, outside the set, that feed a
///   target. These are reported as the target's input with the outside service as partner.
pub fn determine_external_connections(topology: &Topology, targets: &[String]) -> Vec<ConnectorView> {
    let members = resolve(topology, targets);
    let in_set: HashSet<&str> = members.iter().map(|s| s.id()).collect();
    let mut result = Vec::new();

    for service in members.iter().filter(|s| s.is_top_level()) {
        for output in service.outputs() {
            let consumers: Vec<&Service> = topology.consumers_of(output.name()).collect();
            if consumers.is_empty() {
                result.push(ConnectorView::new(output, Direction::Out, None));
                continue;
            }
            for consumer in consumers.iter().filter(|c| !in_set.contains(c.id())) {
                result.push(ConnectorView::new(output, Direction::Out, Some(consumer.id())));
            }
        }
    }

    let artifacts: HashSet<&str> = members.iter().map(|s| s.artifact_id()).collect();
    let outside = topology.services().iter().filter(|s| {
        s.is_top_level() && artifacts.contains(s.artifact_id()) && !in_set.contains(s.id())
    });
    for producer in outside {
        for output in producer.outputs() {
            for service in &members {
                if let Some(input) = service.inputs().iter().find(|i| i.name() == output.name()) {
                    result.push(ConnectorView::new(input, Direction::In, Some(producer.id())));
                }
            }
        }
    }
    result
}

/// Outputs of `targets` consumed by another member of the set, one view per consumer.
pub fn determine_internal_connections(topology: &Topology, targets: &[String]) -> Vec<ConnectorView> {
    let members = resolve(topology, targets);
    let mut result = Vec::new();
    for service in &members {
        for output in service.outputs() {
            for consumer in members.iter().filter(|c| c.has_input(output.name())) {
                result.push(ConnectorView::new(output, Direction::Out, Some(consumer.id())));
            }
        }
    }
    result
}

/// The connectors characterizing the set as a whole: outputs of sources, inputs of
/// everything else.
pub fn determine_functional_connections(topology: &Topology, targets: &[String]) -> Vec<ConnectorView> {
    let mut result = Vec::new();
    for service in resolve(topology, targets) {
        if service.kind() == ServiceKind::Source {
            result.extend(
                service
                    .outputs()
                    .iter()
                    .map(|c| ConnectorView::new(c, Direction::Out, None)),
            );
        } else {
            result.extend(
                service
                    .inputs()
                    .iter()
                    .map(|c| ConnectorView::new(c, Direction::In, None)),
            );
        }
    }
    result
}

/// Distinct, non-empty function names of `views`, joined by `;` in order of appearance.
pub fn function_definition(views: &[ConnectorView]) -> String {
    let mut seen = HashSet::new();
    views
        .iter()
        .filter_map(|v| v.connector.function())
        .filter(|f| !f.is_empty() && seen.insert(*f))
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgeflow_api::{ArtifactSpec, Connector, Service, ServiceSpec};

    fn topology(artifacts: Vec<ArtifactSpec>) -> Topology {
        let services = artifacts
            .iter()
            .flat_map(|a| a.services.iter().map(move |s| Service::from_spec(s, &a.id)))
            .collect();
        Topology::new(services)
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn channels(views: &[ConnectorView]) -> Vec<(&str, &str, Option<&str>)> {
        views
            .iter()
            .map(|v| (v.service(), v.channel(), v.partner.as_deref()))
            .collect()
    }

    /// src -> (a) -> mid -> (b) -> snk, all in one artifact.
    fn pipeline() -> Topology {
        topology(vec![ArtifactSpec::new("app")
            .with_service(ServiceSpec::new("src", ServiceKind::Source).output("a", "Int"))
            .with_service(
                ServiceSpec::new("mid", ServiceKind::Transformation)
                    .input("a", "Int")
                    .output("b", "Int"),
            )
            .with_service(ServiceSpec::new("snk", ServiceKind::Sink).input("b", "Int"))])
    }

    #[test]
    fn test_internal_names_independent_of_targets() {
        let topo = pipeline();
        let names = internal_connector_names(&topo);
        assert_eq!(names, ["a", "b"].iter().map(|s| s.to_string()).collect());
    }

    #[test]
    fn test_partial_deployment_split() {
        let topo = pipeline();
        let targets = ids(&["mid", "snk"]);

        let internal = determine_internal_connections(&topo, &targets);
        assert_eq!(channels(&internal), vec![("mid", "b", Some("snk"))]);

        // src stays outside but feeds mid
        let external = determine_external_connections(&topo, &targets);
        assert_eq!(channels(&external), vec![("mid", "a", Some("src"))]);
        assert_eq!(external[0].direction, Direction::In);

        let targets = ids(&["src"]);
        let external = determine_external_connections(&topo, &targets);
        assert_eq!(channels(&external), vec![("src", "a", Some("mid"))]);
        assert!(determine_internal_connections(&topo, &targets).is_empty());
    }

    #[test]
    fn test_unconsumed_output_is_external() {
        let topo = topology(vec![ArtifactSpec::new("x")
            .with_service(ServiceSpec::new("lonely", ServiceKind::Source).output("out", "Int"))]);
        let external = determine_external_connections(&topo, &ids(&["lonely"]));
        assert_eq!(channels(&external), vec![("lonely", "out", None)]);
    }

    #[test]
    fn test_internal_and_external_disjoint() {
        let topo = pipeline();
        for targets in [ids(&["src", "mid"]), ids(&["mid"]), ids(&["src", "mid", "snk"])] {
            let internal = determine_internal_connections(&topo, &targets);
            let external = determine_external_connections(&topo, &targets);
            for view in &internal {
                assert!(!external.contains(view), "{:?} in both", view);
            }
        }
        assert!(determine_external_connections(&topo, &ids(&["src", "mid", "snk"])).is_empty());
    }

    #[test]
    fn test_functional_connections() {
        let topo = pipeline();
        let functional = determine_functional_connections(&topo, &ids(&["src", "snk"]));
        assert_eq!(
            channels(&functional),
            vec![("src", "a", None), ("snk", "b", None)]
        );
        assert_eq!(functional[0].direction, Direction::Out);
        assert_eq!(functional[1].direction, Direction::In);
    }

    #[test]
    fn test_ensemble_names() {
        let topo = topology(vec![ArtifactSpec::new("a")
            .with_service(
                ServiceSpec::new("member", ServiceKind::Transformation)
                    .input("input", "Int")
                    .output("intl", "Int")
                    .leader("leader"),
            )
            .with_service(
                ServiceSpec::new("leader", ServiceKind::Transformation)
                    .input("intl", "Int")
                    .output("output", "Int"),
            )]);

        let names = ensemble_connector_names(&topo, &ids(&["member", "leader"]));
        assert_eq!(names, ["intl".to_string()].into_iter().collect());
        // members are not top-level: their outputs never count as external
        let external = determine_external_connections(&topo, &ids(&["member"]));
        assert!(external.iter().all(|v| v.service() != "member"));
    }

    #[test]
    fn test_function_definition() {
        let views = vec![
            ConnectorView::new(&Connector::new("a", "s", "Int").with_function("f"), Direction::In, None),
            ConnectorView::new(&Connector::new("b", "s", "Int"), Direction::In, None),
            ConnectorView::new(&Connector::new("c", "s", "Int").with_function("g"), Direction::In, None),
            ConnectorView::new(&Connector::new("d", "s", "Int").with_function("f"), Direction::In, None),
            ConnectorView::new(&Connector::new("e", "s", "Int").with_function(""), Direction::In, None),
        ];
        assert_eq!(function_definition(&views), "f;g");
        assert_eq!(function_definition(&[]), "");
    }
}
