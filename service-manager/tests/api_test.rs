mod common;

use common::*;
use edgeflow_api::ServiceState;
use edgeflow_protocol::{AdminCommand, AdminResponse, ErrorKind};
use service_manager::api::handle_command;
use std::collections::HashMap;

#[tokio::test]
async fn test_admin_commands() {
    let h = harness();
    h.resolver
        .descriptors
        .lock()
        .unwrap()
        .insert("mem://app".into(), pipeline());
    let o = &h.orchestrator;

    assert_eq!(
        handle_command(o, AdminCommand::AddArtifact { uri: "mem://app".into() }).await,
        AdminResponse::Id("app".into())
    );

    let started = handle_command(
        o,
        AdminCommand::StartService {
            ids: ids(&["source", "sink"]),
            options: HashMap::new(),
        },
    )
    .await;
    assert!(!started.is_error(), "{:?}", started);

    assert_eq!(
        handle_command(o, AdminCommand::PassivateService { id: "sink".into() }).await,
        AdminResponse::Success("Service passivated".into())
    );
    assert_eq!(
        handle_command(o, AdminCommand::GetServiceState { id: "sink".into() }).await,
        AdminResponse::State(ServiceState::Passivated)
    );
    assert_eq!(
        handle_command(o, AdminCommand::GetServiceInstanceCount { id: "sink".into() }).await,
        AdminResponse::Count(1)
    );

    match handle_command(o, AdminCommand::ListArtifacts).await {
        AdminResponse::Artifacts(artifacts) => {
            assert_eq!(artifacts.len(), 1);
            assert_eq!(artifacts[0].id, "app");
            assert_eq!(artifacts[0].usage, 2);
            assert_eq!(artifacts[0].services.len(), 2);
        }
        other => panic!("unexpected response {:?}", other),
    }

    match handle_command(o, AdminCommand::RemoveArtifact { id: "app".into() }).await {
        AdminResponse::Error { kind, .. } => assert_eq!(kind, ErrorKind::IllegalState),
        other => panic!("unexpected response {:?}", other),
    }

    let stopped = handle_command(o, AdminCommand::StopService { ids: ids(&["source", "sink"]) }).await;
    assert!(!stopped.is_error(), "{:?}", stopped);
    assert!(!handle_command(o, AdminCommand::RemoveArtifact { id: "app".into() })
        .await
        .is_error());

    assert_eq!(
        handle_command(o, AdminCommand::Shutdown).await,
        AdminResponse::Success("Shutting down".into())
    );
}

#[tokio::test]
async fn test_error_kinds() {
    let h = harness();
    h.orchestrator.add_artifact_spec(pipeline()).unwrap();
    let o = &h.orchestrator;

    let kind_of = |response: AdminResponse| match response {
        AdminResponse::Error { kind, .. } => Some(kind),
        _ => None,
    };

    assert_eq!(
        kind_of(handle_command(o, AdminCommand::GetServiceState { id: "".into() }).await),
        Some(ErrorKind::InvalidArgument)
    );
    assert_eq!(
        kind_of(handle_command(o, AdminCommand::ActivateService { id: "ghost".into() }).await),
        Some(ErrorKind::UnknownEntity)
    );
    assert_eq!(
        kind_of(handle_command(o, AdminCommand::ActivateService { id: "sink".into() }).await),
        Some(ErrorKind::IllegalState)
    );
    assert_eq!(
        kind_of(
            handle_command(
                o,
                AdminCommand::SetServiceState {
                    id: "sink".into(),
                    state: ServiceState::Passivated,
                },
            )
            .await
        ),
        Some(ErrorKind::IllegalState)
    );

    h.substrate.fail("sink");
    assert_eq!(
        kind_of(
            handle_command(
                o,
                AdminCommand::StartService {
                    ids: ids(&["sink"]),
                    options: HashMap::new(),
                },
            )
            .await
        ),
        Some(ErrorKind::AggregatedFailure)
    );
}
