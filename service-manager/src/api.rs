//! Dispatch of administrative commands to the orchestrator.

use edgeflow_protocol::{AdminCommand, AdminResponse};
use log::info;

use crate::error::{ManagerError, Result};
use crate::supervisor::Orchestrator;

fn reply(result: Result<AdminResponse>) -> AdminResponse {
    match result {
        Ok(response) => response,
        Err(e) => error_response(&e),
    }
}

pub fn error_response(error: &ManagerError) -> AdminResponse {
    AdminResponse::Error {
        kind: error.kind(),
        message: error.to_string(),
    }
}

fn done(what: &str) -> AdminResponse {
    AdminResponse::Success(what.to_string())
}

/// Executes one command. `Shutdown` is acknowledged only, the caller ends its loop.
pub async fn handle_command(orchestrator: &Orchestrator, command: AdminCommand) -> AdminResponse {
    info!("Api: {:?}", command);
    match command {
        AdminCommand::AddArtifact { uri } => {
            reply(orchestrator.add_artifact(&uri).await.map(AdminResponse::Id))
        }
        AdminCommand::RemoveArtifact { id } => reply(
            orchestrator
                .remove_artifact(&id)
                .await
                .map(|_| done("Artifact removed")),
        ),
        AdminCommand::StartService { ids, options } => reply(
            orchestrator
                .start_service(&ids, &options)
                .await
                .map(|_| done("Services started")),
        ),
        AdminCommand::StopService { ids } => reply(
            orchestrator
                .stop_service(&ids)
                .await
                .map(|_| done("Services stopped")),
        ),
        AdminCommand::MigrateService { id, resource } => reply(
            orchestrator
                .migrate_service(&id, &resource)
                .await
                .map(|_| done("Service migrated")),
        ),
        AdminCommand::SwitchToService { old, new } => reply(
            orchestrator
                .switch_to_service(&old, &new)
                .await
                .map(|_| done("Service switched")),
        ),
        AdminCommand::PassivateService { id } => reply(
            orchestrator
                .passivate_service(&id)
                .await
                .map(|_| done("Service passivated")),
        ),
        AdminCommand::ActivateService { id } => reply(
            orchestrator
                .activate_service(&id)
                .await
                .map(|_| done("Service activated")),
        ),
        AdminCommand::ReconfigureService { id, values } => reply(
            orchestrator
                .reconfigure_service(&id, &values)
                .await
                .map(|_| done("Service reconfigured")),
        ),
        AdminCommand::GetServiceState { id } => {
            reply(orchestrator.service_state(&id).map(AdminResponse::State))
        }
        AdminCommand::SetServiceState { id, state } => reply(
            orchestrator
                .set_service_state(&id, state)
                .await
                .map(|_| done("State set")),
        ),
        AdminCommand::GetServiceInstanceCount { id } => reply(
            orchestrator
                .service_instance_count(&id)
                .map(AdminResponse::Count),
        ),
        AdminCommand::ListArtifacts => AdminResponse::Artifacts(orchestrator.artifact_summaries()),
        AdminCommand::Shutdown => done("Shutting down"),
    }
}
