use edgeflow_api::{ApiError, ServiceState};
use edgeflow_protocol::ErrorKind;
use thiserror::Error;

/// Errors raised by the service manager.
#[derive(Error, Debug)]
pub enum ManagerError {
    /// Empty or otherwise unusable argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An id that does not name a registered artifact or service.
    #[error("unknown {kind} '{id}'")]
    UnknownEntity { kind: &'static str, id: String },

    /// Registration of an id that is already taken.
    #[error("duplicate id '{0}'")]
    DuplicateId(String),

    /// The operation is not allowed in the current state.
    #[error("cannot {operation} '{id}' in state {state}")]
    IllegalState {
        id: String,
        state: ServiceState,
        operation: &'static str,
    },

    /// The substrate reported a failed deployment.
    #[error("deployment of '{id}' failed: {log}")]
    DeploymentFailure { id: String, log: String },

    /// Failures collected over a multi-service operation.
    #[error("{}", join_failures(.0))]
    AggregatedFailure(Vec<ManagerError>),

    #[error("{0} is not implemented")]
    Unimplemented(&'static str),

    /// A collaborator (substrate, control stub, resolver) failed.
    #[error("{id}: {reason:#}")]
    Collaborator { id: String, reason: anyhow::Error },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

fn join_failures(failures: &[ManagerError]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ManagerError {
    pub fn unknown_service(id: &str) -> Self {
        ManagerError::UnknownEntity {
            kind: "service",
            id: id.to_string(),
        }
    }

    pub fn unknown_artifact(id: &str) -> Self {
        ManagerError::UnknownEntity {
            kind: "artifact",
            id: id.to_string(),
        }
    }

    pub fn collaborator(id: &str, reason: anyhow::Error) -> Self {
        ManagerError::Collaborator {
            id: id.to_string(),
            reason,
        }
    }

    /// Collapses a list of failures: none is `Ok`, anything else one aggregated error.
    pub fn aggregate(failures: Vec<ManagerError>) -> Result<()> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ManagerError::AggregatedFailure(failures))
        }
    }

    /// The category reported on the administrative surface.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ManagerError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ManagerError::UnknownEntity { .. } => ErrorKind::UnknownEntity,
            ManagerError::DuplicateId(_) => ErrorKind::DuplicateId,
            ManagerError::IllegalState { .. } => ErrorKind::IllegalState,
            ManagerError::DeploymentFailure { .. } => ErrorKind::DeploymentFailure,
            ManagerError::AggregatedFailure(_) => ErrorKind::AggregatedFailure,
            ManagerError::Unimplemented(_) => ErrorKind::Unimplemented,
            ManagerError::Collaborator { .. } => ErrorKind::Collaborator,
            ManagerError::Api(ApiError::InvalidTransition { .. }) => ErrorKind::IllegalState,
            ManagerError::Api(_) => ErrorKind::InvalidArgument,
            ManagerError::Config(_) => ErrorKind::Config,
        }
    }
}

pub type Result<T> = std::result::Result<T, ManagerError>;
