use thiserror::Error;

use crate::model::state::ServiceState;

/// Errors raised by the domain model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The lifecycle state machine does not allow this transition.
    #[error("invalid state transition {from} -> {to}")]
    InvalidTransition { from: ServiceState, to: ServiceState },

    /// A start option carried a value that is not the expected JSON structure.
    #[error("malformed option '{key}': {reason}")]
    MalformedOption { key: String, reason: String },

    /// A state name could not be parsed.
    #[error("unknown service state '{0}'")]
    UnknownState(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;
