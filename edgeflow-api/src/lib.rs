//! # Edgeflow API
//!
//! Shared domain model of the edgeflow service manager.
//!
//! ## Modules
//! - `model`: artifacts, services, connectors, the lifecycle state machine and start options.
//! - `error`: errors raised by the model itself (invalid transitions, malformed options).
//!
//! This crate is pure data: it performs no I/O.

pub mod error;
pub mod model;

pub use error::ApiError;
pub use model::artifact::{Artifact, ArtifactSpec};
pub use model::connector::{Connector, Direction};
pub use model::ids;
pub use model::kind::ServiceKind;
pub use model::options::StartOptions;
pub use model::parameter::ParameterDescriptor;
pub use model::server::ServerSpec;
pub use model::service::{Service, ServiceSpec};
pub use model::state::ServiceState;
