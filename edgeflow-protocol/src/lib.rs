pub mod channel;
pub mod control;
pub mod messages;

pub use channel::LineChannel;
pub use control::{ControlRequest, ControlResponse};
pub use messages::{AdminCommand, AdminResponse, ArtifactSummary, ErrorKind, ServiceSummary};
