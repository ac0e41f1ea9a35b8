use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a service by its position in the data flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceKind {
    /// Ingests data into the platform; its outputs characterize it.
    Source,
    /// Consumes and produces data.
    #[default]
    Transformation,
    /// Consumes data only.
    Sink,
    /// Observes a data flow without changing it.
    Probe,
    /// A shared, host-pinned auxiliary server.
    Server,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceKind::Source => "SOURCE",
            ServiceKind::Transformation => "TRANSFORMATION",
            ServiceKind::Sink => "SINK",
            ServiceKind::Probe => "PROBE",
            ServiceKind::Server => "SERVER",
        };
        f.write_str(name)
    }
}
