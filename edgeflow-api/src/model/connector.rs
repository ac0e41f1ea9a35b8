use serde::{Deserialize, Serialize};

/// Direction of a connector relative to the service declaring it.
///
/// A [`Connector`] does not store it: the direction follows from which list of the
/// service holds the connector. It only shows up explicitly in classifier views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    In,
    Out,
}

/// A named, typed data channel of a service.
///
/// Two services are connected when an output of one and an input of the other
/// share the same channel `name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connector {
    /// The channel name.
    name: String,
    /// Id of the service declaring the connector.
    #[serde(default)]
    service: String,
    /// Type descriptor of the transported data.
    #[serde(default)]
    data_type: String,
    /// Optional name of the function the connector is bound to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function: Option<String>,
}

impl Connector {
    pub fn new(name: impl Into<String>, service: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            service: service.into(),
            data_type: data_type.into(),
            function: None,
        }
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    /// Returns a copy owned by `service`. Descriptor files may omit the owner.
    pub(crate) fn owned_by(&self, service: &str) -> Self {
        Self {
            service: service.to_string(),
            ..self.clone()
        }
    }
}
