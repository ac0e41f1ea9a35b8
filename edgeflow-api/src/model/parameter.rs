use serde::{Deserialize, Serialize};

/// Describes one parameter of a service that can be changed while it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    name: String,
    #[serde(default)]
    description: String,
    /// Type descriptor of the value, e.g. `Integer`.
    #[serde(default = "default_type")]
    data_type: String,
}

fn default_type() -> String {
    "String".to_string()
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            data_type: data_type.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn data_type(&self) -> &str {
        &self.data_type
    }
}
