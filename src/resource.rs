use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Placeholder stored for attributes Terraform cannot know until apply.
pub const UNKNOWN_VALUE: &str = "(known after apply)";

/// Where a [`Resource`] was read from.
///
/// Plans may carry unknown values, state never does, so the two are kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Plan,
    State,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Plan => f.write_str("plan"),
            Source::State => f.write_str("state"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Resource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    pub source: Source,
}

impl Resource {
    /// `type.name`, or the full address when one is known.
    pub fn display_address(&self) -> String {
        match &self.address {
            Some(address) => address.clone(),
            None => format!("{}.{}", self.resource_type, self.name),
        }
    }

    /// Top-level attribute names whose value is unknown at plan time.
    pub fn unknown_attributes(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(_, value)| is_unknown(value))
            .map(|(key, _)| key.as_str())
            .collect()
    }
}

pub fn unknown_value() -> Value {
    Value::String(UNKNOWN_VALUE.to_string())
}

pub fn is_unknown(value: &Value) -> bool {
    value.as_str() == Some(UNKNOWN_VALUE)
}
