//! The `values`/`planned_values` module tree shared by `terraform show -json`
//! state output and the plan's planned values.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::TerraformError;
use crate::resource::{Resource, Source};

pub(super) const MANAGED: &str = "managed";

pub(super) fn managed_mode() -> String {
    MANAGED.to_string()
}

#[derive(Debug, Deserialize)]
pub(super) struct Values {
    #[serde(default)]
    pub root_module: Option<Module>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Module {
    #[serde(default)]
    pub resources: Vec<ModuleResource>,
    #[serde(default)]
    pub child_modules: Vec<Module>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ModuleResource {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "managed_mode")]
    pub mode: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub values: Value,
}

impl Values {
    /// Flattens the module tree: each module's own resources first, then its
    /// children depth-first, all in document order.
    pub fn into_resources(self, source: Source) -> Result<Vec<Resource>, TerraformError> {
        let mut out = Vec::new();
        if let Some(root) = self.root_module {
            collect(root, source, &mut out)?;
        }
        Ok(out)
    }
}

fn collect(module: Module, source: Source, out: &mut Vec<Resource>) -> Result<(), TerraformError> {
    for resource in module.resources {
        if resource.mode != MANAGED {
            tracing::debug!(resource_type = %resource.resource_type, name = %resource.name, "skipping data source");
            continue;
        }
        out.push(build(
            resource.resource_type,
            resource.name,
            resource.address,
            resource.provider_name,
            resource.values,
            source,
        )?);
    }
    for child in module.child_modules {
        collect(child, source, out)?;
    }
    Ok(())
}

/// Assembles a [`Resource`], rejecting entries that cannot be represented
/// faithfully.
pub(super) fn build(
    resource_type: String,
    name: String,
    address: Option<String>,
    provider_name: Option<String>,
    attributes: Value,
    source: Source,
) -> Result<Resource, TerraformError> {
    if resource_type.is_empty() {
        return Err(TerraformError::malformed(format!(
            "resource {} has an empty type",
            address.as_deref().unwrap_or(&name)
        )));
    }
    if name.is_empty() {
        return Err(TerraformError::malformed(format!(
            "resource of type {resource_type} has an empty name"
        )));
    }

    let attributes = match attributes {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(TerraformError::malformed(format!(
                "attributes of {resource_type}.{name} must be an object, got {}",
                kind(&other)
            )));
        }
    };

    Ok(Resource {
        resource_type,
        name,
        address,
        provider_name,
        attributes,
        source,
    })
}

pub(super) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_child_modules_follow_parent_resources() {
        let values: Values = serde_json::from_value(json!({
            "root_module": {
                "resources": [{"type": "a", "name": "one"}],
                "child_modules": [
                    {
                        "resources": [{"type": "b", "name": "two"}],
                        "child_modules": [{"resources": [{"type": "c", "name": "three"}]}]
                    },
                    {"resources": [{"type": "d", "name": "four"}]}
                ]
            }
        }))
        .unwrap();

        let names: Vec<String> = values
            .into_resources(Source::State)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, ["one", "two", "three", "four"]);
    }

    #[test]
    fn test_missing_root_module_is_empty() {
        let values: Values = serde_json::from_value(json!({})).unwrap();
        assert!(values.into_resources(Source::State).unwrap().is_empty());
    }

    #[test]
    fn test_build_rejects_empty_name() {
        let err = build(
            "google_storage_bucket".to_string(),
            String::new(),
            None,
            None,
            Value::Null,
            Source::State,
        )
        .unwrap_err();
        assert!(matches!(err, TerraformError::MalformedInput(_)));
    }

    #[test]
    fn test_build_rejects_non_object_attributes() {
        let err = build(
            "google_storage_bucket".to_string(),
            "logs".to_string(),
            None,
            None,
            json!(["US"]),
            Source::State,
        )
        .unwrap_err();
        assert!(err.to_string().contains("must be an object, got an array"));
    }
}
