//! Terraform state parser.
//!
//! Accepts both `terraform show -json` output for a state and raw tfstate v4
//! files, and extracts every managed resource instance.

use serde::Deserialize;
use serde_json::Value;

use super::TerraformError;
use super::module::{self, MANAGED, Values, managed_mode};
use crate::resource::{Resource, Source};

const SUPPORTED_STATE_VERSION: u64 = 4;

#[derive(Debug, Deserialize)]
struct ShowState {
    #[serde(default)]
    values: Option<Values>,
}

#[derive(Debug, Deserialize)]
struct RawState {
    version: u64,
    #[serde(default)]
    resources: Vec<RawResource>,
}

#[derive(Debug, Deserialize)]
struct RawResource {
    #[serde(default)]
    module: Option<String>,
    #[serde(default = "managed_mode")]
    mode: String,
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    instances: Vec<RawInstance>,
}

#[derive(Debug, Deserialize)]
struct RawInstance {
    #[serde(default)]
    index_key: Option<Value>,
    #[serde(default)]
    attributes: Value,
}

/// Parses state JSON into resources, in document order.
///
/// Resources inside child modules are included. A plan document is rejected
/// rather than read as state.
pub fn extract(bytes: &[u8]) -> Result<Vec<Resource>, TerraformError> {
    let document: Value = serde_json::from_slice(bytes)
        .map_err(|e| TerraformError::malformed(format!("state is not valid JSON: {e}")))?;

    let Some(object) = document.as_object() else {
        return Err(TerraformError::malformed(format!(
            "state must be a JSON object, got {}",
            module::kind(&document)
        )));
    };

    if object.contains_key("resource_changes") || object.contains_key("planned_values") {
        return Err(TerraformError::malformed(
            "document is a Terraform plan, not a state",
        ));
    }

    let resources = if object.contains_key("values") {
        let state: ShowState = serde_json::from_value(document)
            .map_err(|e| TerraformError::malformed(format!("unexpected state structure: {e}")))?;
        match state.values {
            Some(values) => values.into_resources(Source::State)?,
            None => Vec::new(),
        }
    } else if object.contains_key("version") {
        let raw: RawState = serde_json::from_value(document)
            .map_err(|e| TerraformError::malformed(format!("unexpected tfstate structure: {e}")))?;
        from_raw(raw)?
    } else if object.contains_key("format_version") {
        // `terraform show -json` omits `values` for an empty state
        Vec::new()
    } else {
        return Err(TerraformError::malformed(
            "document is not a Terraform state: no values or resources",
        ));
    };

    tracing::debug!(count = resources.len(), "read resources from state");
    Ok(resources)
}

fn from_raw(state: RawState) -> Result<Vec<Resource>, TerraformError> {
    if state.version != SUPPORTED_STATE_VERSION {
        return Err(TerraformError::malformed(format!(
            "unsupported tfstate version {} (expected {SUPPORTED_STATE_VERSION})",
            state.version
        )));
    }

    let mut resources = Vec::new();
    for mut resource in state.resources {
        if resource.mode != MANAGED {
            continue;
        }
        let provider_name = resource.provider.as_deref().map(provider_source);
        let instances = std::mem::take(&mut resource.instances);

        for instance in instances {
            let address = raw_address(&resource, instance.index_key.as_ref());
            resources.push(module::build(
                resource.resource_type.clone(),
                resource.name.clone(),
                Some(address),
                provider_name.clone(),
                instance.attributes,
                Source::State,
            )?);
        }
    }
    Ok(resources)
}

fn raw_address(resource: &RawResource, index_key: Option<&Value>) -> String {
    let mut address = String::new();
    if let Some(module) = resource.module.as_deref().filter(|m| !m.is_empty()) {
        address.push_str(module);
        address.push('.');
    }
    address.push_str(&resource.resource_type);
    address.push('.');
    address.push_str(&resource.name);

    match index_key {
        Some(Value::Number(n)) => address.push_str(&format!("[{n}]")),
        Some(Value::String(s)) => address.push_str(&format!("[{}]", Value::String(s.clone()))),
        _ => {}
    }
    address
}

// `provider["registry.terraform.io/hashicorp/google"]` -> `registry.terraform.io/hashicorp/google`
fn provider_source(provider: &str) -> String {
    provider
        .find("provider[\"")
        .map(|start| &provider[start + "provider[\"".len()..])
        .and_then(|rest| rest.strip_suffix("\"]"))
        .unwrap_or(provider)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state_bytes(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_single_top_level_resource() {
        let bytes = state_bytes(json!({
            "format_version": "1.0",
            "values": {
                "root_module": {
                    "resources": [
                        {"type": "storage_bucket", "name": "logs", "values": {"location": "US"}}
                    ]
                }
            }
        }));

        let resources = extract(&bytes).unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].resource_type, "storage_bucket");
        assert_eq!(resources[0].name, "logs");
        assert_eq!(
            Value::Object(resources[0].attributes.clone()),
            json!({"location": "US"})
        );
        assert_eq!(resources[0].source, Source::State);
    }

    #[test]
    fn test_child_modules_traversed() {
        let bytes = state_bytes(json!({
            "values": {
                "root_module": {
                    "resources": [
                        {"address": "google_project.p", "mode": "managed", "type": "google_project", "name": "p", "values": {}},
                        {"address": "data.google_client_config.c", "mode": "data", "type": "google_client_config", "name": "c", "values": {}}
                    ],
                    "child_modules": [{
                        "address": "module.logging",
                        "resources": [
                            {"address": "module.logging.google_storage_bucket.logs", "mode": "managed", "type": "google_storage_bucket", "name": "logs", "values": {"location": "US"}}
                        ],
                        "child_modules": [{
                            "address": "module.logging.module.sink",
                            "resources": [
                                {"address": "module.logging.module.sink.google_logging_project_sink.s", "mode": "managed", "type": "google_logging_project_sink", "name": "s", "values": {}}
                            ]
                        }]
                    }]
                }
            }
        }));

        let addresses: Vec<String> = extract(&bytes)
            .unwrap()
            .into_iter()
            .map(|r| r.address.unwrap())
            .collect();
        assert_eq!(
            addresses,
            [
                "google_project.p",
                "module.logging.google_storage_bucket.logs",
                "module.logging.module.sink.google_logging_project_sink.s",
            ]
        );
    }

    #[test]
    fn test_empty_show_state() {
        let bytes = state_bytes(json!({"format_version": "1.0"}));
        assert!(extract(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_raw_tfstate_v4() {
        let bytes = state_bytes(json!({
            "version": 4,
            "terraform_version": "1.5.7",
            "serial": 3,
            "lineage": "8f0e6b5c",
            "outputs": {},
            "resources": [
                {
                    "mode": "managed",
                    "type": "google_storage_bucket",
                    "name": "logs",
                    "provider": "provider[\"registry.terraform.io/hashicorp/google\"]",
                    "instances": [
                        {"index_key": 0, "attributes": {"location": "US"}},
                        {"index_key": 1, "attributes": {"location": "EU"}}
                    ]
                },
                {
                    "mode": "data",
                    "type": "google_project",
                    "name": "current",
                    "provider": "provider[\"registry.terraform.io/hashicorp/google\"]",
                    "instances": [{"attributes": {}}]
                },
                {
                    "module": "module.net",
                    "mode": "managed",
                    "type": "google_compute_network",
                    "name": "vpc",
                    "provider": "module.net.provider[\"registry.terraform.io/hashicorp/google\"]",
                    "instances": [{"index_key": "primary", "attributes": {"name": "vpc"}}]
                }
            ]
        }));

        let resources = extract(&bytes).unwrap();
        assert_eq!(resources.len(), 3);
        assert_eq!(resources[0].address.as_deref(), Some("google_storage_bucket.logs[0]"));
        assert_eq!(resources[0].attributes["location"], "US");
        assert_eq!(resources[1].address.as_deref(), Some("google_storage_bucket.logs[1]"));
        assert_eq!(resources[1].attributes["location"], "EU");
        assert_eq!(
            resources[2].address.as_deref(),
            Some("module.net.google_compute_network.vpc[\"primary\"]")
        );
        assert_eq!(
            resources[2].provider_name.as_deref(),
            Some("registry.terraform.io/hashicorp/google")
        );
    }

    #[test]
    fn test_unsupported_raw_version() {
        let bytes = state_bytes(json!({"version": 3, "modules": []}));
        let err = extract(&bytes).unwrap_err();
        assert!(err.to_string().contains("unsupported tfstate version 3"));
    }

    #[test]
    fn test_provider_source() {
        assert_eq!(
            provider_source("provider[\"registry.terraform.io/hashicorp/google\"]"),
            "registry.terraform.io/hashicorp/google"
        );
        assert_eq!(provider_source("google"), "google");
    }

    #[test]
    fn test_deterministic() {
        let bytes = state_bytes(json!({
            "values": {"root_module": {"resources": [
                {"type": "a", "name": "x", "values": {"k": [1, 2]}},
                {"type": "b", "name": "y", "values": {"k": {"n": true}}}
            ]}}
        }));
        assert_eq!(extract(&bytes).unwrap(), extract(&bytes).unwrap());
    }

    #[test]
    fn test_malformed_inputs() {
        let cases: &[&[u8]] = &[
            b"",
            b"{\"values\": {\"root_module\": {",
            b"null",
            b"[1, 2]",
            b"{}",
            br#"{"format_version": "1.2", "resource_changes": []}"#,
            br#"{"planned_values": {"root_module": {}}}"#,
            br#"{"values": {"root_module": {"resources": [{"type": "a"}]}}}"#,
            br#"{"values": {"root_module": {"resources": [{"type": "a", "name": "x", "values": 7}]}}}"#,
            br#"{"version": 4, "resources": [{"type": "a", "name": "", "instances": [{}]}]}"#,
            br#"{"version": "four"}"#,
        ];

        for case in cases {
            let result = extract(case);
            assert!(
                matches!(result, Err(TerraformError::MalformedInput(_))),
                "expected MalformedInput for {:?}, got {:?}",
                String::from_utf8_lossy(case),
                result
            );
        }
    }
}
