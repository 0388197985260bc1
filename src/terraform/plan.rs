//! Reads resources out of `terraform show -json <planfile>` output.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::TerraformError;
use super::module::{self, MANAGED, Values, managed_mode};
use crate::resource::{Resource, Source, unknown_value};

#[derive(Debug, Deserialize)]
struct Plan {
    #[serde(default)]
    resource_changes: Option<Vec<ResourceChange>>,
    #[serde(default)]
    planned_values: Option<Values>,
}

#[derive(Debug, Deserialize)]
struct ResourceChange {
    #[serde(default)]
    address: Option<String>,
    #[serde(default = "managed_mode")]
    mode: String,
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    #[serde(default)]
    provider_name: Option<String>,
    #[serde(default)]
    deposed: Option<String>,
    change: Change,
}

#[derive(Debug, Deserialize)]
struct Change {
    #[serde(default)]
    actions: Vec<String>,
    #[serde(default)]
    after: Value,
    #[serde(default)]
    after_unknown: Value,
}

impl Change {
    /// Nothing remains after apply: `after` is null and every action is a
    /// delete or forget.
    fn is_removal(&self) -> bool {
        self.after.is_null()
            && !self.actions.is_empty()
            && self
                .actions
                .iter()
                .all(|action| action == "delete" || action == "forget")
    }
}

/// Parses plan JSON into resources, in the order the plan lists them.
///
/// Resource changes are preferred; planned values are read only when the plan
/// has no `resource_changes` list at all. Values Terraform reports in
/// `after_unknown` are kept as [`crate::resource::UNKNOWN_VALUE`].
pub fn extract(bytes: &[u8]) -> Result<Vec<Resource>, TerraformError> {
    let document: Value = serde_json::from_slice(bytes)
        .map_err(|e| TerraformError::malformed(format!("plan is not valid JSON: {e}")))?;

    let Some(object) = document.as_object() else {
        return Err(TerraformError::malformed(format!(
            "plan must be a JSON object, got {}",
            module::kind(&document)
        )));
    };

    let present = |key: &str| object.get(key).is_some_and(|v| !v.is_null());
    if !present("resource_changes") && !present("planned_values") {
        return Err(TerraformError::malformed(
            "document is not a Terraform plan: no resource_changes or planned_values",
        ));
    }

    let plan: Plan = serde_json::from_value(document)
        .map_err(|e| TerraformError::malformed(format!("unexpected plan structure: {e}")))?;

    let resources = match (plan.resource_changes, plan.planned_values) {
        (Some(changes), _) => from_changes(changes)?,
        (None, Some(values)) => values.into_resources(Source::Plan)?,
        (None, None) => Vec::new(),
    };

    tracing::debug!(count = resources.len(), "read resources from plan");
    Ok(resources)
}

fn from_changes(changes: Vec<ResourceChange>) -> Result<Vec<Resource>, TerraformError> {
    let mut resources = Vec::with_capacity(changes.len());
    for rc in changes {
        if rc.mode != MANAGED {
            tracing::debug!(address = ?rc.address, "skipping data source");
            continue;
        }
        if let Some(deposed) = &rc.deposed {
            tracing::debug!(address = ?rc.address, %deposed, "skipping deposed object");
            continue;
        }
        if rc.change.is_removal() {
            tracing::debug!(address = ?rc.address, actions = ?rc.change.actions, "skipping removed resource");
            continue;
        }
        tracing::trace!(address = ?rc.address, actions = ?rc.change.actions, "resource change");

        let after = merge_unknown(rc.change.after, &rc.change.after_unknown);
        resources.push(module::build(
            rc.resource_type,
            rc.name,
            rc.address,
            rc.provider_name,
            after,
            Source::Plan,
        )?);
    }
    Ok(resources)
}

/// Overlays `after_unknown` onto `after`, replacing every position flagged
/// `true` with the unknown marker.
fn merge_unknown(after: Value, unknown: &Value) -> Value {
    match unknown {
        Value::Bool(true) => unknown_value(),
        Value::Object(flags) => {
            let mut map = match after {
                Value::Object(map) => map,
                Value::Null => Map::new(),
                // shape mismatch: trust the concrete value
                other => return other,
            };
            for (key, flag) in flags {
                if !has_unknown(flag) {
                    continue;
                }
                let current = map.remove(key).unwrap_or(Value::Null);
                map.insert(key.clone(), merge_unknown(current, flag));
            }
            Value::Object(map)
        }
        Value::Array(flags) => {
            let mut items = match after {
                Value::Array(items) => items,
                Value::Null => Vec::new(),
                other => return other,
            };
            for (i, flag) in flags.iter().enumerate() {
                if !has_unknown(flag) {
                    continue;
                }
                if i < items.len() {
                    let current = std::mem::take(&mut items[i]);
                    items[i] = merge_unknown(current, flag);
                } else {
                    items.resize(i, Value::Null);
                    items.push(merge_unknown(Value::Null, flag));
                }
            }
            Value::Array(items)
        }
        _ => after,
    }
}

fn has_unknown(flag: &Value) -> bool {
    match flag {
        Value::Bool(b) => *b,
        Value::Object(map) => map.values().any(has_unknown),
        Value::Array(items) => items.iter().any(has_unknown),
        _ => false,
    }
}
