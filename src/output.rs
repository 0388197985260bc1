use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::resource::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "TYPE")]
    resource_type: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "ADDRESS")]
    address: String,
    #[tabled(rename = "SOURCE")]
    source: String,
    #[tabled(rename = "ATTRIBUTES")]
    attributes: usize,
    #[tabled(rename = "UNKNOWN")]
    unknown: usize,
}

impl From<&Resource> for ResourceRow {
    fn from(resource: &Resource) -> Self {
        Self {
            resource_type: resource.resource_type.clone(),
            name: resource.name.clone(),
            address: resource.display_address(),
            source: resource.source.to_string(),
            attributes: resource.attributes.len(),
            unknown: resource.unknown_attributes().len(),
        }
    }
}

pub fn render(resources: &[Resource], format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(resources),
        OutputFormat::Table if resources.is_empty() => Ok("No resources found.".to_string()),
        OutputFormat::Table => {
            let rows: Vec<ResourceRow> = resources.iter().map(ResourceRow::from).collect();
            Ok(Table::new(rows).with(Style::psql()).to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Source, UNKNOWN_VALUE};
    use serde_json::json;

    fn resources() -> Vec<Resource> {
        vec![
            Resource {
                resource_type: "google_storage_bucket".to_string(),
                name: "logs".to_string(),
                address: Some("module.audit.google_storage_bucket.logs".to_string()),
                provider_name: None,
                attributes: json!({"location": "US", "self_link": UNKNOWN_VALUE})
                    .as_object()
                    .cloned()
                    .unwrap(),
                source: Source::Plan,
            },
            Resource {
                resource_type: "google_project".to_string(),
                name: "p".to_string(),
                address: None,
                provider_name: None,
                attributes: Default::default(),
                source: Source::State,
            },
        ]
    }

    #[test]
    fn test_table_output() {
        let table = render(&resources(), OutputFormat::Table).unwrap();
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[0].contains("TYPE"));
        assert!(lines[0].contains("UNKNOWN"));
        assert!(table.contains("module.audit.google_storage_bucket.logs"));
        assert!(table.contains("google_project.p"));
        assert!(table.contains("plan"));
        assert!(table.contains("state"));
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(render(&[], OutputFormat::Table).unwrap(), "No resources found.");
    }

    #[test]
    fn test_json_output_is_ordered_array() {
        let json = render(&resources(), OutputFormat::Json).unwrap();
        let parsed: Vec<Resource> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, resources());
        assert!(json.find("logs").unwrap() < json.find("google_project").unwrap());
    }

    #[test]
    fn test_empty_json_is_empty_array() {
        assert_eq!(render(&[], OutputFormat::Json).unwrap(), "[]");
    }
}
