//! JSON Schema for the configuration file.

use crate::config::Settings;

/// Generates a JSON Schema for the Wallshift configuration.
#[must_use]
pub fn generate_schema() -> schemars::Schema {
    let mut schema = schemars::schema_for!(Settings);

    if let Some(obj) = schema.as_object_mut() {
        obj.insert("title".to_string(), serde_json::json!("Wallshift configuration"));
    }

    schema
}

/// Generates a pretty-printed JSON Schema string for the configuration.
#[must_use]
pub fn print_schema() -> String {
    serde_json::to_string_pretty(&generate_schema()).unwrap_or_default()
}
