//! Schema tree for structured (`object`) generation.
//!
//! A schema is a list of named, typed fields. `object` and `array` fields may
//! carry nested `properties`, which makes the definition a tree:
//!
//! ```json
//! {
//!   "outputType": "object",
//!   "properties": [
//!     { "name": "title", "type": "string" },
//!     { "name": "author", "type": "object", "properties": [
//!       { "name": "name", "type": "string" }
//!     ] }
//!   ]
//! }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Shape of the top-level generated value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
  #[default]
  Object,
  Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
  String,
  Number,
  Boolean,
  Array,
  Object,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDefinition {
  #[serde(default)]
  pub output_type: OutputType,
  #[serde(default)]
  pub properties: Vec<SchemaProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaProperty {
  pub name: String,
  #[serde(rename = "type")]
  pub property_type: PropertyType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  /// Nested fields of an `object` property, or of the items of an `array`.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub properties: Vec<SchemaProperty>,
}

impl SchemaProperty {
  pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
    Self {
      name: name.into(),
      property_type,
      description: None,
      properties: Vec::new(),
    }
  }
}

impl SchemaDefinition {
  /// Number of top-level fields.
  pub fn field_count(&self) -> usize {
    self.properties.len()
  }

  /// Require at least one field, and non-blank, unique names at every level.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.properties.is_empty() {
      return Err(ConfigError::InvalidSchema {
        path: "$".to_string(),
        message: "schema has no fields".to_string(),
      });
    }
    validate_properties("$", &self.properties)
  }
}

fn validate_properties(path: &str, properties: &[SchemaProperty]) -> Result<(), ConfigError> {
  let mut seen = HashSet::new();

  for property in properties {
    if property.name.trim().is_empty() {
      return Err(ConfigError::InvalidSchema {
        path: path.to_string(),
        message: "field name is blank".to_string(),
      });
    }

    if !seen.insert(property.name.as_str()) {
      return Err(ConfigError::InvalidSchema {
        path: path.to_string(),
        message: format!("duplicate field '{}'", property.name),
      });
    }

    if !property.properties.is_empty() {
      let child_path = format!("{}.{}", path, property.name);
      validate_properties(&child_path, &property.properties)?;
    }
  }

  Ok(())
}
