use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::schema::SchemaDefinition;

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const MAX_TEMPERATURE: f64 = 2.0;
pub const MAX_TOKENS_LIMIT: u32 = 4000;

/// Settings for a static Input block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSettings {
  #[serde(default)]
  pub input: String,
}

/// What the generation service should produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerateType {
  #[default]
  Text,
  Object,
}

/// Settings for an LLM-backed Generate block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSettings {
  /// Prompt template, may contain `@[name](id)` references.
  #[serde(default)]
  pub prompt: String,
  #[serde(default)]
  pub generate_type: GenerateType,
  #[serde(default = "default_temperature")]
  pub temperature: f64,
  #[serde(default = "default_max_tokens")]
  pub max_tokens: u32,
  /// Only sent to the service when `generate_type` is `Object`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub schema_definition: Option<SchemaDefinition>,
}

impl Default for GenerateSettings {
  fn default() -> Self {
    Self {
      prompt: String::new(),
      generate_type: GenerateType::Text,
      temperature: DEFAULT_TEMPERATURE,
      max_tokens: DEFAULT_MAX_TOKENS,
      schema_definition: None,
    }
  }
}

impl GenerateSettings {
  /// The schema to send with a request, if any.
  pub fn request_schema(&self) -> Option<&SchemaDefinition> {
    match self.generate_type {
      GenerateType::Object => self.schema_definition.as_ref(),
      GenerateType::Text => None,
    }
  }

  /// Check the settings against the ranges the editor allows.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if !(0.0..=MAX_TEMPERATURE).contains(&self.temperature) {
      return Err(ConfigError::InvalidSetting {
        field: "temperature".to_string(),
        message: format!(
          "must be between 0 and {}, got {}",
          MAX_TEMPERATURE, self.temperature
        ),
      });
    }

    if !(1..=MAX_TOKENS_LIMIT).contains(&self.max_tokens) {
      return Err(ConfigError::InvalidSetting {
        field: "maxTokens".to_string(),
        message: format!(
          "must be between 1 and {}, got {}",
          MAX_TOKENS_LIMIT, self.max_tokens
        ),
      });
    }

    if self.generate_type == GenerateType::Object {
      let schema = self
        .schema_definition
        .as_ref()
        .ok_or_else(|| ConfigError::InvalidSetting {
          field: "schemaDefinition".to_string(),
          message: "object generation requires a schema".to_string(),
        })?;
      schema.validate()?;
    }

    Ok(())
  }
}

/// One-line summary: `object · 0.7 · 1000 tokens · 2 fields`.
impl fmt::Display for GenerateSettings {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let kind = match self.generate_type {
      GenerateType::Text => "text",
      GenerateType::Object => "object",
    };
    write!(
      f,
      "{} · {} · {} tokens",
      kind, self.temperature, self.max_tokens
    )?;
    if let Some(schema) = self.request_schema() {
      write!(f, " · {} fields", schema.field_count())?;
    }
    Ok(())
  }
}

fn default_temperature() -> f64 {
  DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
  DEFAULT_MAX_TOKENS
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::schema::{PropertyType, SchemaProperty};

  fn object_settings() -> GenerateSettings {
    GenerateSettings {
      generate_type: GenerateType::Object,
      schema_definition: Some(SchemaDefinition {
        properties: vec![
          SchemaProperty::new("title", PropertyType::String),
          SchemaProperty::new("score", PropertyType::Number),
        ],
        ..Default::default()
      }),
      ..Default::default()
    }
  }

  #[test]
  fn test_defaults_validate() {
    assert!(GenerateSettings::default().validate().is_ok());
  }

  #[test]
  fn test_temperature_out_of_range() {
    let settings = GenerateSettings {
      temperature: 2.5,
      ..Default::default()
    };
    let err = settings.validate().unwrap_err();
    assert!(err.to_string().contains("temperature"));
  }

  #[test]
  fn test_max_tokens_out_of_range() {
    let settings = GenerateSettings {
      max_tokens: 0,
      ..Default::default()
    };
    assert!(settings.validate().is_err());

    let settings = GenerateSettings {
      max_tokens: 4001,
      ..Default::default()
    };
    assert!(settings.validate().is_err());
  }

  #[test]
  fn test_object_requires_schema() {
    let settings = GenerateSettings {
      generate_type: GenerateType::Object,
      ..Default::default()
    };
    assert!(settings.validate().is_err());
    assert!(object_settings().validate().is_ok());
  }

  #[test]
  fn test_request_schema_only_for_object() {
    let mut settings = object_settings();
    assert!(settings.request_schema().is_some());

    settings.generate_type = GenerateType::Text;
    assert!(settings.request_schema().is_none());
  }

  #[test]
  fn test_display_summary() {
    assert_eq!(
      GenerateSettings::default().to_string(),
      "text · 0.7 · 1000 tokens"
    );
    assert_eq!(
      object_settings().to_string(),
      "object · 0.7 · 1000 tokens · 2 fields"
    );
  }
}
