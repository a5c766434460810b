use blockflow_config::{GenerateSettings, GenerateType, SchemaDefinition};
use serde::{Deserialize, Serialize};

/// Body of a generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
  /// Prompt after template resolution.
  pub prompt: String,
  pub generate_type: GenerateType,
  pub temperature: f64,
  pub max_tokens: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub schema_definition: Option<SchemaDefinition>,
}

impl GenerationRequest {
  /// Build a request from a block's settings and its resolved prompt.
  ///
  /// The schema is only attached for `object` generation.
  pub fn for_settings(prompt: impl Into<String>, settings: &GenerateSettings) -> Self {
    Self {
      prompt: prompt.into(),
      generate_type: settings.generate_type,
      temperature: settings.temperature,
      max_tokens: settings.max_tokens,
      schema_definition: settings.request_schema().cloned(),
    }
  }
}

/// Payload extracted from a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
  /// Raw body of a `text` generation.
  Text(String),
  /// The `result` field of an `object` generation.
  Object(serde_json::Value),
}

impl GenerationResult {
  /// Convert into the value stored as a block's result.
  pub fn into_value(self) -> serde_json::Value {
    match self {
      GenerationResult::Text(text) => serde_json::Value::String(text),
      GenerationResult::Object(value) => value,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use blockflow_config::{PropertyType, SchemaProperty};
  use serde_json::json;

  #[test]
  fn test_text_request_omits_schema() {
    let settings = GenerateSettings {
      // schema present but ignored for text
      schema_definition: Some(SchemaDefinition::default()),
      ..Default::default()
    };
    let request = GenerationRequest::for_settings("hello", &settings);

    let body = serde_json::to_value(&request).unwrap();
    assert_eq!(
      body,
      json!({
        "prompt": "hello",
        "generateType": "text",
        "temperature": 0.7,
        "maxTokens": 1000
      })
    );
  }

  #[test]
  fn test_object_request_includes_schema() {
    let settings = GenerateSettings {
      generate_type: GenerateType::Object,
      temperature: 0.1,
      max_tokens: 50,
      schema_definition: Some(SchemaDefinition {
        properties: vec![SchemaProperty::new("tags", PropertyType::Array)],
        ..Default::default()
      }),
      ..Default::default()
    };
    let request = GenerationRequest::for_settings("list tags", &settings);

    let body = serde_json::to_value(&request).unwrap();
    assert_eq!(body["generateType"], "object");
    assert_eq!(body["maxTokens"], 50);
    assert_eq!(body["schemaDefinition"]["outputType"], "object");
    assert_eq!(body["schemaDefinition"]["properties"][0]["name"], "tags");
    assert_eq!(body["schemaDefinition"]["properties"][0]["type"], "array");
  }

  #[test]
  fn test_into_value() {
    assert_eq!(
      GenerationResult::Text("hi".to_string()).into_value(),
      json!("hi")
    );
    assert_eq!(
      GenerationResult::Object(json!({ "a": 1 })).into_value(),
      json!({ "a": 1 })
    );
  }
}
