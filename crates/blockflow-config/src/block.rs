use std::fmt;

use serde::{Deserialize, Serialize};

use crate::settings::{GenerateSettings, InputSettings};

/// A single unit of a pipeline.
///
/// The variant (`kind`) is fixed when the block is created. `result` and
/// `is_executing` are written by the runtime only; the mutation API in
/// `blockflow-runtime` never hands them out for editing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
  pub id: String,
  /// Display label, also the match key for `@[name](id)` references.
  pub name: String,
  #[serde(default = "default_expanded")]
  pub expanded: bool,
  #[serde(flatten)]
  pub kind: BlockKind,
  /// Last computed output. Overwritten on every execution.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub result: Option<serde_json::Value>,
  /// True only while a Generate request is in flight.
  #[serde(default)]
  pub is_executing: bool,
}

/// Variant tag plus the settings that belong to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BlockKind {
  Input {
    #[serde(default)]
    settings: InputSettings,
  },
  Generate {
    #[serde(default)]
    settings: GenerateSettings,
  },
}

/// The block variant without its settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockType {
  Input,
  Generate,
}

impl Block {
  /// Create a block of the given type with default settings.
  ///
  /// New blocks are expanded and named after their type.
  pub fn new(block_type: BlockType) -> Self {
    let kind = match block_type {
      BlockType::Input => BlockKind::Input {
        settings: InputSettings::default(),
      },
      BlockType::Generate => BlockKind::Generate {
        settings: GenerateSettings::default(),
      },
    };

    Self {
      id: format!("block-{}", uuid::Uuid::new_v4()),
      name: block_type.to_string(),
      expanded: true,
      kind,
      result: None,
      is_executing: false,
    }
  }

  pub fn block_type(&self) -> BlockType {
    match self.kind {
      BlockKind::Input { .. } => BlockType::Input,
      BlockKind::Generate { .. } => BlockType::Generate,
    }
  }

  pub fn is_generate(&self) -> bool {
    matches!(self.kind, BlockKind::Generate { .. })
  }

  /// Generate settings, if this is a Generate block.
  pub fn generate_settings(&self) -> Option<&GenerateSettings> {
    match &self.kind {
      BlockKind::Generate { settings } => Some(settings),
      BlockKind::Input { .. } => None,
    }
  }

  /// Input settings, if this is an Input block.
  pub fn input_settings(&self) -> Option<&InputSettings> {
    match &self.kind {
      BlockKind::Input { settings } => Some(settings),
      BlockKind::Generate { .. } => None,
    }
  }
}

impl fmt::Display for BlockType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BlockType::Input => f.write_str("Input"),
      BlockType::Generate => f.write_str("Generate"),
    }
  }
}

fn default_expanded() -> bool {
  true
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::settings::GenerateType;
  use serde_json::json;

  #[test]
  fn test_new_generate_block_defaults() {
    let block = Block::new(BlockType::Generate);

    assert!(block.id.starts_with("block-"));
    assert_eq!(block.name, "Generate");
    assert!(block.expanded);
    assert!(block.result.is_none());
    assert!(!block.is_executing);

    let settings = block.generate_settings().unwrap();
    assert_eq!(settings.generate_type, GenerateType::Text);
    assert_eq!(settings.temperature, 0.7);
    assert_eq!(settings.max_tokens, 1000);
  }

  #[test]
  fn test_new_blocks_get_distinct_ids() {
    let a = Block::new(BlockType::Input);
    let b = Block::new(BlockType::Input);
    assert_ne!(a.id, b.id);
  }

  #[test]
  fn test_deserialize_input_block() {
    let block: Block = serde_json::from_value(json!({
      "id": "b1",
      "name": "Topic",
      "type": "Input",
      "settings": { "input": "rust" }
    }))
    .unwrap();

    assert_eq!(block.block_type(), BlockType::Input);
    assert_eq!(block.input_settings().unwrap().input, "rust");
    assert!(block.expanded);
    assert!(!block.is_executing);
  }

  #[test]
  fn test_deserialize_generate_block_with_result() {
    let block: Block = serde_json::from_value(json!({
      "id": "b2",
      "name": "Summary",
      "type": "Generate",
      "expanded": false,
      "settings": {
        "prompt": "Summarize @[Topic](b1)",
        "generateType": "object",
        "temperature": 0.2,
        "maxTokens": 256,
        "schemaDefinition": {
          "outputType": "object",
          "properties": [{ "name": "title", "type": "string" }]
        }
      },
      "result": { "title": "Rust" }
    }))
    .unwrap();

    let settings = block.generate_settings().unwrap();
    assert_eq!(settings.generate_type, GenerateType::Object);
    assert_eq!(settings.max_tokens, 256);
    assert_eq!(settings.schema_definition.as_ref().unwrap().field_count(), 1);
    assert_eq!(block.result, Some(json!({ "title": "Rust" })));
    assert!(!block.expanded);
  }

  #[test]
  fn test_serialize_uses_wire_names() {
    let mut block = Block::new(BlockType::Generate);
    block.id = "b3".to_string();
    block.is_executing = true;

    let value = serde_json::to_value(&block).unwrap();
    assert_eq!(value["type"], "Generate");
    assert_eq!(value["isExecuting"], true);
    assert_eq!(value["settings"]["generateType"], "text");
    assert_eq!(value["settings"]["maxTokens"], 1000);
    assert!(value.get("result").is_none());
  }
}
