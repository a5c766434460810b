use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockKind};
use crate::error::ConfigError;

/// A pipeline file: an ordered list of blocks.
///
/// Order is execution order. A Generate block may only reference the block
/// directly before it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineDef {
  #[serde(default)]
  pub name: String,
  pub blocks: Vec<Block>,
}

impl PipelineDef {
  /// Parse and validate a pipeline from JSON text.
  pub fn from_json(content: &str) -> Result<Self, ConfigError> {
    let pipeline: PipelineDef = serde_json::from_str(content)?;
    pipeline.validate()?;
    Ok(pipeline)
  }

  /// Check block ids are unique and every Generate block has usable settings.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let mut ids = HashSet::new();

    for block in &self.blocks {
      if !ids.insert(block.id.as_str()) {
        return Err(ConfigError::DuplicateBlockId(block.id.clone()));
      }

      if let BlockKind::Generate { settings } = &block.kind {
        settings
          .validate()
          .map_err(|e| ConfigError::InvalidBlock {
            block_id: block.id.clone(),
            source: Box::new(e),
          })?;
      }
    }

    Ok(())
  }

  /// Find a block's position by id.
  pub fn position(&self, block_id: &str) -> Option<usize> {
    self.blocks.iter().position(|b| b.id == block_id)
  }
}
