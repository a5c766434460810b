//! Prompt template resolution.
//!
//! A Generate block's prompt may embed references to other blocks:
//!
//! ```text
//! Summarize the following: @[Article](block-42)
//! ```
//!
//! The bracketed text is the display name of the referenced block; the
//! parenthesized text is an opaque identifier and plays no part in
//! resolution.
//!
//! # Predecessor Only
//! A reference resolves only against the block directly before the block
//! being executed (`blocks[index - 1]`), and only if that block's name equals
//! the display name exactly. Anything else resolves to the empty string.
//! Misses are silent.
//!
//! # Value Extraction
//! - Input block: its `input` text.
//! - Generate block without a result: empty string.
//! - Array result: items joined with `", "`, nested objects as compact JSON.
//! - Object result: compact JSON.
//! - Other results: plain string conversion.

use std::sync::LazyLock;

use blockflow_config::{Block, BlockKind};
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::debug;

static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"@\[([^\]]+)\]\(([^)]+)\)").expect("reference pattern is a valid regex")
});

/// A block reference found in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockReference {
  /// Text between the brackets, matched against block names.
  pub display_name: String,
  /// Text between the parentheses. Not used for resolution.
  pub target: String,
}

/// List the references in a template, in order of appearance.
pub fn references(template: &str) -> Vec<BlockReference> {
  REFERENCE_PATTERN
    .captures_iter(template)
    .map(|caps| BlockReference {
      display_name: caps[1].to_string(),
      target: caps[2].to_string(),
    })
    .collect()
}

/// Resolve every reference in `template` for the block at `current_index`.
///
/// Pure: the same template, blocks and index always give the same text.
pub fn resolve_prompt(template: &str, blocks: &[Block], current_index: usize) -> String {
  let predecessor = current_index
    .checked_sub(1)
    .and_then(|index| blocks.get(index));

  REFERENCE_PATTERN
    .replace_all(template, |caps: &Captures| {
      let display_name = &caps[1];
      match predecessor {
        Some(block) if block.name == display_name => block_value(block),
        Some(block) => {
          debug!(
            expected = %display_name,
            actual = %block.name,
            "reference does not name the preceding block"
          );
          String::new()
        }
        None => {
          debug!(expected = %display_name, "reference in first block");
          String::new()
        }
      }
    })
    .into_owned()
}

/// The text a block contributes when referenced by its successor.
pub fn block_value(block: &Block) -> String {
  match &block.kind {
    BlockKind::Input { settings } => settings.input.clone(),
    BlockKind::Generate { .. } => match &block.result {
      Some(result) if is_truthy(result) => stringify_result(result),
      _ => String::new(),
    },
  }
}

fn stringify_result(result: &Value) -> String {
  match result {
    Value::Array(items) => items
      .iter()
      .map(stringify_item)
      .collect::<Vec<_>>()
      .join(", "),
    Value::Object(_) => result.to_string(),
    other => primitive_string(other),
  }
}

/// Array items: composites (and null) as JSON, primitives as plain text.
fn stringify_item(item: &Value) -> String {
  match item {
    Value::Object(_) | Value::Array(_) | Value::Null => item.to_string(),
    other => primitive_string(other),
  }
}

fn primitive_string(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    Value::Bool(b) => b.to_string(),
    Value::Number(n) => number_string(n),
    Value::Null => "null".to_string(),
    composite => composite.to_string(),
  }
}

/// Integers print as integers, floats without a trailing `.0`.
fn number_string(n: &serde_json::Number) -> String {
  if let Some(i) = n.as_i64() {
    i.to_string()
  } else if let Some(u) = n.as_u64() {
    u.to_string()
  } else {
    n.as_f64()
      .map(|f| f.to_string())
      .unwrap_or_else(|| n.to_string())
  }
}

/// Empty strings, zero, false and null count as "no result".
fn is_truthy(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
    Value::String(s) => !s.is_empty(),
    Value::Array(_) | Value::Object(_) => true,
  }
}
