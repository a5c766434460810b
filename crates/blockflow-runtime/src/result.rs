//! Execution result types.

use blockflow_config::Block;
use serde::{Deserialize, Serialize};

/// Result text stored on a Generate block when its request fails.
pub const ERROR_RESULT: &str = "Error executing block";

/// Outcome of executing one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
  /// The block produced a result.
  Completed { result: serde_json::Value },
  /// The generation request failed. `error` is the underlying cause; the
  /// block itself holds [`ERROR_RESULT`].
  Failed { error: String },
}

impl StepOutcome {
  pub fn is_failure(&self) -> bool {
    matches!(self, StepOutcome::Failed { .. })
  }

  /// The value written into the block's `result`.
  pub fn block_result(&self) -> serde_json::Value {
    match self {
      StepOutcome::Completed { result } => result.clone(),
      StepOutcome::Failed { .. } => serde_json::Value::String(ERROR_RESULT.to_string()),
    }
  }
}

/// How a flow ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FlowStatus {
  /// Every block ran.
  Completed,
  /// A Generate block failed; later blocks were not run.
  Aborted {
    block_id: String,
    index: usize,
    error: String,
  },
}

/// Result of a complete flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowOutcome {
  /// Unique execution ID.
  pub execution_id: String,
  /// The flow's working copy of the blocks as of the last step.
  pub blocks: Vec<Block>,
  /// Number of blocks that ran, including a failed one.
  pub executed: usize,
  pub status: FlowStatus,
}

impl FlowOutcome {
  pub fn is_aborted(&self) -> bool {
    matches!(self.status, FlowStatus::Aborted { .. })
  }
}
