//! Runtime error types.

use blockflow_config::BlockType;

/// Errors that can occur while executing or editing blocks.
///
/// A failed generation is not an error at this level: it is recorded on the
/// block and reported through [`StepOutcome::Failed`](crate::StepOutcome).
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
  /// No block at the requested position.
  #[error("no block at index {index}")]
  BlockNotFound { index: usize },

  /// No block with the requested id.
  #[error("block '{block_id}' not found")]
  UnknownBlock { block_id: String },

  /// The block already has a request in flight.
  #[error("block '{block_id}' is already executing")]
  BlockBusy { block_id: String },

  /// A flow is running; only one may run at a time.
  #[error("a flow is already executing")]
  FlowInProgress,

  /// The edit applies to a different kind of block.
  #[error("block '{block_id}' is not a {expected} block")]
  WrongBlockType {
    block_id: String,
    expected: BlockType,
  },
}
