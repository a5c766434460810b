//! Execution events and notifiers for observability.
//!
//! Block state itself is published through the [`BlockStore`](crate::BlockStore).
//! Events carry what the store does not: execution ids, failure causes and
//! flow lifecycle.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted during block and flow execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// A flow has started.
  FlowStarted {
    execution_id: String,
    block_count: usize,
  },

  /// A block has started executing.
  BlockStarted {
    execution_id: String,
    block_id: String,
    index: usize,
  },

  /// A block has completed successfully.
  BlockCompleted {
    execution_id: String,
    block_id: String,
    index: usize,
    result: serde_json::Value,
  },

  /// A Generate block's request failed.
  BlockFailed {
    execution_id: String,
    block_id: String,
    index: usize,
    error: String,
  },

  /// Every block in the flow ran.
  FlowCompleted { execution_id: String, executed: usize },

  /// The flow stopped at a failed block.
  FlowAborted {
    execution_id: String,
    block_id: String,
    error: String,
  },
}

/// Trait for receiving execution events.
///
/// The runtime calls `notify` for each event; implementations decide what
/// to do with them.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// A notifier that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow consumer never stalls a flow. One event per block
  // boundary keeps the volume low.
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
