//! Shared block state.
//!
//! [`BlockStore`] owns the ordered block list and the flow-executing flag.
//! Both live in `tokio::sync::watch` channels: observers subscribe and see
//! every published state, the runtime publishes step by step, and editing
//! operations modify the list in place.
//!
//! Editing operations never touch `result` or `is_executing`; those belong
//! to the runtime.

use std::sync::Arc;

use blockflow_config::{Block, BlockKind, BlockType, GenerateSettings};
use tokio::sync::watch;
use tracing::debug;

use crate::error::RuntimeError;

/// Cloneable handle to the block list and flow flag.
#[derive(Debug, Clone)]
pub struct BlockStore {
  blocks: Arc<watch::Sender<Vec<Block>>>,
  flow_executing: Arc<watch::Sender<bool>>,
}

impl Default for BlockStore {
  fn default() -> Self {
    Self::new(Vec::new())
  }
}

impl BlockStore {
  pub fn new(blocks: Vec<Block>) -> Self {
    Self {
      blocks: Arc::new(watch::Sender::new(blocks)),
      flow_executing: Arc::new(watch::Sender::new(false)),
    }
  }

  /// A copy of the current block list.
  pub fn snapshot(&self) -> Vec<Block> {
    self.blocks.borrow().clone()
  }

  pub fn len(&self) -> usize {
    self.blocks.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.blocks.borrow().is_empty()
  }

  /// A copy of the block at `index`.
  pub fn get(&self, index: usize) -> Option<Block> {
    self.blocks.borrow().get(index).cloned()
  }

  /// Position of the block with the given id.
  pub fn index_of(&self, block_id: &str) -> Option<usize> {
    self.blocks.borrow().iter().position(|b| b.id == block_id)
  }

  /// Observe every published block list.
  pub fn subscribe(&self) -> watch::Receiver<Vec<Block>> {
    self.blocks.subscribe()
  }

  /// Observe the flow-executing flag.
  pub fn subscribe_flow(&self) -> watch::Receiver<bool> {
    self.flow_executing.subscribe()
  }

  pub fn is_flow_executing(&self) -> bool {
    *self.flow_executing.borrow()
  }

  /// Append a block of the given type with default settings. Returns its id.
  pub fn add_block(&self, block_type: BlockType) -> String {
    let block = Block::new(block_type);
    let block_id = block.id.clone();
    debug!(block_id = %block_id, block_type = %block_type, "block_added");
    self.blocks.send_modify(|blocks| blocks.push(block));
    block_id
  }

  /// Remove a block, returning it.
  pub fn remove_block(&self, block_id: &str) -> Result<Block, RuntimeError> {
    let mut removed = None;
    self.blocks.send_if_modified(|blocks| {
      match blocks.iter().position(|b| b.id == block_id) {
        Some(index) => {
          removed = Some(blocks.remove(index));
          true
        }
        None => false,
      }
    });
    debug!(block_id = %block_id, removed = removed.is_some(), "block_removed");
    removed.ok_or_else(|| unknown(block_id))
  }

  /// Flip the expanded state. Returns the new state.
  pub fn toggle_expanded(&self, block_id: &str) -> Result<bool, RuntimeError> {
    self.edit(block_id, |block| {
      block.expanded = !block.expanded;
      Ok(block.expanded)
    })
  }

  pub fn set_expanded(&self, block_id: &str, expanded: bool) -> Result<(), RuntimeError> {
    self.edit(block_id, |block| {
      block.expanded = expanded;
      Ok(())
    })
  }

  pub fn rename_block(&self, block_id: &str, name: impl Into<String>) -> Result<(), RuntimeError> {
    let name = name.into();
    self.edit(block_id, |block| {
      block.name = name;
      Ok(())
    })
  }

  /// Replace an Input block's text.
  pub fn set_input(&self, block_id: &str, input: impl Into<String>) -> Result<(), RuntimeError> {
    let input = input.into();
    self.edit(block_id, |block| match &mut block.kind {
      BlockKind::Input { settings } => {
        settings.input = input;
        Ok(())
      }
      BlockKind::Generate { .. } => Err(RuntimeError::WrongBlockType {
        block_id: block.id.clone(),
        expected: BlockType::Input,
      }),
    })
  }

  /// Edit a Generate block's settings in place.
  pub fn update_generate_settings<F>(&self, block_id: &str, update: F) -> Result<(), RuntimeError>
  where
    F: FnOnce(&mut GenerateSettings),
  {
    self.edit(block_id, |block| match &mut block.kind {
      BlockKind::Generate { settings } => {
        update(settings);
        Ok(())
      }
      BlockKind::Input { .. } => Err(RuntimeError::WrongBlockType {
        block_id: block.id.clone(),
        expected: BlockType::Generate,
      }),
    })
  }

  /// Apply `f` to one block, notifying observers only if it succeeds.
  fn edit<T, F>(&self, block_id: &str, f: F) -> Result<T, RuntimeError>
  where
    F: FnOnce(&mut Block) -> Result<T, RuntimeError>,
  {
    let mut outcome = Err(unknown(block_id));
    self.blocks.send_if_modified(|blocks| {
      match blocks.iter_mut().find(|b| b.id == block_id) {
        Some(block) => {
          outcome = f(block);
          outcome.is_ok()
        }
        None => false,
      }
    });
    outcome
  }

  /// Check preconditions for a single-block run and mark the block busy.
  ///
  /// Returns the snapshot the run reads from. The flow flag is read while
  /// the block list is locked, so a claim and [`begin_flow`](Self::begin_flow)
  /// never both succeed.
  pub(crate) fn claim(&self, index: usize) -> Result<Vec<Block>, RuntimeError> {
    let mut outcome = Err(RuntimeError::BlockNotFound { index });
    self.blocks.send_if_modified(|blocks| {
      if *self.flow_executing.borrow() {
        outcome = Err(RuntimeError::FlowInProgress);
        return false;
      }

      let marked = match blocks.get_mut(index) {
        None => return false,
        Some(block) if block.is_executing => {
          outcome = Err(RuntimeError::BlockBusy {
            block_id: block.id.clone(),
          });
          return false;
        }
        Some(block) if block.is_generate() => {
          block.is_executing = true;
          true
        }
        Some(_) => false,
      };
      outcome = Ok(blocks.clone());
      marked
    });
    outcome
  }

  /// Clear a block's executing flag, located by id. Returns true if the
  /// flag was set.
  pub(crate) fn release_block(&self, block_id: &str) -> bool {
    self.blocks.send_if_modified(|blocks| {
      match blocks.iter_mut().find(|b| b.id == block_id) {
        Some(block) if block.is_executing => {
          block.is_executing = false;
          true
        }
        _ => false,
      }
    })
  }

  /// Write one block back, located by id. A block removed in the meantime
  /// stays removed.
  pub(crate) fn publish_block(&self, block: &Block) -> bool {
    self.blocks.send_if_modified(|blocks| {
      match blocks.iter_mut().find(|b| b.id == block.id) {
        Some(slot) => {
          *slot = block.clone();
          true
        }
        None => false,
      }
    })
  }

  /// Replace the whole list.
  pub(crate) fn publish_all(&self, blocks: &[Block]) {
    self.blocks.send_replace(blocks.to_vec());
  }

  /// Set the flow flag.
  ///
  /// Fails with `FlowInProgress` if a flow already runs, or with `BlockBusy`
  /// if a single-block run is in flight. The flag is set before the blocks
  /// are checked, so a concurrent [`claim`](Self::claim) either shows up as
  /// busy here or sees the flag and backs off.
  pub(crate) fn begin_flow(&self) -> Result<(), RuntimeError> {
    let acquired = self.flow_executing.send_if_modified(|running| {
      if *running {
        false
      } else {
        *running = true;
        true
      }
    });
    if !acquired {
      return Err(RuntimeError::FlowInProgress);
    }

    let busy = self
      .blocks
      .borrow()
      .iter()
      .find(|b| b.is_executing)
      .map(|b| b.id.clone());
    if let Some(block_id) = busy {
      self.end_flow();
      return Err(RuntimeError::BlockBusy { block_id });
    }

    Ok(())
  }

  pub(crate) fn end_flow(&self) {
    self.flow_executing.send_replace(false);
  }
}

fn unknown(block_id: &str) -> RuntimeError {
  RuntimeError::UnknownBlock {
    block_id: block_id.to_string(),
  }
}
