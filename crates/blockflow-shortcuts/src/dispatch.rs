//! Shortcut dispatch into the runtime.

use blockflow_config::BlockType;
use blockflow_runtime::{
  ExecutionNotifier, FlowOutcome, Runtime, RuntimeError, StepOutcome,
};
use tracing::{debug, instrument};

use crate::keymap::ShortcutAction;

/// What a dispatched shortcut did.
#[derive(Debug)]
pub enum DispatchOutcome {
  BlockExecuted {
    block_id: String,
    outcome: StepOutcome,
  },
  FlowExecuted(FlowOutcome),
  BlockRemoved {
    block_id: String,
  },
  /// The host should show the settings of this block.
  SettingsRequested {
    block_id: String,
  },
  ExpandedChanged {
    block_id: String,
    expanded: bool,
  },
  BlockAdded {
    block_id: String,
  },
  /// Nothing to do: no focused block, wrong block type, state already as
  /// requested, or a flow already running.
  Ignored,
}

/// Perform `action` against the runtime's blocks.
///
/// `focused_block_id` is the block that currently has focus, if any. A focus
/// id that no longer exists is treated as no focus.
#[instrument(name = "shortcut_dispatch", skip(runtime))]
pub async fn dispatch<N: ExecutionNotifier>(
  runtime: &Runtime<N>,
  focused_block_id: Option<&str>,
  action: ShortcutAction,
) -> Result<DispatchOutcome, RuntimeError> {
  let store = runtime.store();
  let focused = focused_block_id
    .and_then(|id| store.index_of(id).map(|index| (id, index)));

  if action.needs_focus() && focused.is_none() {
    debug!("no focused block");
    return Ok(DispatchOutcome::Ignored);
  }

  let outcome = match (action, focused) {
    (ShortcutAction::ExecuteBlock, Some((block_id, index))) => {
      let is_generate = store.get(index).is_some_and(|b| b.is_generate());
      if !is_generate {
        DispatchOutcome::Ignored
      } else {
        let outcome = runtime.execute_block(index).await?;
        DispatchOutcome::BlockExecuted {
          block_id: block_id.to_string(),
          outcome,
        }
      }
    }
    (ShortcutAction::ExecuteFlow, _) => {
      if runtime.is_flow_executing() {
        DispatchOutcome::Ignored
      } else {
        match runtime.execute_flow().await {
          Ok(outcome) => DispatchOutcome::FlowExecuted(outcome),
          Err(RuntimeError::FlowInProgress) => DispatchOutcome::Ignored,
          Err(e) => return Err(e),
        }
      }
    }
    (ShortcutAction::DeleteBlock, Some((block_id, _))) => {
      store.remove_block(block_id)?;
      DispatchOutcome::BlockRemoved {
        block_id: block_id.to_string(),
      }
    }
    (ShortcutAction::OpenSettings, Some((block_id, _))) => DispatchOutcome::SettingsRequested {
      block_id: block_id.to_string(),
    },
    (ShortcutAction::CollapseBlock, Some((block_id, index))) => {
      set_expanded(runtime, block_id, index, false)?
    }
    (ShortcutAction::ExpandBlock, Some((block_id, index))) => {
      set_expanded(runtime, block_id, index, true)?
    }
    (ShortcutAction::AddGenerateBlock, _) => DispatchOutcome::BlockAdded {
      block_id: store.add_block(BlockType::Generate),
    },
    (ShortcutAction::AddInputBlock, _) => DispatchOutcome::BlockAdded {
      block_id: store.add_block(BlockType::Input),
    },
    (_, None) => DispatchOutcome::Ignored,
  };

  debug!(outcome = outcome_kind(&outcome), "shortcut_dispatched");
  Ok(outcome)
}

/// Change the expanded state only when it differs from `expanded`.
fn set_expanded<N: ExecutionNotifier>(
  runtime: &Runtime<N>,
  block_id: &str,
  index: usize,
  expanded: bool,
) -> Result<DispatchOutcome, RuntimeError> {
  let store = runtime.store();
  let current = store.get(index).map(|b| b.expanded);
  if current == Some(expanded) {
    return Ok(DispatchOutcome::Ignored);
  }

  store.set_expanded(block_id, expanded)?;
  Ok(DispatchOutcome::ExpandedChanged {
    block_id: block_id.to_string(),
    expanded,
  })
}

fn outcome_kind(outcome: &DispatchOutcome) -> &'static str {
  match outcome {
    DispatchOutcome::BlockExecuted { .. } => "block_executed",
    DispatchOutcome::FlowExecuted(_) => "flow_executed",
    DispatchOutcome::BlockRemoved { .. } => "block_removed",
    DispatchOutcome::SettingsRequested { .. } => "settings_requested",
    DispatchOutcome::ExpandedChanged { .. } => "expanded_changed",
    DispatchOutcome::BlockAdded { .. } => "block_added",
    DispatchOutcome::Ignored => "ignored",
  }
}
