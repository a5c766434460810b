//! Block runtime.
//!
//! The [`Runtime`] is the entry point for executing blocks. It owns the
//! block executor and a handle to the shared [`BlockStore`], and provides
//! `execute_block(index)` for one block and `execute_flow()` for all blocks
//! in order.

use std::sync::Arc;
use std::time::Duration;

use blockflow_config::{Block, EngineSettings};
use blockflow_generate::GenerationService;
use tracing::{error, info, instrument, warn};

use crate::error::RuntimeError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::executor::BlockExecutor;
use crate::result::{FlowOutcome, FlowStatus, StepOutcome};
use crate::store::BlockStore;

/// Configuration for the runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
  /// Pause after each successful Generate step of a flow.
  pub step_delay: Duration,
}

impl Default for RuntimeConfig {
  fn default() -> Self {
    Self {
      step_delay: Duration::from_millis(blockflow_config::DEFAULT_STEP_DELAY_MS),
    }
  }
}

impl From<&EngineSettings> for RuntimeConfig {
  fn from(settings: &EngineSettings) -> Self {
    Self {
      step_delay: settings.step_delay(),
    }
  }
}

/// The block runtime.
pub struct Runtime<N: ExecutionNotifier = NoopNotifier> {
  store: BlockStore,
  executor: BlockExecutor,
  config: RuntimeConfig,
  notifier: N,
}

impl Runtime<NoopNotifier> {
  /// Create a runtime that emits no events.
  pub fn new(store: BlockStore, service: Arc<dyn GenerationService>, config: RuntimeConfig) -> Self {
    Self::with_notifier(store, service, config, NoopNotifier)
  }
}

impl<N: ExecutionNotifier> Runtime<N> {
  /// Create a runtime that reports events to `notifier`.
  pub fn with_notifier(
    store: BlockStore,
    service: Arc<dyn GenerationService>,
    config: RuntimeConfig,
    notifier: N,
  ) -> Self {
    Self {
      store,
      executor: BlockExecutor::new(service),
      config,
      notifier,
    }
  }

  /// The shared block state.
  pub fn store(&self) -> &BlockStore {
    &self.store
  }

  pub fn is_flow_executing(&self) -> bool {
    self.store.is_flow_executing()
  }

  /// Execute the block at `index` on its own.
  ///
  /// Reads the current block list and writes back only the target block.
  /// Rejected while a flow runs or while the block already has a request in
  /// flight. If the returned future is dropped mid-request the block's
  /// executing flag is cleared.
  #[instrument(name = "runtime_execute_block", skip(self))]
  pub async fn execute_block(&self, index: usize) -> Result<StepOutcome, RuntimeError> {
    let mut working = self.store.claim(index)?;
    let execution_id = uuid::Uuid::new_v4().to_string();
    let block_id = working[index].id.clone();
    let mut claim = BlockClaim::new(&self.store, &block_id);

    info!(
      execution_id = %execution_id,
      block_id = %block_id,
      index,
      "block_started"
    );
    self.notifier.notify(ExecutionEvent::BlockStarted {
      execution_id: execution_id.clone(),
      block_id: block_id.clone(),
      index,
    });

    let store = &self.store;
    let outcome = self
      .executor
      .step(&mut working, index, |blocks, i| {
        if !store.publish_block(&blocks[i]) {
          warn!(block_id = %blocks[i].id, "block removed during execution");
        }
      })
      .await?;
    claim.settled();

    self.report_step(&execution_id, &block_id, index, &outcome);
    Ok(outcome)
  }

  /// Execute every block in order, stopping at the first failure.
  ///
  /// Each step reads the flow's working copy, so a block sees the results
  /// its predecessors produced earlier in the same flow. Every intermediate
  /// state is published as a whole list.
  ///
  /// Rejected with `FlowInProgress` while another flow runs and with
  /// `BlockBusy` while a single-block run is in flight.
  #[instrument(name = "runtime_execute_flow", skip(self))]
  pub async fn execute_flow(&self) -> Result<FlowOutcome, RuntimeError> {
    let _guard = FlowGuard::acquire(&self.store)?;
    let execution_id = uuid::Uuid::new_v4().to_string();
    let mut working = self.store.snapshot();

    info!(
      execution_id = %execution_id,
      block_count = working.len(),
      "flow_started"
    );
    self.notifier.notify(ExecutionEvent::FlowStarted {
      execution_id: execution_id.clone(),
      block_count: working.len(),
    });

    let store = &self.store;
    let mut executed = 0;
    let mut status = FlowStatus::Completed;

    for index in 0..working.len() {
      let block_id = working[index].id.clone();
      let is_generate = working[index].is_generate();

      self.notifier.notify(ExecutionEvent::BlockStarted {
        execution_id: execution_id.clone(),
        block_id: block_id.clone(),
        index,
      });

      let outcome = self
        .executor
        .step(&mut working, index, |blocks: &[Block], _| store.publish_all(blocks))
        .await?;
      executed += 1;
      self.report_step(&execution_id, &block_id, index, &outcome);

      match outcome {
        StepOutcome::Failed { error } => {
          status = FlowStatus::Aborted {
            block_id,
            index,
            error,
          };
          break;
        }
        StepOutcome::Completed { .. } if is_generate => {
          tokio::time::sleep(self.config.step_delay).await;
        }
        StepOutcome::Completed { .. } => {}
      }
    }

    match &status {
      FlowStatus::Completed => {
        info!(execution_id = %execution_id, executed, "flow_completed");
        self.notifier.notify(ExecutionEvent::FlowCompleted {
          execution_id: execution_id.clone(),
          executed,
        });
      }
      FlowStatus::Aborted {
        block_id, error, ..
      } => {
        error!(
          execution_id = %execution_id,
          block_id = %block_id,
          error = %error,
          "flow_aborted"
        );
        self.notifier.notify(ExecutionEvent::FlowAborted {
          execution_id: execution_id.clone(),
          block_id: block_id.clone(),
          error: error.clone(),
        });
      }
    }

    Ok(FlowOutcome {
      execution_id,
      blocks: working,
      executed,
      status,
    })
  }

  fn report_step(&self, execution_id: &str, block_id: &str, index: usize, outcome: &StepOutcome) {
    let event = match outcome {
      StepOutcome::Completed { result } => {
        info!(execution_id = %execution_id, block_id = %block_id, index, "block_completed");
        ExecutionEvent::BlockCompleted {
          execution_id: execution_id.to_string(),
          block_id: block_id.to_string(),
          index,
          result: result.clone(),
        }
      }
      StepOutcome::Failed { error } => {
        error!(
          execution_id = %execution_id,
          block_id = %block_id,
          index,
          error = %error,
          "block_failed"
        );
        ExecutionEvent::BlockFailed {
          execution_id: execution_id.to_string(),
          block_id: block_id.to_string(),
          index,
          error: error.clone(),
        }
      }
    };
    self.notifier.notify(event);
  }
}

/// Clears a claimed block's executing flag unless the run settled first.
struct BlockClaim<'a> {
  store: &'a BlockStore,
  block_id: &'a str,
  settled: bool,
}

impl<'a> BlockClaim<'a> {
  fn new(store: &'a BlockStore, block_id: &'a str) -> Self {
    Self {
      store,
      block_id,
      settled: false,
    }
  }

  /// The final state has been published.
  fn settled(&mut self) {
    self.settled = true;
  }
}

impl Drop for BlockClaim<'_> {
  fn drop(&mut self) {
    if !self.settled && self.store.release_block(self.block_id) {
      warn!(block_id = %self.block_id, "block execution dropped before completion");
    }
  }
}

/// Holds the flow flag for the lifetime of a flow, including when the flow
/// future is dropped early.
struct FlowGuard<'a> {
  store: &'a BlockStore,
}

impl<'a> FlowGuard<'a> {
  fn acquire(store: &'a BlockStore) -> Result<Self, RuntimeError> {
    store.begin_flow()?;
    Ok(Self { store })
  }
}

impl Drop for FlowGuard<'_> {
  fn drop(&mut self) {
    self.store.end_flow();
  }
}
