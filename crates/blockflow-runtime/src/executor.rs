//! Single block execution.

use std::sync::Arc;

use blockflow_config::{Block, BlockKind};
use blockflow_generate::{GenerationRequest, GenerationService};
use tracing::{debug, error, info, instrument};

use crate::error::RuntimeError;
use crate::result::StepOutcome;
use crate::template::resolve_prompt;

/// Runs one block against a working copy of the block list.
///
/// The same step serves standalone execution and every iteration of a flow.
/// Callers decide which snapshot the step reads and how each intermediate
/// state is published.
#[derive(Clone)]
pub struct BlockExecutor {
  service: Arc<dyn GenerationService>,
}

impl BlockExecutor {
  pub fn new(service: Arc<dyn GenerationService>) -> Self {
    Self { service }
  }

  /// Execute the block at `index` in `working`.
  ///
  /// Input blocks copy their text into `result` and publish once. Generate
  /// blocks publish twice: once with `is_executing` set before the request,
  /// once with the result (or [`ERROR_RESULT`](crate::ERROR_RESULT)) and the
  /// flag cleared. The prompt is resolved against `working` after the first
  /// publish.
  ///
  /// Generation failures are reported as [`StepOutcome::Failed`]; the only
  /// error is an out-of-range index, raised before anything changes.
  #[instrument(
    name = "block_step",
    skip(self, working, publish),
    fields(block_id = tracing::field::Empty)
  )]
  pub async fn step<P>(
    &self,
    working: &mut [Block],
    index: usize,
    publish: P,
  ) -> Result<StepOutcome, RuntimeError>
  where
    P: Fn(&[Block], usize),
  {
    let block = working
      .get(index)
      .ok_or(RuntimeError::BlockNotFound { index })?;
    let block_id = block.id.clone();
    let kind = block.kind.clone();
    tracing::Span::current().record("block_id", block_id.as_str());

    let outcome = match kind {
      BlockKind::Input { settings } => {
        let value = serde_json::Value::String(settings.input);
        working[index].result = Some(value.clone());
        publish(working, index);
        debug!(block_id = %block_id, "input_block_completed");
        StepOutcome::Completed { result: value }
      }
      BlockKind::Generate { settings } => {
        working[index].is_executing = true;
        publish(working, index);

        let prompt = resolve_prompt(&settings.prompt, working, index);
        info!(
          block_id = %block_id,
          generate_type = ?settings.generate_type,
          prompt_len = prompt.len(),
          "generate_request_started"
        );

        let request = GenerationRequest::for_settings(prompt, &settings);
        let outcome = match self.service.generate(request).await {
          Ok(generated) => StepOutcome::Completed {
            result: generated.into_value(),
          },
          Err(e) => {
            error!(block_id = %block_id, error = %e, "generate_request_failed");
            StepOutcome::Failed {
              error: e.to_string(),
            }
          }
        };

        let target = &mut working[index];
        target.result = Some(outcome.block_result());
        target.is_executing = false;
        publish(working, index);
        outcome
      }
    };

    Ok(outcome)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Mutex;

  use async_trait::async_trait;
  use blockflow_config::{BlockType, GenerateSettings, GenerateType, InputSettings};
  use blockflow_generate::{GenerationError, GenerationResult};
  use serde_json::json;

  /// Records each request and answers with a fixed response.
  struct FixedService {
    response: Result<GenerationResult, String>,
    requests: Mutex<Vec<GenerationRequest>>,
  }

  impl FixedService {
    fn new(response: Result<GenerationResult, String>) -> Arc<Self> {
      Arc::new(Self {
        response,
        requests: Mutex::new(Vec::new()),
      })
    }
  }

  #[async_trait]
  impl GenerationService for FixedService {
    async fn generate(
      &self,
      request: GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
      self.requests.lock().unwrap().push(request);
      self
        .response
        .clone()
        .map_err(GenerationError::service)
    }
  }

  fn input(name: &str, text: &str) -> Block {
    let mut block = Block::new(BlockType::Input);
    block.name = name.to_string();
    block.kind = BlockKind::Input {
      settings: InputSettings {
        input: text.to_string(),
      },
    };
    block
  }

  fn generate(name: &str, prompt: &str) -> Block {
    let mut block = Block::new(BlockType::Generate);
    block.name = name.to_string();
    block.kind = BlockKind::Generate {
      settings: GenerateSettings {
        prompt: prompt.to_string(),
        ..Default::default()
      },
    };
    block
  }

  #[tokio::test]
  async fn test_input_block_copies_text() {
    let service = FixedService::new(Ok(GenerationResult::Text("unused".into())));
    let executor = BlockExecutor::new(service.clone());
    let mut working = vec![input("Topic", "rivers")];
    let published = Mutex::new(Vec::new());

    let outcome = executor
      .step(&mut working, 0, |blocks, i| {
        published.lock().unwrap().push(blocks[i].clone())
      })
      .await
      .unwrap();

    assert_eq!(outcome, StepOutcome::Completed { result: json!("rivers") });
    assert_eq!(working[0].result, Some(json!("rivers")));
    assert_eq!(published.lock().unwrap().len(), 1);
    assert!(service.requests.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_generate_block_publishes_busy_then_result() {
    let service = FixedService::new(Ok(GenerationResult::Text("a poem".into())));
    let executor = BlockExecutor::new(service.clone());
    let mut working = vec![input("Topic", "rivers"), generate("Poem", "About @[Topic](t)")];
    let published = Mutex::new(Vec::new());

    let outcome = executor
      .step(&mut working, 1, |blocks, i| {
        published.lock().unwrap().push(blocks[i].clone())
      })
      .await
      .unwrap();

    assert_eq!(outcome, StepOutcome::Completed { result: json!("a poem") });

    let published = published.into_inner().unwrap();
    assert_eq!(published.len(), 2);
    assert!(published[0].is_executing);
    assert!(!published[1].is_executing);
    assert_eq!(published[1].result, Some(json!("a poem")));

    let requests = service.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].prompt, "About rivers");
    assert_eq!(requests[0].generate_type, GenerateType::Text);
  }

  #[tokio::test]
  async fn test_generate_failure_stores_error_text() {
    let service = FixedService::new(Err("model unavailable".to_string()));
    let executor = BlockExecutor::new(service);
    let mut working = vec![generate("Poem", "anything")];

    let outcome = executor.step(&mut working, 0, |_, _| {}).await.unwrap();

    match outcome {
      StepOutcome::Failed { error } => assert!(error.contains("model unavailable")),
      other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(working[0].result, Some(json!("Error executing block")));
    assert!(!working[0].is_executing);
  }

  #[tokio::test]
  async fn test_out_of_range_index_changes_nothing() {
    let service = FixedService::new(Ok(GenerationResult::Text("x".into())));
    let executor = BlockExecutor::new(service);
    let mut working = vec![generate("Poem", "p")];
    let before = working.clone();

    let err = executor.step(&mut working, 4, |_, _| {}).await.unwrap_err();

    assert!(matches!(err, RuntimeError::BlockNotFound { index: 4 }));
    assert_eq!(working, before);
  }
}
