//! Shared fixtures for runtime integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use blockflow_config::{Block, BlockKind, BlockType, GenerateSettings, InputSettings};
use blockflow_generate::{GenerationError, GenerationRequest, GenerationResult, GenerationService};
use blockflow_runtime::BlockStore;
use tokio::sync::Notify;

/// One observed generation call.
#[derive(Debug, Clone)]
pub struct Call {
  pub prompt: String,
  /// Ids of blocks flagged as executing in the store when the call arrived.
  pub executing: Vec<String>,
}

/// Answers by prompt. Unknown prompts echo back as `out:<prompt>`.
#[derive(Default)]
pub struct ScriptedService {
  responses: HashMap<String, Result<GenerationResult, String>>,
  gate: Option<Arc<Notify>>,
  store: OnceLock<BlockStore>,
  calls: Mutex<Vec<Call>>,
}

impl ScriptedService {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn respond(mut self, prompt: &str, result: GenerationResult) -> Self {
    self.responses.insert(prompt.to_string(), Ok(result));
    self
  }

  pub fn fail(mut self, prompt: &str, message: &str) -> Self {
    self
      .responses
      .insert(prompt.to_string(), Err(message.to_string()));
    self
  }

  /// Hold every call until the gate is notified.
  pub fn gated(mut self, gate: Arc<Notify>) -> Self {
    self.gate = Some(gate);
    self
  }

  /// Observe this store's executing flags on each call.
  pub fn watching(self, store: &BlockStore) -> Self {
    let _ = self.store.set(store.clone());
    self
  }

  pub fn calls(&self) -> Vec<Call> {
    self.calls.lock().unwrap().clone()
  }

  pub fn prompts(&self) -> Vec<String> {
    self.calls().into_iter().map(|c| c.prompt).collect()
  }
}

#[async_trait]
impl GenerationService for ScriptedService {
  async fn generate(
    &self,
    request: GenerationRequest,
  ) -> Result<GenerationResult, GenerationError> {
    let executing = self
      .store
      .get()
      .map(|store| {
        store
          .snapshot()
          .into_iter()
          .filter(|b| b.is_executing)
          .map(|b| b.id)
          .collect()
      })
      .unwrap_or_default();

    self.calls.lock().unwrap().push(Call {
      prompt: request.prompt.clone(),
      executing,
    });

    if let Some(gate) = &self.gate {
      gate.notified().await;
    }

    match self.responses.get(&request.prompt) {
      Some(Ok(result)) => Ok(result.clone()),
      Some(Err(message)) => Err(GenerationError::service(message.clone())),
      None => Ok(GenerationResult::Text(format!("out:{}", request.prompt))),
    }
  }
}

pub fn input(id: &str, name: &str, text: &str) -> Block {
  let mut block = Block::new(BlockType::Input);
  block.id = id.to_string();
  block.name = name.to_string();
  block.kind = BlockKind::Input {
    settings: InputSettings {
      input: text.to_string(),
    },
  };
  block
}

pub fn generate(id: &str, name: &str, prompt: &str) -> Block {
  let mut block = Block::new(BlockType::Generate);
  block.id = id.to_string();
  block.name = name.to_string();
  block.kind = BlockKind::Generate {
    settings: GenerateSettings {
      prompt: prompt.to_string(),
      ..Default::default()
    },
  };
  block
}
