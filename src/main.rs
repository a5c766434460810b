use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use blockflow_config::{Block, EngineSettings, PipelineDef};
use blockflow_generate::HttpGenerationService;
use blockflow_runtime::{
  BlockStore, ChannelNotifier, ExecutionEvent, FlowStatus, Runtime, RuntimeConfig, StepOutcome,
  references, resolve_prompt,
};
use blockflow_shortcuts::{KeyCombo, KeyEvent, Keymap};

/// Blockflow - run pipelines of prompt blocks against a generation service
#[derive(Parser)]
#[command(name = "blockflow")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.blockflow)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Path to the engine settings file (default: <data-dir>/config.json)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Generation endpoint, overriding the settings file
  #[arg(long, global = true, env = "BLOCKFLOW_ENDPOINT")]
  endpoint: Option<String>,

  /// Pause after each successful Generate step of a flow, in milliseconds
  #[arg(long, global = true)]
  step_delay_ms: Option<u64>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run every block of a pipeline in order
  Run {
    /// Path to the pipeline file (JSON)
    pipeline_file: PathBuf,
  },

  /// Run a single block of a pipeline
  Block {
    /// Path to the pipeline file (JSON)
    pipeline_file: PathBuf,

    /// Position of the block to run
    #[arg(long, conflicts_with = "id", required_unless_present = "id")]
    index: Option<usize>,

    /// Id of the block to run
    #[arg(long)]
    id: Option<String>,
  },

  /// Print the prompt a Generate block would send
  Resolve {
    /// Path to the pipeline file (JSON)
    pipeline_file: PathBuf,

    /// Position of the Generate block
    #[arg(long)]
    index: usize,
  },

  /// List keyboard shortcuts
  Shortcuts {
    /// Show the action bound to a combination, e.g. "Cmd+Shift+Enter"
    #[arg(long)]
    press: Option<String>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blockflow=warn")),
    )
    .with_writer(std::io::stderr)
    .init();

  let data_dir = match cli.data_dir.clone() {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".blockflow"),
  };

  match cli.command {
    Some(Commands::Run { ref pipeline_file }) => {
      let settings = load_settings(&cli, &data_dir)?;
      block_on(run_flow(pipeline_file, settings))?;
    }
    Some(Commands::Block {
      ref pipeline_file,
      index,
      ref id,
    }) => {
      let settings = load_settings(&cli, &data_dir)?;
      block_on(run_block(pipeline_file, index, id.as_deref(), settings))?;
    }
    Some(Commands::Resolve {
      ref pipeline_file,
      index,
    }) => {
      resolve(pipeline_file, index)?;
    }
    Some(Commands::Shortcuts { ref press }) => {
      shortcuts(press.as_deref())?;
    }
    None => {
      println!("blockflow - use --help to see available commands");
    }
  }

  Ok(())
}

fn block_on<F: Future<Output = Result<()>>>(future: F) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(future)
}

/// Settings file, then CLI and environment overrides.
fn load_settings(cli: &Cli, data_dir: &Path) -> Result<EngineSettings> {
  let path = cli
    .config
    .clone()
    .unwrap_or_else(|| data_dir.join("config.json"));

  let mut settings = EngineSettings::load(&path)
    .with_context(|| format!("failed to load settings: {}", path.display()))?;

  if let Some(endpoint) = &cli.endpoint {
    settings.endpoint = endpoint.clone();
  }
  if let Some(step_delay_ms) = cli.step_delay_ms {
    settings.step_delay_ms = step_delay_ms;
  }

  Ok(settings)
}

fn load_pipeline(pipeline_file: &Path) -> Result<PipelineDef> {
  let content = std::fs::read_to_string(pipeline_file)
    .with_context(|| format!("failed to read pipeline file: {}", pipeline_file.display()))?;

  PipelineDef::from_json(&content)
    .with_context(|| format!("failed to parse pipeline file: {}", pipeline_file.display()))
}

fn build_service(settings: &EngineSettings) -> Result<Arc<HttpGenerationService>> {
  let endpoint = settings.endpoint_url().context("invalid generation endpoint")?;
  let service = HttpGenerationService::with_timeout(endpoint, settings.request_timeout())
    .context("failed to create generation client")?;
  Ok(Arc::new(service))
}

async fn run_flow(pipeline_file: &Path, settings: EngineSettings) -> Result<()> {
  let pipeline = load_pipeline(pipeline_file)?;
  eprintln!(
    "Loaded pipeline: {} ({} blocks)",
    pipeline.name,
    pipeline.blocks.len()
  );

  let service = build_service(&settings)?;
  eprintln!("Endpoint: {}", service.endpoint());

  let (tx, rx) = mpsc::unbounded_channel();
  let progress = tokio::spawn(print_progress(rx));

  let runtime = Runtime::with_notifier(
    BlockStore::new(pipeline.blocks),
    service,
    RuntimeConfig::from(&settings),
    ChannelNotifier::new(tx),
  );

  let result = runtime.execute_flow().await.context("flow execution failed");
  drop(runtime);
  let _ = progress.await;
  let outcome = result?;

  eprintln!("Execution completed: {}", outcome.execution_id);
  eprintln!("Blocks executed: {}", outcome.executed);

  println!("{}", serde_json::to_string_pretty(&flow_results(&outcome.blocks))?);

  if let FlowStatus::Aborted {
    block_id, error, ..
  } = &outcome.status
  {
    bail!("flow aborted at block '{}': {}", block_id, error);
  }

  Ok(())
}

/// `[{id, name, result}]` for every block that has a result, in block order.
/// Names need not be unique, so entries are not keyed by them.
fn flow_results(blocks: &[Block]) -> Vec<serde_json::Value> {
  blocks
    .iter()
    .filter_map(|b| {
      b.result.as_ref().map(|result| {
        json!({
          "id": b.id,
          "name": b.name,
          "result": result,
        })
      })
    })
    .collect()
}

async fn print_progress(mut rx: mpsc::UnboundedReceiver<ExecutionEvent>) {
  while let Some(event) = rx.recv().await {
    match event {
      ExecutionEvent::BlockStarted {
        block_id, index, ..
      } => eprintln!("[{}] {} started", index, block_id),
      ExecutionEvent::BlockCompleted {
        block_id, index, ..
      } => eprintln!("[{}] {} completed", index, block_id),
      ExecutionEvent::BlockFailed {
        block_id,
        index,
        error,
        ..
      } => eprintln!("[{}] {} failed: {}", index, block_id, error),
      _ => {}
    }
  }
}

async fn run_block(
  pipeline_file: &Path,
  index: Option<usize>,
  id: Option<&str>,
  settings: EngineSettings,
) -> Result<()> {
  let pipeline = load_pipeline(pipeline_file)?;

  let index = match (index, id) {
    (Some(index), _) => index,
    (None, Some(id)) => pipeline
      .position(id)
      .with_context(|| format!("block '{}' not found in pipeline", id))?,
    (None, None) => bail!("either --index or --id is required"),
  };

  let block = pipeline
    .blocks
    .get(index)
    .with_context(|| format!("no block at index {}", index))?;
  eprintln!("Running block: {} ({}, index {})", block.name, block.block_type(), index);
  if let Some(generate) = block.generate_settings() {
    eprintln!("Settings: {}", generate);
  }

  let service = build_service(&settings)?;
  let runtime = Runtime::new(
    BlockStore::new(pipeline.blocks),
    service,
    RuntimeConfig::from(&settings),
  );

  let outcome = runtime
    .execute_block(index)
    .await
    .context("block execution failed")?;

  match outcome {
    StepOutcome::Completed { result } => {
      eprintln!("Block execution completed");
      println!("{}", serde_json::to_string_pretty(&result)?);
      Ok(())
    }
    StepOutcome::Failed { error } => bail!("block execution failed: {}", error),
  }
}

fn resolve(pipeline_file: &Path, index: usize) -> Result<()> {
  let pipeline = load_pipeline(pipeline_file)?;

  let block = pipeline
    .blocks
    .get(index)
    .with_context(|| format!("no block at index {}", index))?;
  let settings = block
    .generate_settings()
    .with_context(|| format!("block '{}' is not a Generate block", block.id))?;

  let predecessor = index
    .checked_sub(1)
    .and_then(|i| pipeline.blocks.get(i));
  for reference in references(&settings.prompt) {
    match predecessor {
      Some(previous) if previous.name == reference.display_name => {}
      Some(previous) => eprintln!(
        "warning: @[{}] does not name the preceding block '{}', it resolves to nothing",
        reference.display_name, previous.name
      ),
      None => eprintln!(
        "warning: @[{}] is in the first block, it resolves to nothing",
        reference.display_name
      ),
    }
  }

  println!("{}", resolve_prompt(&settings.prompt, &pipeline.blocks, index));
  Ok(())
}

fn shortcuts(press: Option<&str>) -> Result<()> {
  let keymap = Keymap::default();

  if let Some(press) = press {
    let combo: KeyCombo = press
      .parse()
      .with_context(|| format!("invalid key combination: {}", press))?;
    match keymap.resolve(&KeyEvent::from(&combo)) {
      Some(action) => println!("{}: {}", combo, action),
      None => println!("{}: no shortcut bound", combo),
    }
    return Ok(());
  }

  for shortcut in keymap.shortcuts() {
    println!("{:<22} {}", shortcut.combo.to_string(), shortcut.action);
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use blockflow_config::BlockType;

  fn named(name: &str, id: &str, result: Option<serde_json::Value>) -> Block {
    let mut block = Block::new(BlockType::Generate);
    block.id = id.to_string();
    block.name = name.to_string();
    block.result = result;
    block
  }

  #[test]
  fn test_flow_results_keep_blocks_with_shared_names() {
    let blocks = vec![
      named("Generate", "g1", Some(json!("first"))),
      named("Generate", "g2", Some(json!({ "k": 1 }))),
      named("Generate", "g3", None),
    ];

    assert_eq!(
      flow_results(&blocks),
      vec![
        json!({ "id": "g1", "name": "Generate", "result": "first" }),
        json!({ "id": "g2", "name": "Generate", "result": { "k": 1 } }),
      ]
    );
  }
}
