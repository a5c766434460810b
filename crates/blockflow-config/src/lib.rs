//! Blockflow Config
//!
//! This crate contains the serializable block and pipeline types for blockflow.
//! A pipeline is an ordered list of blocks; each block is either a static
//! `Input` block or an LLM-backed `Generate` block.
//!
//! Configuration can be loaded from:
//! - JSON pipeline files (via CLI with `blockflow run pipeline.json`)
//! - Engine settings files (`~/.blockflow/config.json`)
//!
//! The runtime takes these types, resolves prompt templates against them and
//! writes execution results back into the blocks.

mod block;
mod engine;
mod error;
mod pipeline;
mod schema;
mod settings;

pub use block::{Block, BlockKind, BlockType};
pub use engine::{DEFAULT_ENDPOINT, DEFAULT_STEP_DELAY_MS, EngineSettings};
pub use error::ConfigError;
pub use pipeline::PipelineDef;
pub use schema::{OutputType, PropertyType, SchemaDefinition, SchemaProperty};
pub use settings::{GenerateSettings, GenerateType, InputSettings};
