//! Blockflow Runtime
//!
//! This crate executes pipelines of blocks. A pipeline is an ordered list of
//! Input blocks (literal text) and Generate blocks (a prompt sent to the
//! generation service). A Generate prompt may reference the block directly
//! before it with `@[name](id)`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Runtime                            │
//! │  - execute_block(index) → StepOutcome                       │
//! │  - execute_flow() → FlowOutcome                             │
//! │  - emits ExecutionEvents to an ExecutionNotifier            │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       BlockExecutor                         │
//! │  - step(working, index, publish)                            │
//! │  - prompt resolution via template::resolve_prompt           │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     GenerationService                       │
//! │  - opaque async text/object generation                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Block state is shared through a [`BlockStore`]; observers subscribe to
//! it to see every intermediate state.
//!
//! # Usage
//!
//! ```ignore
//! use blockflow_runtime::{BlockStore, Runtime, RuntimeConfig};
//!
//! let store = BlockStore::new(pipeline.blocks);
//! let runtime = Runtime::new(store, Arc::new(service), RuntimeConfig::default());
//!
//! let outcome = runtime.execute_flow().await?;
//! ```

mod error;
mod events;
mod executor;
mod result;
mod runtime;
mod store;
pub mod template;

pub use error::RuntimeError;
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use executor::BlockExecutor;
pub use result::{ERROR_RESULT, FlowOutcome, FlowStatus, StepOutcome};
pub use runtime::{Runtime, RuntimeConfig};
pub use store::BlockStore;
pub use template::{BlockReference, block_value, references, resolve_prompt};
