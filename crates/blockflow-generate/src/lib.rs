//! Blockflow Generate
//!
//! The generation service is the only external collaborator of the block
//! engine. The engine treats it as an opaque async function:
//!
//! ```text
//! generate(GenerationRequest) -> Result<GenerationResult, GenerationError>
//! ```
//!
//! [`GenerationService`] is that seam. [`HttpGenerationService`] implements it
//! against a single HTTP endpoint; tests substitute scripted fakes.

mod error;
mod http;
mod request;

pub use error::GenerationError;
pub use http::HttpGenerationService;
pub use request::{GenerationRequest, GenerationResult};

use async_trait::async_trait;

/// A text/object generation backend.
#[async_trait]
pub trait GenerationService: Send + Sync {
  /// Run one generation request to completion.
  async fn generate(&self, request: GenerationRequest)
  -> Result<GenerationResult, GenerationError>;
}
