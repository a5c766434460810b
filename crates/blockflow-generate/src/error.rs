use thiserror::Error;

/// Errors returned by a generation service.
///
/// The block executor turns every variant into the same user-visible error
/// result; the variants exist for logs and programmatic inspection.
#[derive(Debug, Error)]
pub enum GenerationError {
  /// Connection, DNS, TLS or timeout failure.
  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),

  /// The service answered with a non-success status.
  #[error("service returned status {status}: {body}")]
  Status { status: u16, body: String },

  /// The body could not be interpreted as a generation result.
  #[error("malformed response: {message}")]
  MalformedResponse { message: String },

  /// Any other backend failure.
  #[error("generation failed: {message}")]
  Service { message: String },
}

impl GenerationError {
  pub fn malformed(message: impl Into<String>) -> Self {
    Self::MalformedResponse {
      message: message.into(),
    }
  }

  pub fn service(message: impl Into<String>) -> Self {
    Self::Service {
      message: message.into(),
    }
  }
}
