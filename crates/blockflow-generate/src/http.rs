use std::time::Duration;

use async_trait::async_trait;
use blockflow_config::GenerateType;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::GenerationService;
use crate::error::GenerationError;
use crate::request::{GenerationRequest, GenerationResult};

/// Generation service reached over HTTP.
///
/// Every request is a single `POST` of the JSON [`GenerationRequest`] to the
/// configured endpoint. A `text` response body is the result verbatim; an
/// `object` response body must be a JSON object with a `result` field.
#[derive(Debug, Clone)]
pub struct HttpGenerationService {
  client: Client,
  endpoint: Url,
}

impl HttpGenerationService {
  /// Create a service with a default client and no timeout.
  pub fn new(endpoint: Url) -> Self {
    Self::with_client(Client::new(), endpoint)
  }

  /// Create a service whose client gives up after `timeout`.
  pub fn with_timeout(endpoint: Url, timeout: Option<Duration>) -> Result<Self, GenerationError> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
      builder = builder.timeout(timeout);
    }
    Ok(Self::with_client(builder.build()?, endpoint))
  }

  pub fn with_client(client: Client, endpoint: Url) -> Self {
    Self { client, endpoint }
  }

  pub fn endpoint(&self) -> &Url {
    &self.endpoint
  }
}

#[async_trait]
impl GenerationService for HttpGenerationService {
  #[instrument(
    name = "http_generate",
    skip(self, request),
    fields(
      endpoint = %self.endpoint,
      generate_type = ?request.generate_type,
    )
  )]
  async fn generate(
    &self,
    request: GenerationRequest,
  ) -> Result<GenerationResult, GenerationError> {
    debug!(prompt = %request.prompt, "sending generation request");

    let response = self
      .client
      .post(self.endpoint.clone())
      .json(&request)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(GenerationError::Status {
        status: status.as_u16(),
        body,
      });
    }

    let body = response.text().await?;
    debug!(status = status.as_u16(), bytes = body.len(), "received generation response");

    decode_body(request.generate_type, body)
  }
}

/// Map a successful response body to a result according to the requested type.
fn decode_body(
  generate_type: GenerateType,
  body: String,
) -> Result<GenerationResult, GenerationError> {
  match generate_type {
    GenerateType::Text => Ok(GenerationResult::Text(body)),
    GenerateType::Object => {
      let parsed: serde_json::Value = serde_json::from_str(&body)
        .map_err(|e| GenerationError::malformed(format!("invalid JSON: {}", e)))?;

      match parsed {
        serde_json::Value::Object(mut fields) => fields
          .remove("result")
          .map(GenerationResult::Object)
          .ok_or_else(|| GenerationError::malformed("response has no 'result' field")),
        other => Err(GenerationError::malformed(format!(
          "expected a JSON object, got {}",
          other
        ))),
      }
    }
  }
}
