//! Engine settings shared by the CLI and the HTTP generation client.
//!
//! ```json
//! {
//!   "endpoint": "http://localhost:3000/api/generate",
//!   "stepDelayMs": 100,
//!   "requestTimeoutSecs": 60
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/generate";
pub const DEFAULT_STEP_DELAY_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
  /// Generation endpoint every request is POSTed to.
  #[serde(default = "default_endpoint")]
  pub endpoint: String,
  /// Pause after each successful Generate step of a flow.
  #[serde(default = "default_step_delay_ms")]
  pub step_delay_ms: u64,
  /// Client-side request timeout. The engine itself enforces none.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub request_timeout_secs: Option<u64>,
}

impl Default for EngineSettings {
  fn default() -> Self {
    Self {
      endpoint: default_endpoint(),
      step_delay_ms: DEFAULT_STEP_DELAY_MS,
      request_timeout_secs: None,
    }
  }
}

impl EngineSettings {
  /// Load settings from a JSON file. A missing file yields the defaults.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    if !path.exists() {
      return Ok(Self::default());
    }
    let content = std::fs::read_to_string(path)?;
    let settings: EngineSettings = serde_json::from_str(&content)?;
    settings.endpoint_url()?;
    Ok(settings)
  }

  /// Parse the endpoint, requiring an absolute http(s) URL.
  pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
    let url = Url::parse(&self.endpoint).map_err(|e| ConfigError::InvalidEndpoint {
      endpoint: self.endpoint.clone(),
      message: e.to_string(),
    })?;

    match url.scheme() {
      "http" | "https" => Ok(url),
      scheme => Err(ConfigError::InvalidEndpoint {
        endpoint: self.endpoint.clone(),
        message: format!("unsupported scheme '{}'", scheme),
      }),
    }
  }

  pub fn step_delay(&self) -> Duration {
    Duration::from_millis(self.step_delay_ms)
  }

  pub fn request_timeout(&self) -> Option<Duration> {
    self.request_timeout_secs.map(Duration::from_secs)
  }
}

fn default_endpoint() -> String {
  DEFAULT_ENDPOINT.to_string()
}

fn default_step_delay_ms() -> u64 {
  DEFAULT_STEP_DELAY_MS
}
