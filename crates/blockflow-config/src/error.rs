use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid setting '{field}': {message}")]
  InvalidSetting { field: String, message: String },

  #[error("invalid schema at {path}: {message}")]
  InvalidSchema { path: String, message: String },

  #[error("invalid block '{block_id}': {source}")]
  InvalidBlock {
    block_id: String,
    #[source]
    source: Box<ConfigError>,
  },

  #[error("duplicate block id: {0}")]
  DuplicateBlockId(String),

  #[error("invalid endpoint '{endpoint}': {message}")]
  InvalidEndpoint { endpoint: String, message: String },

  #[error("failed to parse configuration: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("failed to read configuration: {0}")]
  Io(#[from] std::io::Error),
}
