/// Errors from parsing key combinations.
#[derive(Debug, thiserror::Error)]
pub enum ShortcutError {
  #[error("empty key combination")]
  Empty,

  #[error("unknown modifier '{modifier}' in '{combo}'")]
  UnknownModifier { combo: String, modifier: String },
}
