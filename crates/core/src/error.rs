use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("unknown ai model type: {0}")]
    UnknownModelKind(String),
    #[error("rule has no extensions")]
    EmptyExtensions,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
