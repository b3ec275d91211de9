use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("source '{source_name}' unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },
    #[error("malformed item: {0}")]
    MalformedItem(String),
    #[error("all sources failed: {0}")]
    AllSourcesFailed(String),
    #[error("render target error: {0}")]
    RenderTarget(String),
    #[error("credential error: {0}")]
    Credential(String),
}

impl EngineError {
    pub fn source_unavailable(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_name: source.into(),
            reason: reason.into(),
        }
    }
}
