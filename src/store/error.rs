#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to (de)serialize store: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Not a PNG data URL")]
    InvalidDataUrl,

    #[error("{0} not found")]
    NotFound(String),
}
