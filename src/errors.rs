use thiserror::Error;

/// Failures raised by persistence and configuration.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Unsupported data version: {0}")]
    UnsupportedVersion(String),
}
