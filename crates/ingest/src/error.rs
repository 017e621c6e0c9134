use normalize::DispatchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid config file: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("Worker pool has no workers left")]
    PoolExhausted,

    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type IngestResult<T> = Result<T, IngestError>;
