use thiserror::Error;

pub type ProctorResult<T> = Result<T, ProctorError>;

#[derive(Error, Debug)]
pub enum ProctorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Reporting error: {0}")]
    Report(String),

    #[error("Attempt already active: {0}")]
    AttemptActive(String),

    #[error("Component not enabled: {0}")]
    NotEnabled(String),

    #[error("{0}")]
    Other(String),
}
