use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("origin issue not found: {0}")]
    OriginNotFound(String),
    #[error("issue not found: {0}")]
    IssueNotFound(i64),
    #[error("category not found: {0}")]
    CategoryNotFound(String),
    #[error("classification not found: {0}")]
    ClassificationNotFound(String),
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings error: {0}")]
    Settings(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("background task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(err: tokio::task::JoinError) -> Self {
        EngineError::Task(err.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
