#[derive(Debug, thiserror::Error)]
pub enum DesignError {
    #[error("config error: {0}")]
    Config(String),

    #[error("boltzgen exited with status {status}:\n{log}")]
    Tool { status: i32, log: String },

    #[error("expected result file missing: {0}")]
    MissingResult(String),

    #[error("refusing non-relative staging path: {0}")]
    InvalidPath(String),

    #[error("wire error: {0}")]
    Wire(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type DesignResult<T> = Result<T, DesignError>;
