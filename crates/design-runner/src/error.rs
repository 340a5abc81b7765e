#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("config error: {0}")]
    Config(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("job timed out after {minutes} minutes")]
    Timeout { minutes: u64 },

    #[error(transparent)]
    Design(#[from] design_core::DesignError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RunnerResult<T> = Result<T, RunnerError>;
