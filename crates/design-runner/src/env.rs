use std::time::Duration;

use crate::error::{RunnerError, RunnerResult};

pub(crate) const DEFAULT_GPU: &str = "L40S";
pub(crate) const DEFAULT_TIMEOUT_MINUTES: u64 = 120;

/// `check` jobs only parse the configuration; they get a short fixed budget
/// regardless of the configured run timeout.
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Process environment read once at startup.
///
/// - `GPU`: accelerator class requested for the job (default `L40S`)
/// - `TIMEOUT`: wall-clock budget for `run` jobs, in whole minutes
///   (default 120)
#[derive(Debug, PartialEq)]
pub struct RunnerEnv {
    pub gpu: String,
    pub run_timeout: Duration,
}

impl RunnerEnv {
    pub fn from_env() -> RunnerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> RunnerResult<Self> {
        let gpu = lookup("GPU").unwrap_or_else(|| DEFAULT_GPU.to_string());
        let minutes = match lookup("TIMEOUT") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                RunnerError::Config(format!("TIMEOUT must be whole minutes, got {raw:?}: {e}"))
            })?,
            None => DEFAULT_TIMEOUT_MINUTES,
        };
        Ok(Self {
            gpu,
            run_timeout: Duration::from_secs(minutes * 60),
        })
    }
}
