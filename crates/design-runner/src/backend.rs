use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use design_core::{JobMode, JobRequest, JobResponse};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::info;

use crate::env::{CHECK_TIMEOUT, RunnerEnv};
use crate::error::{RunnerError, RunnerResult};

const WORKER_BIN: &str = "design-worker";

/// Submission seam between the local driver and the execution platform.
/// One blocking round trip per invocation; no retry.
#[async_trait]
pub trait DesignBackend: Send + Sync {
    async fn submit(&self, request: &JobRequest) -> RunnerResult<JobResponse>;
}

/// Runs jobs inside the prebuilt environment image via `docker run`,
/// passing the request JSON on the worker's stdin and reading the response
/// from its stdout.
pub struct DockerBackend {
    image: String,
    gpu: String,
    run_timeout: Duration,
}

impl DockerBackend {
    pub fn new(image: String, env: &RunnerEnv) -> RunnerResult<Self> {
        which::which("docker")
            .map_err(|_| RunnerError::Config("docker not found on PATH".to_string()))?;
        Ok(Self {
            image,
            gpu: env.gpu.clone(),
            run_timeout: env.run_timeout,
        })
    }

    fn command_args(&self) -> Vec<String> {
        vec![
            "run".to_string(),
            "--rm".to_string(),
            "-i".to_string(),
            "--gpus".to_string(),
            "all".to_string(),
            "--env".to_string(),
            format!("GPU={}", self.gpu),
            self.image.clone(),
            WORKER_BIN.to_string(),
        ]
    }

    fn timeout_for(&self, mode: JobMode) -> Duration {
        match mode {
            JobMode::Check => CHECK_TIMEOUT,
            JobMode::Run => self.run_timeout,
        }
    }
}

#[async_trait]
impl DesignBackend for DockerBackend {
    async fn submit(&self, request: &JobRequest) -> RunnerResult<JobResponse> {
        let payload = serde_json::to_vec(request)
            .map_err(|e| RunnerError::Backend(format!("encode job request: {e}")))?;

        info!(
            image = %self.image,
            gpu = %self.gpu,
            mode = request.mode.as_str(),
            "submitting job to environment image"
        );

        let mut child = tokio::process::Command::new("docker")
            .args(self.command_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| RunnerError::Backend(format!("spawn docker: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RunnerError::Backend("worker stdin unavailable".to_string()))?;
        stdin
            .write_all(&payload)
            .await
            .map_err(|e| RunnerError::Backend(format!("write job request: {e}")))?;
        drop(stdin); // EOF tells the worker the request is complete

        let mut stdout_pipe = child
            .stdout
            .take()
            .ok_or_else(|| RunnerError::Backend("worker stdout unavailable".to_string()))?;

        let limit = self.timeout_for(request.mode);
        let wait = async {
            let mut stdout = Vec::new();
            stdout_pipe
                .read_to_end(&mut stdout)
                .await
                .map_err(|e| RunnerError::Backend(format!("read job response: {e}")))?;
            let status = child
                .wait()
                .await
                .map_err(|e| RunnerError::Backend(format!("wait for worker: {e}")))?;
            Ok::<_, RunnerError>((status.success(), status.code().unwrap_or(-1), stdout))
        };

        // Bind before matching so the wait future (and its borrow of the
        // child) is dropped before the timeout branch kills it.
        let outcome = tokio::time::timeout(limit, wait).await;
        match outcome {
            Ok(result) => {
                let (success, code, stdout) = result?;
                parse_response(success, code, &stdout)
            }
            Err(_) => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                Err(RunnerError::Timeout {
                    minutes: limit.as_secs() / 60,
                })
            }
        }
    }
}

/// A worker that fails still writes a structured error response before
/// exiting non-zero; only an unparseable stdout falls back to the exit code.
fn parse_response(success: bool, code: i32, stdout: &[u8]) -> RunnerResult<JobResponse> {
    match serde_json::from_slice::<JobResponse>(stdout) {
        Ok(response) => Ok(response),
        Err(e) if success => Err(RunnerError::Backend(format!("parse job response: {e}"))),
        Err(_) => Err(RunnerError::Backend(format!(
            "worker exited with status {code} and no response"
        ))),
    }
}
