//! One-time environment image build.
//!
//! Stages the embedded Dockerfile and a prebuilt `design-worker` binary into
//! a temporary build context and runs `docker build`. The resulting image
//! carries a pinned BoltzGen install with model weights already downloaded;
//! any build step failure aborts image construction, there is no retry.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::info;

const DOCKERFILE: &str = include_str!("../boltzgen.Dockerfile");
const WORKER_FILE: &str = "design-worker";

#[derive(Debug, thiserror::Error)]
enum BuildError {
    #[error("config error: {0}")]
    Config(String),

    #[error("docker build exited with status {0}")]
    Build(i32),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser)]
#[command(name = "build-image", version)]
struct Cli {
    /// Tag for the built environment image
    #[arg(long, default_value = "boltzgen-env:latest")]
    tag: String,

    /// Prebuilt Linux `design-worker` binary to bake into the image
    #[arg(long)]
    worker_bin: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), BuildError> {
    which::which("docker")
        .map_err(|_| BuildError::Config("docker not found on PATH".to_string()))?;

    let context = tempfile::tempdir()?;
    stage_context(context.path(), &cli.worker_bin).await?;

    info!(tag = %cli.tag, "building environment image");
    // Inherited stdio: image builds are long and interactive, the docker
    // output is the progress report.
    let status = tokio::process::Command::new("docker")
        .arg("build")
        .arg("--tag")
        .arg(&cli.tag)
        .arg(context.path())
        .status()
        .await
        .map_err(|e| BuildError::Config(format!("spawn docker: {e}")))?;

    if !status.success() {
        return Err(BuildError::Build(status.code().unwrap_or(-1)));
    }

    info!(tag = %cli.tag, "[OK] environment image built");
    Ok(())
}

/// Write the Dockerfile and copy the worker binary into the build context.
async fn stage_context(context: &Path, worker_bin: &Path) -> Result<(), BuildError> {
    let exists = tokio::fs::try_exists(worker_bin)
        .await
        .map_err(|e| BuildError::Config(format!("check {}: {e}", worker_bin.display())))?;
    if !exists {
        return Err(BuildError::Config(format!(
            "worker binary not found: {}",
            worker_bin.display()
        )));
    }

    tokio::fs::write(context.join("Dockerfile"), DOCKERFILE)
        .await
        .map_err(|e| BuildError::Config(format!("write Dockerfile: {e}")))?;
    tokio::fs::copy(worker_bin, context.join(WORKER_FILE))
        .await
        .map_err(|e| BuildError::Config(format!("copy {}: {e}", worker_bin.display())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dockerfile_pins_tool_revision_and_prefetches_models() {
        assert!(DOCKERFILE.contains("git checkout 247b9bbd8b68a60aba854c2968d6a0cddd21ad6d"));
        assert!(DOCKERFILE.contains("boltzgen download all"));
        assert!(DOCKERFILE.contains("COPY design-worker /usr/local/bin/design-worker"));
    }

    #[tokio::test]
    async fn stage_context_writes_dockerfile_and_worker() {
        let dir = tempfile::tempdir().unwrap();
        let worker = dir.path().join("worker");
        tokio::fs::write(&worker, b"#!binary").await.unwrap();

        let context = tempfile::tempdir().unwrap();
        stage_context(context.path(), &worker).await.unwrap();

        let dockerfile = tokio::fs::read_to_string(context.path().join("Dockerfile"))
            .await
            .unwrap();
        assert_eq!(dockerfile, DOCKERFILE);
        assert_eq!(
            tokio::fs::read(context.path().join("design-worker"))
                .await
                .unwrap(),
            b"#!binary"
        );
    }

    #[tokio::test]
    async fn missing_worker_binary_is_a_config_error() {
        let context = tempfile::tempdir().unwrap();
        let err = stage_context(context.path(), Path::new("/nonexistent/worker"))
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::Config(_)));
        assert!(err.to_string().contains("not found"));
    }
}
