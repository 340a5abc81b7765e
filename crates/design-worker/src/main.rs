//! In-image job entry point.
//!
//! Reads one JSON `JobRequest` from stdin, stages it into a scratch
//! workspace, runs the boltzgen CLI, and writes one JSON `JobResponse` to
//! stdout. Stdout is reserved for the response; all logging goes to stderr.

use std::io::{Read, Write};
use std::process::ExitCode;

use design_core::{BoltzgenCli, DesignError, DesignResult, JobMode, JobRequest, JobResponse};
use tracing::info;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> DesignResult<ExitCode> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| DesignError::Wire(format!("read job request: {e}")))?;
    let request: JobRequest = serde_json::from_str(&input)
        .map_err(|e| DesignError::Wire(format!("parse job request: {e}")))?;

    info!(
        mode = request.mode.as_str(),
        files = request.files.len(),
        num_designs = request.num_designs,
        "job received"
    );

    let cli = BoltzgenCli::default();
    let (response, code) = match request.mode {
        JobMode::Check => match cli.check(&request.config_text, &request.files) {
            Ok(out) => (
                JobResponse::Check {
                    log: out.log,
                    structure: out.structure,
                },
                ExitCode::SUCCESS,
            ),
            Err(e) => (error_response(e), ExitCode::FAILURE),
        },
        JobMode::Run => match cli.run(&request.config_text, &request.files, request.num_designs) {
            Ok(outputs) => (JobResponse::Run { outputs }, ExitCode::SUCCESS),
            Err(e) => (error_response(e), ExitCode::FAILURE),
        },
    };

    let json = serde_json::to_string(&response)
        .map_err(|e| DesignError::Wire(format!("encode job response: {e}")))?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(json.as_bytes())?;
    stdout.write_all(b"\n")?;
    Ok(code)
}

/// Keep the captured tool log in its own field so the caller can print it
/// verbatim; the message stays a one-liner.
fn error_response(err: DesignError) -> JobResponse {
    match err {
        DesignError::Tool { status, log } => JobResponse::Error {
            message: format!("boltzgen exited with status {status}"),
            log,
        },
        other => JobResponse::Error {
            message: other.to_string(),
            log: String::new(),
        },
    }
}
