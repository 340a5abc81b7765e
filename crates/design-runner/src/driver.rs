use std::path::{Path, PathBuf};

use design_core::{
    JobMode, JobRequest, JobResponse, RESULT_EXTENSION, referenced_files, timestamped_dir,
    write_outputs,
};
use tracing::info;

use crate::backend::DesignBackend;
use crate::error::{RunnerError, RunnerResult};

pub struct DriveOptions {
    pub config_path: PathBuf,
    pub out_dir: PathBuf,
    pub num_designs: u32,
    pub check: bool,
}

/// One forward pass: read config, resolve referenced files, submit, persist.
/// Returns the destination path the results were written to.
pub async fn drive<B: DesignBackend>(backend: &B, opts: &DriveOptions) -> RunnerResult<PathBuf> {
    let config_text = tokio::fs::read_to_string(&opts.config_path)
        .await
        .map_err(|e| {
            RunnerError::Config(format!("read {}: {e}", opts.config_path.display()))
        })?;

    let base_dir = opts.config_path.parent().unwrap_or(Path::new("."));
    let files = referenced_files(&config_text, base_dir)?;

    let mode = if opts.check { JobMode::Check } else { JobMode::Run };
    let request = JobRequest {
        mode,
        config_text,
        files,
        num_designs: opts.num_designs,
    };

    match backend.submit(&request).await? {
        JobResponse::Check { log, structure } => {
            // The check log is the product; show it verbatim.
            print!("{log}");
            let result_name = result_file_name(&opts.config_path)?;
            let dest_dir = timestamped_dir(&opts.out_dir, JobMode::Check);
            let dest = dest_dir.join(result_name);
            tokio::fs::create_dir_all(&dest_dir).await.map_err(|e| {
                RunnerError::Config(format!("create {}: {e}", dest_dir.display()))
            })?;
            tokio::fs::write(&dest, &structure)
                .await
                .map_err(|e| RunnerError::Config(format!("write {}: {e}", dest.display())))?;
            Ok(dest)
        }
        JobResponse::Run { outputs } => {
            info!(files = outputs.len(), "job returned output files");
            let dest = timestamped_dir(&opts.out_dir, JobMode::Run);
            write_outputs(&dest, &outputs)?;
            Ok(dest)
        }
        JobResponse::Error { message, log } => {
            if !log.is_empty() {
                eprint!("{log}");
            }
            Err(RunnerError::Backend(message))
        }
    }
}

/// `<config base name>.cif` — mirrors the name the tool writes remotely.
fn result_file_name(config_path: &Path) -> RunnerResult<PathBuf> {
    config_path
        .with_extension(RESULT_EXTENSION)
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| {
            RunnerError::Config(format!("no file name in {}", config_path.display()))
        })
}
