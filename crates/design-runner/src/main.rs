//! Local entry point for BoltzGen cyclic peptide design jobs.
//!
//! Reads the configuration document, resolves the files it references,
//! submits one job into the prebuilt environment image, and writes the
//! returned files under a timestamped output directory.

mod backend;
mod driver;
mod env;
mod error;

use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::fmt::time::FormatTime;

use crate::backend::DockerBackend;
use crate::driver::DriveOptions;
use crate::env::RunnerEnv;
use crate::error::RunnerResult;

struct Elapsed(Instant);

impl FormatTime for Elapsed {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> fmt::Result {
        let d = self.0.elapsed();
        let total_secs = d.as_secs();
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        let millis = d.subsec_millis();
        write!(w, "[{mins:02}:{secs:02}:{millis:03}]")
    }
}

#[derive(Parser)]
#[command(name = "design-runner", version)]
struct Cli {
    /// Number of candidate designs to generate
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    num_designs: u32,

    /// Directory results are written under
    #[arg(long, default_value = "./out/")]
    out_dir: PathBuf,

    /// Validate the configuration document instead of running a design job
    #[arg(long)]
    check: bool,

    /// Configuration document for the design tool
    #[arg(long, default_value = design_core::CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Environment image tag jobs run in
    #[arg(long, default_value = "boltzgen-env:latest")]
    image: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_timer(Elapsed(Instant::now()))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> RunnerResult<()> {
    let env = RunnerEnv::from_env()?;
    let backend = DockerBackend::new(cli.image, &env)?;

    let opts = DriveOptions {
        config_path: cli.config,
        out_dir: cli.out_dir,
        num_designs: cli.num_designs,
        check: cli.check,
    };
    let dest = driver::drive(&backend, &opts).await?;

    if cli.check {
        println!("Check result saved to: {}", dest.display());
    } else {
        println!("Results saved to: {}", dest.display());
    }
    Ok(())
}
