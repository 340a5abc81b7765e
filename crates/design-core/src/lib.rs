//! Staging, invocation, and transport plumbing around the BoltzGen CLI.
//!
//! The design computation itself lives in the external `boltzgen` tool; this
//! crate only stages job inputs into a scratch workspace, runs the tool as a
//! subprocess, and carries its output files back as bytes.

mod error;
mod job;
mod persist;
mod scan;
mod wire;

pub use error::{DesignError, DesignResult};
pub use job::{BoltzgenCli, CheckOutput, CONFIG_FILE_NAME, RESULT_EXTENSION};
pub use persist::{timestamped_dir, write_outputs};
pub use scan::referenced_files;
pub use wire::{JobMode, JobRequest, JobResponse, OutputFile};
