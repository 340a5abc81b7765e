use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;
use tracing::info;

use crate::error::{DesignError, DesignResult};
use crate::wire::OutputFile;

/// Fixed name the configuration document is staged under in the workspace.
pub const CONFIG_FILE_NAME: &str = "cyclic_peptide_to_ppif.yaml";
/// Extension of the result file `check` expects the tool to produce.
pub const RESULT_EXTENSION: &str = "cif";

const OUTPUT_SUBDIR: &str = "output";
const PROTOCOL: &str = "peptide-anything";

#[derive(Debug)]
pub struct CheckOutput {
    /// Combined stdout + stderr of the tool.
    pub log: String,
    /// Bytes of the structure file the check produced.
    pub structure: Vec<u8>,
}

/// Invokes the external `boltzgen` CLI against inputs staged into a fresh
/// scratch directory. The directory is removed on every exit path, success
/// or failure.
pub struct BoltzgenCli {
    program: PathBuf,
}

impl Default for BoltzgenCli {
    fn default() -> Self {
        Self::new("boltzgen")
    }
}

impl BoltzgenCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Validate a configuration document. Returns the tool's combined log
    /// output and the structure file it writes next to the config.
    pub fn check(
        &self,
        config_text: &str,
        files: &BTreeMap<String, Vec<u8>>,
    ) -> DesignResult<CheckOutput> {
        self.check_in(&std::env::temp_dir(), config_text, files)
    }

    /// Generate `num_designs` candidate designs. Returns every regular file
    /// the tool leaves under its output directory, sorted by relative path.
    pub fn run(
        &self,
        config_text: &str,
        files: &BTreeMap<String, Vec<u8>>,
        num_designs: u32,
    ) -> DesignResult<Vec<OutputFile>> {
        self.run_in(&std::env::temp_dir(), config_text, files, num_designs)
    }

    fn check_in(
        &self,
        temp_parent: &Path,
        config_text: &str,
        files: &BTreeMap<String, Vec<u8>>,
    ) -> DesignResult<CheckOutput> {
        let work = TempDir::new_in(temp_parent)?;
        let config_path = stage(work.path(), config_text, files)?;

        info!(program = %self.program.display(), "running boltzgen check");
        let output = Command::new(&self.program)
            .arg("check")
            .arg(&config_path)
            .arg("--output")
            .arg(work.path())
            .output()
            .map_err(|e| DesignError::Config(format!("spawn {}: {e}", self.program.display())))?;

        let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
        log.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(DesignError::Tool {
                status: output.status.code().unwrap_or(-1),
                log,
            });
        }

        let result_name = Path::new(CONFIG_FILE_NAME).with_extension(RESULT_EXTENSION);
        let result_path = work.path().join(&result_name);
        let structure = fs::read(&result_path)
            .map_err(|e| DesignError::MissingResult(format!("{}: {e}", result_name.display())))?;

        Ok(CheckOutput { log, structure })
    }

    fn run_in(
        &self,
        temp_parent: &Path,
        config_text: &str,
        files: &BTreeMap<String, Vec<u8>>,
        num_designs: u32,
    ) -> DesignResult<Vec<OutputFile>> {
        let work = TempDir::new_in(temp_parent)?;
        let config_path = stage(work.path(), config_text, files)?;
        let out_dir = work.path().join(OUTPUT_SUBDIR);

        info!(program = %self.program.display(), num_designs, "running boltzgen run");
        // Stdio inherited: the tool's own progress output is the only
        // feedback channel during a long design run.
        let status = Command::new(&self.program)
            .arg("run")
            .arg(&config_path)
            .arg("--output")
            .arg(&out_dir)
            .arg("--protocol")
            .arg(PROTOCOL)
            .arg("--num_designs")
            .arg(num_designs.to_string())
            .status()
            .map_err(|e| DesignError::Config(format!("spawn {}: {e}", self.program.display())))?;

        if !status.success() {
            return Err(DesignError::Tool {
                status: status.code().unwrap_or(-1),
                log: String::new(),
            });
        }

        collect_outputs(&out_dir)
    }
}

/// Write the configuration document and every auxiliary file into `work`.
/// Returns the staged configuration path.
fn stage(
    work: &Path,
    config_text: &str,
    files: &BTreeMap<String, Vec<u8>>,
) -> DesignResult<PathBuf> {
    let config_path = work.join(CONFIG_FILE_NAME);
    fs::write(&config_path, config_text)
        .map_err(|e| DesignError::Config(format!("write {}: {e}", config_path.display())))?;

    for (rel, data) in files {
        let rel_path = sanitize_relative(rel)?;
        let dest = work.join(rel_path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| DesignError::Config(format!("create {}: {e}", parent.display())))?;
        }
        fs::write(&dest, data)
            .map_err(|e| DesignError::Config(format!("write {}: {e}", dest.display())))?;
    }

    Ok(config_path)
}

/// Auxiliary file keys come from a text scan of the config document; only
/// plain relative paths may be staged into the workspace.
fn sanitize_relative(rel: &str) -> DesignResult<PathBuf> {
    let path = Path::new(rel);
    if path.is_absolute() {
        return Err(DesignError::InvalidPath(rel.to_string()));
    }
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => return Err(DesignError::InvalidPath(rel.to_string())),
        }
    }
    Ok(path.to_path_buf())
}

fn collect_outputs(root: &Path) -> DesignResult<Vec<OutputFile>> {
    let mut outputs = Vec::new();
    if root.is_dir() {
        collect_into(root, root, &mut outputs)?;
    }
    outputs.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(outputs)
}

fn collect_into(root: &Path, dir: &Path, outputs: &mut Vec<OutputFile>) -> DesignResult<()> {
    let entries = fs::read_dir(dir)
        .map_err(|e| DesignError::Internal(format!("read {}: {e}", dir.display())))?;
    for entry in entries {
        let entry = entry.map_err(|e| DesignError::Internal(format!("read dir entry: {e}")))?;
        let path = entry.path();
        if path.is_dir() {
            collect_into(root, &path, outputs)?;
        } else if path.is_file() {
            let rel = path
                .strip_prefix(root)
                .map_err(|e| DesignError::Internal(format!("relativize output path: {e}")))?;
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let data = fs::read(&path)
                .map_err(|e| DesignError::Internal(format!("read {}: {e}", path.display())))?;
            outputs.push(OutputFile { path: rel, data });
        }
    }
    Ok(())
}
