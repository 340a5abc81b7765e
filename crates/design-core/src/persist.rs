use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{DesignError, DesignResult};
use crate::wire::{JobMode, OutputFile};

/// Destination directory for one invocation's results:
/// `<out_dir>/<mode>_<YYMMDDHHmm>` (local time, minute granularity).
pub fn timestamped_dir(out_dir: &Path, mode: JobMode) -> PathBuf {
    let stamp = chrono::Local::now().format("%y%m%d%H%M");
    out_dir.join(format!("{}_{stamp}", mode.as_str()))
}

/// Write every output file under `dest`, recreating each file's relative
/// directory structure.
pub fn write_outputs(dest: &Path, outputs: &[OutputFile]) -> DesignResult<()> {
    for file in outputs {
        let rel = relative_components(&file.path)?;
        let target = dest.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| DesignError::Config(format!("create {}: {e}", parent.display())))?;
        }
        fs::write(&target, &file.data)
            .map_err(|e| DesignError::Config(format!("write {}: {e}", target.display())))?;
    }
    Ok(())
}

/// Output paths arrive from the worker response; only plain relative paths
/// may be written under the destination.
fn relative_components(rel: &str) -> DesignResult<PathBuf> {
    if rel.starts_with('/') {
        return Err(DesignError::InvalidPath(rel.to_string()));
    }
    let path: PathBuf = rel.split('/').collect();
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => return Err(DesignError::InvalidPath(rel.to_string())),
        }
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outputs_reproduce_relative_structure_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let outputs = vec![
            OutputFile {
                path: "designs/design_0.pdb".to_string(),
                data: b"MODEL 1".to_vec(),
            },
            OutputFile {
                path: "scores.csv".to_string(),
                data: b"design,score\n0,1.5\n".to_vec(),
            },
        ];

        let dest = dir.path().join("run_2601011200");
        write_outputs(&dest, &outputs).unwrap();

        assert_eq!(
            fs::read(dest.join("designs/design_0.pdb")).unwrap(),
            b"MODEL 1"
        );
        assert_eq!(
            fs::read(dest.join("scores.csv")).unwrap(),
            b"design,score\n0,1.5\n"
        );
    }

    #[test]
    fn escaping_output_paths_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for bad in ["../outside.pdb", "/tmp/outside.pdb"] {
            let outputs = vec![OutputFile {
                path: bad.to_string(),
                data: b"x".to_vec(),
            }];
            let err = write_outputs(dir.path(), &outputs).unwrap_err();
            assert!(matches!(err, DesignError::InvalidPath(_)), "{bad}");
        }
    }

    #[test]
    fn timestamped_dir_uses_mode_prefix_and_minute_stamp() {
        let dir = timestamped_dir(Path::new("out"), JobMode::Run);
        let name = dir.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("run_"), "{name}");
        let stamp = name.trim_start_matches("run_");
        assert_eq!(stamp.len(), 10, "{name}");
        assert!(stamp.chars().all(|c| c.is_ascii_digit()), "{name}");

        let check = timestamped_dir(Path::new("out"), JobMode::Check);
        assert!(check.to_string_lossy().contains("check_"));
    }
}
