use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use regex::Regex;
use tracing::{debug, info};

use crate::error::{DesignError, DesignResult};

/// Collect the byte content of every file the configuration document
/// references via a `path: <token>` entry, keyed by the token as written.
///
/// The configuration schema belongs to the external tool, so this is a
/// best-effort text scan rather than a structural parse. Tokens whose target
/// does not exist under `base_dir` are skipped without error; the tool itself
/// reports missing required inputs.
pub fn referenced_files(
    config_text: &str,
    base_dir: &Path,
) -> DesignResult<BTreeMap<String, Vec<u8>>> {
    let pattern = Regex::new(r"path:\s*(\S+)")
        .map_err(|e| DesignError::Internal(format!("reference pattern: {e}")))?;

    let mut files = BTreeMap::new();
    for caps in pattern.captures_iter(config_text) {
        let Some(token) = caps.get(1) else { continue };
        let token = token.as_str();
        let resolved = base_dir.join(token);
        if !resolved.is_file() {
            debug!(reference = token, "referenced file not present, skipping");
            continue;
        }
        let data = fs::read(&resolved)
            .map_err(|e| DesignError::Config(format!("read {}: {e}", resolved.display())))?;
        info!(reference = token, bytes = data.len(), "including referenced file");
        files.insert(token.to_string(), data);
    }
    Ok(files)
}
