// Model artifact discovery.
//
// A model directory holds exactly one `<prefix>-params.json` and, next to it,
// the `<prefix>-model` artifact. The prefix doubles as the model type, so a
// directory named anything at all can host either algorithm.

pub mod params;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{HandlerError, Result};

/// Suffix of the sentinel parameter file.
pub const PARAMS_SUFFIX: &str = "-params.json";

/// Suffix of the model artifact sharing the parameter file's prefix.
pub const MODEL_SUFFIX: &str = "-model";

/// Returns the default directory for model artifacts.
/// Uses the platform data directory: ~/.local/share/nlp-endpoint/models/ on Linux.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nlp-endpoint")
        .join("models")
}

/// Find the single `*-params.json` file in `model_dir` and return its prefix.
///
/// Zero matches is `MissingArtifact` for the glob itself. Multiple matches
/// are sorted before being reported so the error message is stable.
pub fn resolve_prefix(model_dir: &Path) -> Result<String> {
    // glob patterns are strings; a lossy conversion would search elsewhere
    let dir_str = model_dir.to_str().ok_or_else(|| {
        HandlerError::invalid_artifact(model_dir, "model directory path is not valid UTF-8")
    })?;
    let dir_pattern = glob::Pattern::escape(dir_str);
    let pattern = format!("{}/*{}", dir_pattern, PARAMS_SUFFIX);
    debug!(pattern = %pattern, "Looking for model parameter file");

    let entries = glob::glob(&pattern)
        .map_err(|e| HandlerError::invalid_artifact(model_dir, e.to_string()))?;

    let mut matches: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    matches.sort();

    let params_file = match matches.len() {
        0 => {
            return Err(HandlerError::MissingArtifact(
                model_dir.join(format!("*{PARAMS_SUFFIX}")),
            ))
        }
        1 => matches.remove(0),
        _ => {
            return Err(HandlerError::AmbiguousParamsFile {
                dir: model_dir.to_path_buf(),
                candidates: matches,
            })
        }
    };

    let prefix = prefix_of(&params_file).ok_or_else(|| {
        HandlerError::invalid_artifact(&params_file, "file name has no model prefix")
    })?;

    info!(prefix = %prefix, "Prefix for the model artifacts");
    Ok(prefix)
}

/// Strip `-params.json` from a parameter file name.
fn prefix_of(params_file: &Path) -> Option<String> {
    let name = params_file.file_name()?.to_str()?;
    let prefix = name.strip_suffix(PARAMS_SUFFIX)?;
    if prefix.is_empty() {
        None
    } else {
        Some(prefix.to_string())
    }
}

/// Path of the parameter file for `prefix`.
pub fn params_path(model_dir: &Path, prefix: &str) -> PathBuf {
    model_dir.join(format!("{prefix}{PARAMS_SUFFIX}"))
}

/// Path of the model artifact for `prefix`.
pub fn model_path(model_dir: &Path, prefix: &str) -> PathBuf {
    model_dir.join(format!("{prefix}{MODEL_SUFFIX}"))
}

/// Return `path` if it is an existing file, `MissingArtifact` otherwise.
pub fn require_file(path: PathBuf) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(HandlerError::MissingArtifact(path))
    }
}

/// Check whether both files for `prefix` exist.
pub fn artifacts_present(model_dir: &Path, prefix: &str) -> bool {
    params_path(model_dir, prefix).is_file() && model_path(model_dir, prefix).is_file()
}
