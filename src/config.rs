use std::env;
use std::path::PathBuf;

use anyhow::Result;

/// Environment variable naming the model artifact directory.
pub const MODEL_DIR_VAR: &str = "NLP_ENDPOINT_MODEL_DIR";

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy.
pub struct Config {
    /// Directory holding `<prefix>-params.json` and `<prefix>-model`
    pub model_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// The model directory falls back to the platform data directory.
    pub fn load() -> Result<Self> {
        let model_dir = env::var(MODEL_DIR_VAR)
            .ok()
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(crate::artifacts::default_model_dir);

        Ok(Self { model_dir })
    }

    /// Use `dir` instead of the configured model directory.
    pub fn with_model_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.model_dir = dir;
        }
        self
    }

    /// Check that the model directory exists.
    /// Call this before handing the directory to the handler.
    pub fn require_model_dir(&self) -> Result<()> {
        if !self.model_dir.is_dir() {
            anyhow::bail!(
                "Model directory {} does not exist.\n\
                 Set {MODEL_DIR_VAR} in your .env file or pass --model-dir.",
                self.model_dir.display()
            );
        }
        Ok(())
    }
}
