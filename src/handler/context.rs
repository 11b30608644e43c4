// What the hosting server hands the handler: a context with system
// properties at load time, and ordered request entries per batch.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{HandlerError, Result};

/// System property naming the model artifact directory.
pub const MODEL_DIR_PROPERTY: &str = "model_dir";

#[derive(Debug, Clone, Default)]
pub struct Context {
    pub system_properties: HashMap<String, String>,
    /// Set by `with_model_dir`; takes precedence over the string property
    /// so paths that are not valid UTF-8 survive unchanged.
    model_dir: Option<PathBuf>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context for `dir`. The `model_dir` property is only mirrored when
    /// the path is valid UTF-8.
    pub fn with_model_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let mut ctx = Self::new();
        if let Some(s) = dir.to_str() {
            ctx.system_properties
                .insert(MODEL_DIR_PROPERTY.to_string(), s.to_string());
        }
        ctx.model_dir = Some(dir.to_path_buf());
        ctx
    }

    pub fn model_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = self.model_dir.as_ref().filter(|d| !d.as_os_str().is_empty()) {
            return Ok(dir.clone());
        }
        self.system_properties
            .get(MODEL_DIR_PROPERTY)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .ok_or(HandlerError::MissingModelDir)
    }
}

/// One request of a batch: the raw body bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestEntry {
    pub body: Vec<u8>,
}

impl RequestEntry {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self { body: body.into() }
    }

    /// Decode the body as UTF-8. `index` is the entry's position in the
    /// batch, reported on failure.
    pub fn text(&self, index: usize) -> Result<String> {
        String::from_utf8(self.body.clone())
            .map_err(|source| HandlerError::InvalidPayload { index, source })
    }
}

impl From<&str> for RequestEntry {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for RequestEntry {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_dir_property() {
        let ctx = Context::with_model_dir("/opt/ml/models/kp");
        assert_eq!(ctx.model_dir().unwrap(), PathBuf::from("/opt/ml/models/kp"));
    }

    #[test]
    fn test_model_dir_from_host_property() {
        let mut ctx = Context::new();
        ctx.system_properties
            .insert(MODEL_DIR_PROPERTY.to_string(), "/srv/models".to_string());
        assert_eq!(ctx.model_dir().unwrap(), PathBuf::from("/srv/models"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_model_dir_is_kept_exactly() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = Path::new(OsStr::from_bytes(b"/tmp/mod\xe8les"));
        let ctx = Context::with_model_dir(dir);
        assert_eq!(ctx.model_dir().unwrap(), dir.to_path_buf());
        assert!(!ctx.system_properties.contains_key(MODEL_DIR_PROPERTY));
    }

    #[test]
    fn test_missing_model_dir() {
        let err = Context::new().model_dir().unwrap_err();
        assert!(matches!(err, HandlerError::MissingModelDir));
    }

    #[test]
    fn test_request_text_round_trips_utf8() {
        let entry = RequestEntry::from("Grüße aus Köln");
        assert_eq!(entry.text(0).unwrap(), "Grüße aus Köln");
    }

    #[test]
    fn test_request_text_reports_index() {
        let entry = RequestEntry::new(vec![0xc3u8, 0x28]);
        let err = entry.text(4).unwrap_err();
        assert!(matches!(err, HandlerError::InvalidPayload { index: 4, .. }));
    }
}
