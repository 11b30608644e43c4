// Model parameter file (`<prefix>-params.json`).
//
// Loaded verbatim as a JSON object. The handler never validates the whole
// document; each algorithm pulls the keys it needs through the typed
// accessors below, which name the offending key on failure.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{HandlerError, Result};

/// Parameter name to value, immutable after load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelParams(Map<String, Value>);

impl ModelParams {
    /// Read and parse the parameter file. A missing file is `MissingArtifact`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(HandlerError::MissingArtifact(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        let params = Self::from_json(&raw)
            .map_err(|e| HandlerError::invalid_artifact(path, e.to_string()))?;
        debug!(path = %path.display(), keys = params.0.len(), "Loaded model params");
        Ok(params)
    }

    /// Parse a parameter document. The top level must be a JSON object.
    pub fn from_json(raw: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => Ok(Self(map)),
            other => Err(HandlerError::invalid_param(
                "<root>",
                format!("expected a JSON object, found {}", json_kind(&other)),
            )),
        }
    }

    /// Fetch a required key.
    pub fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .0
            .get(key)
            .ok_or_else(|| HandlerError::MissingParameter(key.to_string()))?;
        decode(key, value)
    }

    /// Fetch an optional key. Absent and `null` both yield `None`.
    pub fn optional<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => decode(key, value).map(Some),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for ModelParams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn decode<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T> {
    T::deserialize(value).map_err(|e| HandlerError::invalid_param(key, e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ModelParams {
        ModelParams::from_json(
            r#"{"grammar": "NP: {<ADJ>*<NOUN|PROPN>}", "window": 10, "normalization": null}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_require_present_key() {
        let params = sample();
        let window: usize = params.require("window").unwrap();
        assert_eq!(window, 10);
    }

    #[test]
    fn test_require_missing_key_names_it() {
        let err = sample().require::<usize>("max_count").unwrap_err();
        match err {
            HandlerError::MissingParameter(key) => assert_eq!(key, "max_count"),
            other => panic!("expected MissingParameter, got {other:?}"),
        }
    }

    #[test]
    fn test_require_wrong_type() {
        let err = sample().require::<usize>("grammar").unwrap_err();
        assert!(matches!(err, HandlerError::InvalidParameter { ref key, .. } if key == "grammar"));
    }

    #[test]
    fn test_optional_null_is_none() {
        let params = sample();
        assert_eq!(params.optional::<String>("normalization").unwrap(), None);
        assert_eq!(params.optional::<String>("language").unwrap(), None);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(ModelParams::from_json("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelParams::load(&dir.path().join("x-params.json")).unwrap_err();
        assert!(matches!(err, HandlerError::MissingArtifact(_)));
    }
}
