//! Analyzer configuration.
//!
//! Every field has a default, so a config file only needs the keys it wants to
//! change:
//!
//! ```json
//! { "entropy_threshold": 7.5, "max_embedded": 1000 }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Bytes of the file used for header detection and the hex dump
pub const DEFAULT_HEADER_LEN: usize = 64;

/// Largest accepted `header_len`
pub const MAX_HEADER_LEN: usize = 64 * 1024;

/// Entropy (bits per byte) above which content looks encrypted or packed
pub const DEFAULT_ENTROPY_THRESHOLD: f64 = 7.0;

/// Files at least this large are streamed instead of read whole
pub const DEFAULT_STREAM_THRESHOLD: u64 = 256 * 1024 * 1024;

/// Read size used while streaming
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub header_len: usize,
    pub entropy_threshold: f64,
    /// Upper bound on reported embedded detections; `None` keeps all of them
    pub max_embedded: Option<usize>,
    pub stream_threshold: u64,
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            header_len: DEFAULT_HEADER_LEN,
            entropy_threshold: DEFAULT_ENTROPY_THRESHOLD,
            max_embedded: None,
            stream_threshold: DEFAULT_STREAM_THRESHOLD,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Config {
    /// Load a JSON config file on top of the defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&text).map_err(|message| Error::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Check settings after every override has been applied
    pub fn validate(&self) -> Result<()> {
        self.check().map_err(Error::Setting)
    }

    fn from_json(text: &str) -> std::result::Result<Self, String> {
        let config: Config = serde_json::from_str(text).map_err(|e| e.to_string())?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> std::result::Result<(), String> {
        // NaN fails the range check too
        if !(0.0..=8.0).contains(&self.entropy_threshold) {
            return Err(format!(
                "entropy_threshold must be within 0..=8, got {}",
                self.entropy_threshold
            ));
        }
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than zero".to_string());
        }
        if self.header_len > MAX_HEADER_LEN {
            return Err(format!(
                "header_len must be at most {}, got {}",
                MAX_HEADER_LEN, self.header_len
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.header_len, 64);
        assert_eq!(config.entropy_threshold, 7.0);
        assert_eq!(config.max_embedded, None);
        assert_eq!(config.chunk_size, 1024 * 1024);
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let config = Config::from_json(r#"{"max_embedded": 10}"#).unwrap();
        assert_eq!(config.max_embedded, Some(10));
        assert_eq!(config.header_len, DEFAULT_HEADER_LEN);
        assert_eq!(config.entropy_threshold, DEFAULT_ENTROPY_THRESHOLD);
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(Config::from_json(r#"{"entropy": 7.5}"#).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let err = Config::from_json(r#"{"entropy_threshold": 9.5}"#).unwrap_err();
        assert!(err.contains("entropy_threshold"));
    }

    #[test]
    fn test_rejects_zero_chunk_size() {
        assert!(Config::from_json(r#"{"chunk_size": 0}"#).is_err());
    }

    #[test]
    fn test_rejects_oversized_header_len() {
        let err = Config::from_json(r#"{"header_len": 1000000}"#).unwrap_err();
        assert!(err.contains("header_len"));
        assert!(Config::from_json(&format!(r#"{{"header_len": {}}}"#, MAX_HEADER_LEN)).is_ok());
    }

    #[test]
    fn test_validate_after_overrides() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.entropy_threshold = f64::NAN;
        assert!(matches!(config.validate(), Err(Error::Setting(_))));

        config.entropy_threshold = -1.0;
        assert!(config.validate().is_err());

        config.entropy_threshold = 7.5;
        config.header_len = usize::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("header_len"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"header_len": 16, "stream_threshold": 1024}}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.header_len, 16);
        assert_eq!(config.stream_threshold, 1024);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
