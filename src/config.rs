//! Runtime configuration for the metadata stages.
//!
//! Values come from [`Default`], optionally overridden by a JSON file and
//! then by command-line flags.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::utils::ParallelConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Invalid configuration file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Settings shared by snapshot reconciliation and cleanup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Directory holding one sub-directory per sample.
    pub path: PathBuf,
    /// Worker threads for per-sample processing.
    pub threads: usize,
    /// Refuse to persist records with categories that cannot be serialized.
    pub strict_dump: bool,
    /// Extension of the sequence files used to derive sample names.
    pub extension: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            path: PathBuf::from("."),
            threads: 1,
            strict_dump: false,
            extension: "fastq".to_string(),
        }
    }
}

impl ReaderConfig {
    /// Loads a configuration file; missing fields keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::open(path.as_ref())?;
        let config: ReaderConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::InvalidParameters(
                "threads must be at least 1".to_string(),
            ));
        }
        if self.extension.is_empty() {
            return Err(ConfigError::InvalidParameters(
                "extension must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn parallel(&self) -> ParallelConfig {
        ParallelConfig {
            threads: self.threads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("config.json");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, r#"{{"path": "/data/run1", "threads": 8}}"#).unwrap();

        let config = ReaderConfig::from_file(&file_path).unwrap();
        assert_eq!(config.path, PathBuf::from("/data/run1"));
        assert_eq!(config.threads, 8);
        assert!(!config.strict_dump);
        assert_eq!(config.extension, "fastq");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("config.json");
        std::fs::write(&file_path, r#"{"threads": 0}"#).unwrap();
        assert!(matches!(
            ReaderConfig::from_file(&file_path),
            Err(ConfigError::InvalidParameters(_))
        ));

        std::fs::write(&file_path, "{threads").unwrap();
        assert!(matches!(
            ReaderConfig::from_file(&file_path),
            Err(ConfigError::ParseError(_))
        ));
    }
}
