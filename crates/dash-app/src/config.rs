//! Application configuration

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "dashctl.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the persisted dashboard state
    pub state_dir: PathBuf,

    /// Rows kept from each loaded file
    pub preview_limit: usize,

    /// Rows sampled when deriving category options
    pub category_sample_size: usize,

    /// Default `watch` interval
    pub refresh_interval_secs: u64,

    /// Log filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from(".dashboard"),
            preview_limit: 500,
            category_sample_size: 200,
            refresh_interval_secs: 5,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from [`DEFAULT_CONFIG_FILE`] if it exists,
    /// otherwise use the defaults. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"preview_limit": 50, "log_filter": "debug"}}"#).unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.preview_limit, 50);
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.state_dir, PathBuf::from(".dashboard"));
        assert_eq!(config.refresh_interval_secs, 5);
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("missing.json"))).is_err());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "preview_limit = 5").unwrap();
        assert!(AppConfig::from_file(file.path()).is_err());
    }
}
