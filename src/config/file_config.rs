//! Configuration file bootstrap.
//!
//! # Configuration File Format
//!
//! ```toml
//! [dataset]
//! location = "vipdb.json"        # path or http(s) URL
//! timeout_seconds = 30
//!
//! [search]
//! threshold = 0.35               # lower = stricter fuzzy matching
//! max_fuzzy_results = 50
//! page_size = 50
//!
//! [logging]
//! level = "info"
//! ```

use std::path::Path;

use super::Config;

impl Config {
    /// Load configuration from a TOML file without environment overrides
    pub fn from_file(path: &Path) -> Result<Self, ConfigFileError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigFileError::Io(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigFileError::Parse(e.to_string()))
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }
}

/// Write the default configuration, refusing to overwrite unless `force`.
///
/// The written file is read back and returned.
pub fn write_default_config(path: &Path, force: bool) -> Result<Config, ConfigFileError> {
    if path.exists() && !force {
        return Err(ConfigFileError::AlreadyExists(path.display().to_string()));
    }
    Config::default().save(path)?;
    Config::from_file(path)
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Config file already exists: {0} (use --force to overwrite)")]
    AlreadyExists(String),
}
