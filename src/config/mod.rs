//! Configuration management.

mod file_config;

pub use file_config::{write_default_config, ConfigFileError};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::search::{SearchOptions, DEFAULT_MAX_FUZZY_RESULTS, DEFAULT_PAGE_SIZE, DEFAULT_THRESHOLD};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Dataset settings
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Dataset configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Path or http(s) URL of the JSON dataset
    #[serde(default = "default_location")]
    pub location: String,

    /// Timeout for fetching a remote dataset
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            location: default_location(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_location() -> String {
    "vipdb.json".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Search configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Fuzzy acceptance threshold (lower = stricter)
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Maximum number of fuzzy matches kept
    #[serde(default = "default_max_fuzzy_results")]
    pub max_fuzzy_results: usize,

    /// Results per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            max_fuzzy_results: default_max_fuzzy_results(),
            page_size: default_page_size(),
        }
    }
}

impl SearchConfig {
    /// Options for the query coordinator
    pub fn options(&self) -> SearchOptions {
        SearchOptions::default()
            .threshold(self.threshold)
            .max_fuzzy_results(self.max_fuzzy_results)
            .page_size(self.page_size)
    }
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_max_fuzzy_results() -> usize {
    DEFAULT_MAX_FUZZY_RESULTS
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load configuration from a file, with `VIPDB_` environment overrides
/// (e.g. `VIPDB_SEARCH__PAGE_SIZE=20`)
pub fn load_config(path: &PathBuf) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path.as_path()))
        .add_source(environment())
        .build()?;

    settings.try_deserialize()
}

/// Load configuration from environment variables only
pub fn get_config() -> Result<Config, config::ConfigError> {
    config::Config::builder()
        .add_source(environment())
        .build()?
        .try_deserialize()
}

/// `VIPDB_SECTION__KEY` environment variables
fn environment() -> config::Environment {
    config::Environment::with_prefix("VIPDB")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Find a configuration file in the default locations
///
/// Checks `./vipdb.toml`, then `<config dir>/vipdb/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("vipdb.toml");
    if local.is_file() {
        return Some(local);
    }

    default_config_path().filter(|path| path.is_file())
}

/// Default location of the user configuration file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vipdb").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.dataset.location, "vipdb.json");
        assert_eq!(config.search.threshold, 0.35);
        assert_eq!(config.search.page_size, 50);
        assert_eq!(config.search.max_fuzzy_results, 50);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vipdb.toml");
        std::fs::write(
            &path,
            r#"
[dataset]
location = "https://example.org/vipdb.json"

[search]
threshold = 0.2
page_size = 25
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.dataset.location, "https://example.org/vipdb.json");
        assert_eq!(config.dataset.timeout_seconds, 30);
        assert_eq!(config.search.threshold, 0.2);
        assert_eq!(config.search.page_size, 25);
        assert_eq!(config.search.max_fuzzy_results, 50);
    }

    #[test]
    fn test_search_options_from_config() {
        let search = SearchConfig {
            threshold: 0.1,
            max_fuzzy_results: 10,
            page_size: 5,
        };
        let options = search.options();
        assert_eq!(options.threshold, 0.1);
        assert_eq!(options.max_fuzzy_results, 10);
        assert_eq!(options.page_size, 5);
    }
}
