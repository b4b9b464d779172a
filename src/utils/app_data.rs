use crate::index::IndexConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "linedex";
const CONFIG_FILE: &str = "config.json";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Corpus loaded when no file is given on the command line
    #[serde(default = "default_corpus_path")]
    pub corpus_path: PathBuf,

    /// Address the server listens on and the client connects to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Deepest phrase indexed per suffix; unset indexes whole suffixes
    #[serde(default)]
    pub max_phrase_len: Option<NonZeroUsize>,

    /// Log indexing progress every this many lines
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,

    #[serde(default = "default_bench_phrase")]
    pub bench_phrase: String,

    #[serde(default = "default_bench_threads")]
    pub bench_threads: usize,

    /// Searches per load-generator thread
    #[serde(default = "default_bench_searches")]
    pub bench_searches: usize,

    /// Result cache entries kept by the server
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("test.txt")
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_progress_every() -> usize {
    100
}

fn default_bench_phrase() -> String {
    "Ned Land".to_string()
}

fn default_bench_threads() -> usize {
    24
}

fn default_bench_searches() -> usize {
    10_000
}

fn default_cache_size() -> usize {
    128
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            corpus_path: default_corpus_path(),
            bind_addr: default_bind_addr(),
            max_phrase_len: None,
            progress_every: default_progress_every(),
            bench_phrase: default_bench_phrase(),
            bench_threads: default_bench_threads(),
            bench_searches: default_bench_searches(),
            cache_size: default_cache_size(),
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load config from an explicit file, or return default if it does not exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
            let config: AppConfig = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the app data directory
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = get_config_path()?;
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content).context("Failed to write config file")?;
        Ok(config_path)
    }

    /// Indexer settings derived from this config
    pub fn index_config(&self) -> IndexConfig {
        IndexConfig {
            max_phrase_len: self.max_phrase_len,
        }
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir().map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.max_phrase_len, None);
        assert_eq!(config.bench_threads, 24);
        assert_eq!(config.bench_searches, 10_000);
        assert_eq!(config.index_config(), IndexConfig::default());
    }

    #[test]
    fn test_app_config_partial_json() {
        // Should use defaults for missing fields
        let json = r#"{"max_phrase_len": 3, "bind_addr": "0.0.0.0:9000"}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.max_phrase_len.map(NonZeroUsize::get), Some(3));
        assert_eq!(config.progress_every, 100);
        assert_eq!(config.index_config(), IndexConfig::with_limit(3));
    }

    #[test]
    fn test_app_config_empty_json() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_app_config_rejects_zero_limit() {
        let json = r#"{"max_phrase_len": 0}"#;
        assert!(serde_json::from_str::<AppConfig>(json).is_err());
    }

    #[test]
    fn test_load_from_missing_and_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        assert_eq!(AppConfig::load_from(&path).unwrap(), AppConfig::default());

        fs::write(&path, r#"{"bench_phrase": "Nemo", "cache_size": 4}"#).unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.bench_phrase, "Nemo");
        assert_eq!(config.cache_size, 4);
    }

    #[test]
    fn test_load_from_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "not json").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }
}
