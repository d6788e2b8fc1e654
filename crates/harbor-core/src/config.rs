//! Background service configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use harbor_storage::RetentionPolicy;
use harbor_tabs::RetryPolicy;

use crate::error::CoreError;
use crate::Result;

pub const DATA_DIR_ENV: &str = "HARBOR_DATA_DIR";
pub const CRAWL_ENDPOINT_ENV: &str = "HARBOR_CRAWL_ENDPOINT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Where the download engine should place files
    pub download_dir: PathBuf,
    /// Homepage URL
    pub homepage: String,
    /// Crawl service enqueue URL for shadow tabs
    pub crawl_endpoint: Option<String>,
    pub retry_delay_ms: u64,
    pub retry_max_attempts: u32,
    pub retention: RetentionPolicy,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        let download_dir = dirs::download_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
            .unwrap_or_else(|| data_dir.join("Downloads"));
        let retry = RetryPolicy::default();

        Self {
            database_path: data_dir.join("harbor.db"),
            download_dir,
            homepage: "about:blank".to_string(),
            crawl_endpoint: None,
            retry_delay_ms: retry.delay.as_millis() as u64,
            retry_max_attempts: retry.max_attempts,
            retention: RetentionPolicy::default(),
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Harbor"))
            .unwrap_or_else(|| PathBuf::from(".harbor"))
    }

    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;
        let config = serde_json::from_str(&raw)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;
        Ok(config)
    }

    /// Environment overrides. A data dir override moves the database with it.
    pub fn apply_env(&mut self) {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            self.database_path = PathBuf::from(dir).join("harbor.db");
        }
        if let Ok(endpoint) = std::env::var(CRAWL_ENDPOINT_ENV) {
            self.crawl_endpoint = (!endpoint.trim().is_empty()).then(|| endpoint.trim().to_string());
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(self.retry_delay_ms), self.retry_max_attempts)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_derive_from_data_dir() {
        let config = Config::new(PathBuf::from("/tmp/harbor-test"));
        assert_eq!(config.database_path, PathBuf::from("/tmp/harbor-test/harbor.db"));
        assert_eq!(config.retry_max_attempts, 1);
        assert_eq!(config.retention.history_max_entries, 5000);
    }

    #[test]
    fn test_default_dirs_follow_platform_locations() {
        let data_dir = Config::data_dir();
        if let Some(base) = dirs::data_local_dir() {
            assert_eq!(data_dir, base.join("Harbor"));
        }

        let config = Config::new(data_dir.clone());
        match dirs::download_dir() {
            Some(downloads) => assert_eq!(config.download_dir, downloads),
            None => assert!(config.download_dir.ends_with("Downloads")),
        }
        assert_eq!(config.database_path, data_dir.join("harbor.db"));
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harbor.json");
        std::fs::write(
            &path,
            r#"{"homepage": "https://start.test/", "retention": {"max_age_days": 7}}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.homepage, "https://start.test/");
        assert_eq!(config.retention.max_age_days, 7);
        assert_eq!(config.retention.download_max_entries, 500);
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harbor.json");
        std::fs::write(&path, "retry = 3").unwrap();

        assert!(matches!(Config::load(&path), Err(CoreError::Config(_))));
        assert!(matches!(
            Config::load(dir.path().join("missing.json")),
            Err(CoreError::Config(_))
        ));
    }
}
