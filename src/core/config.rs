use super::circuit_breaker::CircuitBreakerConfig;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct CbrProviderConfig {
    pub base_url: String,
    pub daily_path: String,
    pub catalog_path: String,
    pub timeout_ms: u64,
}

impl Default for CbrProviderConfig {
    fn default() -> Self {
        CbrProviderConfig {
            base_url: "https://www.cbr.ru".to_string(),
            daily_path: "/scripts/XML_daily.asp".to_string(),
            catalog_path: "/scripts/XML_valFull.asp".to_string(),
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct KudaGoProviderConfig {
    pub base_url: String,
    pub events_path: String,
    pub page_size: u32,
    pub max_concurrent_requests: usize,
    pub timeout_ms: u64,
}

impl Default for KudaGoProviderConfig {
    fn default() -> Self {
        KudaGoProviderConfig {
            base_url: "https://kudago.com".to_string(),
            events_path: "/public-api/v1.4/events/".to_string(),
            page_size: 100,
            max_concurrent_requests: 3,
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ProvidersConfig {
    pub cbr: CbrProviderConfig,
    pub kudago: KudaGoProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ExecutorConfig {
    pub core_threads: usize,
    pub max_threads: usize,
    pub queue_capacity: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            core_threads: 5,
            max_threads: 10,
            queue_capacity: 100,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub providers: ProvidersConfig,
    pub executor: ExecutorConfig,
    pub circuit_breaker: CircuitBreakerConfig,
}

impl AppConfig {
    /// Loads the config from the default location, or built-in defaults when
    /// no file exists there yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "eventfx", "eventfx")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
providers:
  cbr:
    base_url: "http://example.com/cbr"
  kudago:
    base_url: "http://example.com/kudago"
    page_size: 50
    max_concurrent_requests: 2
executor:
  core_threads: 2
circuit_breaker:
  failure_rate_threshold: 75.0
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.providers.cbr.base_url, "http://example.com/cbr");
        // Unset fields keep their defaults
        assert_eq!(config.providers.cbr.daily_path, "/scripts/XML_daily.asp");
        assert_eq!(config.providers.kudago.base_url, "http://example.com/kudago");
        assert_eq!(config.providers.kudago.page_size, 50);
        assert_eq!(config.providers.kudago.max_concurrent_requests, 2);
        assert_eq!(
            config.providers.kudago.events_path,
            "/public-api/v1.4/events/"
        );
        assert_eq!(config.executor.core_threads, 2);
        assert_eq!(config.executor.queue_capacity, 100);
        assert_eq!(config.circuit_breaker.failure_rate_threshold, 75.0);
        assert_eq!(config.circuit_breaker.window_size, 10);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.providers.cbr.base_url, "https://www.cbr.ru");
    }

    #[test]
    fn test_load_from_path() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("config.yaml");
        fs::write(&path, "executor:\n  max_threads: 4\n")?;

        let config = AppConfig::load_from_path(&path)?;
        assert_eq!(config.executor.max_threads, 4);

        assert!(AppConfig::load_from_path(dir.path().join("missing.yaml")).is_err());
        Ok(())
    }
}
