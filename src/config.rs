// ⚙️ Configuration - rankr.json + environment overrides

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "RANKR_CONFIG";
pub const DB_ENV: &str = "RANKR_DB";
pub const ADDR_ENV: &str = "RANKR_ADDR";
pub const DEFAULT_CONFIG_FILE: &str = "rankr.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// EnvFilter directive used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_database_path() -> PathBuf { PathBuf::from("rankings.db") }
fn default_bind_addr()     -> String { "127.0.0.1:3000".to_string() }
fn default_log_filter()    -> String { "rankr=info,tower_http=info".to_string() }

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: default_database_path(),
            bind_addr: default_bind_addr(),
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load configuration.
    /// Reads RANKR_CONFIG (or ./rankr.json when present), then applies
    /// RANKR_DB / RANKR_ADDR on top. No file at all means defaults.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var(CONFIG_ENV).ok();
        let path = explicit
            .clone()
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        let config = if Path::new(&path).exists() {
            Config::from_file(Path::new(&path))?
        } else if explicit.is_some() {
            anyhow::bail!("Config file not found: {} (set by {})", path, CONFIG_ENV);
        } else {
            Config::default()
        };

        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Config::from_json(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content)?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup` (blank values are ignored)
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(db) = set(DB_ENV) {
            self.database_path = PathBuf::from(db);
        }
        if let Some(addr) = set(ADDR_ENV) {
            self.bind_addr = addr;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = Config::from_json(r#"{"bind_addr": "0.0.0.0:8080"}"#).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.database_path, PathBuf::from("rankings.db"));
        assert_eq!(config.log_filter, default_log_filter());

        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(Config::from_json("{ database_path: ").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [(DB_ENV, "/tmp/r.db"), (ADDR_ENV, "  ")].into_iter().collect();
        let config = Config::default().with_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.database_path, PathBuf::from("/tmp/r.db"));
        // blank override keeps the configured value
        assert_eq!(config.bind_addr, default_bind_addr());
    }
}
