use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::storage::DurabilityMode;
use crate::storage::persistence::DEFAULT_CHECKPOINT_THRESHOLD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    File,
}

impl StorageBackend {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "memory" | "mem" | "inmemory" => Ok(Self::Memory),
            "file" | "disk" => Ok(Self::File),
            _ => Err(anyhow::anyhow!(
                "STORAGE_BACKEND must be one of: file, memory"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_backend: StorageBackend,
    pub data_dir: PathBuf,
    pub durability: DurabilityMode,
    pub checkpoint_threshold: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let host = var("APP_HOST", "0.0.0.0");

        let port = var("APP_PORT", "8080")
            .parse::<u16>()
            .context("APP_PORT must be a valid u16")?;

        let storage_backend = StorageBackend::parse(&var("STORAGE_BACKEND", "file"))?;

        let data_dir = PathBuf::from(var("DATA_DIR", "./data"));

        let durability = var("DURABILITY", "sync")
            .parse::<DurabilityMode>()
            .map_err(|e| anyhow::anyhow!("DURABILITY: {e}"))?;

        let checkpoint_threshold = var(
            "CHECKPOINT_THRESHOLD",
            &DEFAULT_CHECKPOINT_THRESHOLD.to_string(),
        )
        .parse::<usize>()
        .context("CHECKPOINT_THRESHOLD must be a positive integer")?;

        Ok(Self {
            host,
            port,
            storage_backend,
            data_dir,
            durability,
            checkpoint_threshold,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.address(), "0.0.0.0:8080");
        assert_eq!(config.storage_backend, StorageBackend::File);
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.durability, DurabilityMode::Sync);
        assert_eq!(config.checkpoint_threshold, DEFAULT_CHECKPOINT_THRESHOLD);
    }

    #[test]
    fn overrides() {
        let config = config_from(&[
            ("APP_HOST", "127.0.0.1"),
            ("APP_PORT", "3000"),
            ("STORAGE_BACKEND", "Memory"),
            ("DURABILITY", "async"),
            ("CHECKPOINT_THRESHOLD", "50"),
        ])
        .unwrap();
        assert_eq!(config.address(), "127.0.0.1:3000");
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.durability, DurabilityMode::Async);
        assert_eq!(config.checkpoint_threshold, 50);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config_from(&[("APP_PORT", "eighty")]).is_err());
        assert!(config_from(&[("STORAGE_BACKEND", "postgres")]).is_err());
        assert!(config_from(&[("DURABILITY", "sometimes")]).is_err());
    }
}
