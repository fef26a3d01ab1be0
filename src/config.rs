use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Preferred backend base URL, wins over everything else when set.
    pub primary_api_url: Option<String>,
    /// Second choice backend base URL.
    pub secondary_api_url: Option<String>,
    /// The runtime origin of the caller; used as last resort before the
    /// public fallback kicks in.
    pub origin: Option<String>,
    pub cache_db_url: String,
    pub default_base: String,
}

impl Default for Config {
    fn default() -> Self {
        // Try to read from config.toml first
        if let Ok(config) = load_config() {
            return config;
        }

        Self {
            primary_api_url: None,
            secondary_api_url: None,
            origin: None,
            cache_db_url: "sqlite:rates_cache.db".to_string(),
            default_base: "USD".to_string(),
        }
    }
}

impl Config {
    /// Environment variables win over the config file so a deployment can
    /// point at a different backend without editing config.toml.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(url) = env::var("RATEFEED_PRIMARY_URL") {
            if !url.trim().is_empty() {
                self.primary_api_url = Some(url);
            }
        }
        if let Ok(url) = env::var("RATEFEED_SECONDARY_URL") {
            if !url.trim().is_empty() {
                self.secondary_api_url = Some(url);
            }
        }
        if let Ok(url) = env::var("RATEFEED_CACHE_DB") {
            if !url.trim().is_empty() {
                self.cache_db_url = url;
            }
        }
        self
    }
}

fn get_config_path() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("config.toml");
    path
}

pub fn load_config() -> anyhow::Result<Config> {
    load_config_from(&get_config_path())
}

fn load_config_from(path: &Path) -> anyhow::Result<Config> {
    let config_str = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&config_str)?;
    Ok(config)
}

pub fn save_config(config: &Config) -> anyhow::Result<()> {
    save_config_to(config, &get_config_path())
}

fn save_config_to(config: &Config, path: &Path) -> anyhow::Result<()> {
    let config_str = toml::to_string_pretty(config)?;
    fs::write(path, config_str)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_toml_roundtrip() {
        let config = Config {
            primary_api_url: Some("https://rates.example.com".to_string()),
            secondary_api_url: None,
            origin: Some("https://calc.example.com".to_string()),
            cache_db_url: "sqlite::memory:".to_string(),
            default_base: "EUR".to_string(),
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.primary_api_url, config.primary_api_url);
        assert_eq!(back.secondary_api_url, None);
        assert_eq!(back.default_base, "EUR");
    }

    #[test]
    fn test_save_then_load_config_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");

        let config = Config {
            primary_api_url: Some("https://rates.example.com".to_string()),
            secondary_api_url: None,
            origin: None,
            cache_db_url: "sqlite:rates_cache.db".to_string(),
            default_base: "USD".to_string(),
        };
        save_config_to(&config, &path)?;

        let back = load_config_from(&path)?;
        assert_eq!(
            back.primary_api_url.as_deref(),
            Some("https://rates.example.com")
        );
        assert_eq!(back.secondary_api_url, None);
        assert_eq!(back.cache_db_url, "sqlite:rates_cache.db");
        Ok(())
    }
}
