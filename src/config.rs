use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// SQLite connection string
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_countries_api_url")]
    pub countries_api_url: String,

    #[serde(default = "default_exchange_rate_api_url")]
    pub exchange_rate_api_url: String,

    /// Directory holding the generated summary image
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_database_url() -> String {
    "sqlite:countries.db?mode=rwc".to_string()
}

fn default_countries_api_url() -> String {
    "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies"
        .to_string()
}

fn default_exchange_rate_api_url() -> String {
    "https://open.er-api.com/v6/latest/USD".to_string()
}

fn default_cache_dir() -> String {
    "cache".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            database_url: default_database_url(),
            countries_api_url: default_countries_api_url(),
            exchange_rate_api_url: default_exchange_rate_api_url(),
            cache_dir: default_cache_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults
    /// when the file does not exist, then apply environment overrides.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let mut config = if Path::new(path).exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path, e))?;
            toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("HOST") {
            self.host = v;
        }
        if let Ok(v) = std::env::var("PORT") {
            match v.parse() {
                Ok(port) => self.port = port,
                // Config loads before logging is initialized
                Err(_) => eprintln!("Ignoring invalid PORT value '{}'", v),
            }
        }
        if let Ok(v) = std::env::var("DATABASE_URL") {
            self.database_url = v;
        }
        if let Ok(v) = std::env::var("COUNTRIES_API_URL") {
            self.countries_api_url = v;
        }
        if let Ok(v) = std::env::var("EXCHANGE_RATE_API_URL") {
            self.exchange_rate_api_url = v;
        }
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.cache_dir, "cache");
        assert!(config.database_url.starts_with("sqlite:"));
        assert_eq!(config.server_address(), "0.0.0.0:8000");
    }

    #[test]
    fn test_partial_toml_uses_defaults_for_the_rest() {
        let config: Config = toml::from_str("port = 9000\nlog_level = \"debug\"").unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.host, "0.0.0.0");
        assert!(config.countries_api_url.contains("restcountries.com"));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load("definitely-not-a-config.toml").unwrap();
        assert_eq!(config.port, default_port());
    }
}
