use std::env;
use std::path::PathBuf;
use std::time::Duration;

use image_optimizer_core::ConfigError;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// HTTP-side settings, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub app_env: String,
    pub api_key: String,
    /// Honoured only in development.
    pub skip_auth: bool,
    pub storage_path: PathBuf,
    pub retention_days: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            app_env: "development".into(),
            api_key: "default-api-key-for-development".into(),
            skip_auth: false,
            storage_path: PathBuf::from("./uploads"),
            retention_days: 3,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `PORT`, `APP_ENV`, `API_KEY`, `SKIP_AUTH`,
    /// `STORAGE_PATH` and `STORAGE_RETENTION_DAYS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parse = |name: &'static str| -> Result<Option<u64>, ConfigError> {
            match lookup(name) {
                None => Ok(None),
                Some(value) => value
                    .trim()
                    .parse()
                    .map(Some)
                    .map_err(|_| ConfigError::Invalid { name, value }),
            }
        };

        let port = match parse("PORT")? {
            Some(port) => u16::try_from(port).map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: port.to_string(),
            })?,
            None => defaults.port,
        };

        Ok(Self {
            port,
            app_env: lookup("APP_ENV").unwrap_or(defaults.app_env),
            api_key: lookup("API_KEY").filter(|k| !k.is_empty()).unwrap_or(defaults.api_key),
            skip_auth: lookup("SKIP_AUTH").as_deref() == Some("true"),
            storage_path: lookup("STORAGE_PATH").map(PathBuf::from).unwrap_or(defaults.storage_path),
            retention_days: parse("STORAGE_RETENTION_DAYS")?.unwrap_or(defaults.retention_days),
        })
    }

    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }

    pub fn auth_disabled(&self) -> bool {
        self.is_development() && self.skip_auth
    }

    pub fn retention(&self) -> Duration {
        DAY * self.retention_days as u32
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.retention(), DAY * 3);
        assert!(config.is_development());
        assert!(!config.auth_disabled());
    }

    #[test]
    fn test_skip_auth_needs_development() {
        let dev = ServerConfig::from_lookup(lookup(&[("SKIP_AUTH", "true")])).unwrap();
        assert!(dev.auth_disabled());
        let prod = ServerConfig::from_lookup(lookup(&[("SKIP_AUTH", "true"), ("APP_ENV", "production")])).unwrap();
        assert!(!prod.auth_disabled());
    }

    #[test]
    fn test_invalid_numbers() {
        assert!(ServerConfig::from_lookup(lookup(&[("PORT", "70000")])).is_err());
        assert!(ServerConfig::from_lookup(lookup(&[("STORAGE_RETENTION_DAYS", "three")])).is_err());
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "8080"), ("STORAGE_PATH", "/tmp/x")])).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.storage_path, PathBuf::from("/tmp/x"));
    }
}
