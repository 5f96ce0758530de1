//! Server settings read from the environment

use servana_core::{ServanaError, ServanaResult};
use std::env;
use std::path::PathBuf;

const DEFAULT_CACHE_DIR: &str = ".cache";
const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory holding one database per cache namespace
    pub cache_dir: PathBuf,
    /// Realm list, defaults to `<cache_dir>/realms.csv`
    pub realms_csv: PathBuf,
    pub port: u16,
}

impl ServerConfig {
    /// Load from CACHE_DIR, REALMS_CSV and SERVER_PORT
    pub fn from_env() -> ServanaResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> ServanaResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cache_dir = lookup("CACHE_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR));

        let realms_csv = lookup("REALMS_CSV")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| cache_dir.join("realms.csv"));

        let port = match lookup("SERVER_PORT") {
            Some(raw) => raw.parse().map_err(|_| {
                ServanaError::config(format!("SERVER_PORT is not a valid port: {}", raw))
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            cache_dir,
            realms_csv,
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();

        assert_eq!(config.cache_dir, PathBuf::from(".cache"));
        assert_eq!(config.realms_csv, PathBuf::from(".cache/realms.csv"));
        assert_eq!(config.port, 3001);
    }

    #[test]
    fn test_realm_list_follows_cache_dir() {
        let config = ServerConfig::from_lookup(|key| match key {
            "CACHE_DIR" => Some("/var/lib/servana".to_string()),
            "SERVER_PORT" => Some("8080".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.realms_csv, PathBuf::from("/var/lib/servana/realms.csv"));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_bad_port_is_config_error() {
        let err = ServerConfig::from_lookup(|key| {
            (key == "SERVER_PORT").then(|| "http".to_string())
        })
        .unwrap_err();

        assert!(matches!(err, ServanaError::Config(_)));
    }
}
