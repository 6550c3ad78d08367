use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 1234;
pub const DEFAULT_HOST: &str = "0.0.0.0";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("PORT must be a number between 0 and 65535, got {0:?}")]
    InvalidPort(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// JSON seed file; the bundled seed is used when unset.
    pub seed_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(port) => port
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(port))?,
            None => DEFAULT_PORT,
        };
        Ok(Config {
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned()),
            port,
            seed_path: lookup("MOVIES_SEED").map(PathBuf::from),
        })
    }

    pub fn bind_addr(&self) -> (&str, u16) {
        (&self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.port, 1234);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.seed_path, None);
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("MOVIES_SEED", "/tmp/movies.json"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr(), ("127.0.0.1", 8080));
        assert_eq!(config.seed_path, Some(PathBuf::from("/tmp/movies.json")));
    }

    #[test]
    fn rejects_bad_port() {
        assert_eq!(
            config(&[("PORT", "http")]),
            Err(ConfigError::InvalidPort("http".to_owned()))
        );
        assert!(config(&[("PORT", "70000")]).is_err());
    }
}
