// Runtime configuration loaded from the environment

use anyhow::{Context, Result};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self {
            host: try_load("RECIPE_HOST", "0.0.0.0")?,
            port: try_load("RECIPE_PORT", "3000")?,
            database_path: try_load("RECIPE_DB_PATH", "recipes.db")?,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Invalid {key} value: {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_unset() {
        let port: u16 = try_load("RECIPE_TEST_UNSET_PORT", "3000").unwrap();
        assert_eq!(port, 3000);
    }

    #[test]
    fn test_invalid_value_is_error() {
        env::set_var("RECIPE_TEST_BAD_PORT", "not-a-port");
        let port: Result<u16> = try_load("RECIPE_TEST_BAD_PORT", "3000");
        assert!(port.is_err());
    }

    #[test]
    fn test_address() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_path: PathBuf::from("test.db"),
        };
        assert_eq!(config.address(), "127.0.0.1:8080");
    }
}
