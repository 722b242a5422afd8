use crate::stats::DEFAULT_ROLLING_WINDOW;
use std::{env, num::NonZeroUsize, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("PORT must be a number between 0 and 65535, got '{0}'")]
    InvalidPort(String),

    #[error("SLEEP_ROLLING_WINDOW must be a positive integer, got '{0}'")]
    InvalidWindow(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub rolling_window: NonZeroUsize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => 8080,
        };

        let data_path = lookup("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/state.json"));

        let rolling_window = match lookup("SLEEP_ROLLING_WINDOW") {
            Some(raw) => raw
                .trim()
                .parse::<NonZeroUsize>()
                .map_err(|_| ConfigError::InvalidWindow(raw))?,
            None => DEFAULT_ROLLING_WINDOW,
        };

        Ok(Self {
            port,
            data_path,
            rolling_window,
        })
    }
}
