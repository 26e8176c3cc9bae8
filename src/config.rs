use std::env;
use std::path::PathBuf;

use thiserror::Error;

use crate::claims::{Validity, DEFAULT_VALIDITY_SECS};

pub const KEY_ID_VAR: &str = "APPLE_KEY_ID";
pub const TEAM_ID_VAR: &str = "APPLE_TEAM_ID";
pub const CLIENT_ID_VAR: &str = "APPLE_CLIENT_ID";
pub const KEY_FILE_VAR: &str = "APPLE_KEY_FILE";
pub const VALIDITY_VAR: &str = "APPLE_SECRET_VALIDITY_SECS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("APPLE_SECRET_VALIDITY_SECS must be between 1 and 3155760000 seconds, got {0:?}")]
    InvalidValidity(String),
}

/// Startup values for the generator. Every field is optional and can be set
/// later from the menu; the validity falls back to six months.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub key_id: Option<String>,
    pub team_id: Option<String>,
    pub client_id: Option<String>,
    pub key_file: Option<PathBuf>,
    pub validity: Validity,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from any variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let validity = match get(VALIDITY_VAR) {
            Some(raw) => parse_validity(&raw)?,
            None => Validity::DEFAULT,
        };

        if validity.as_secs() > DEFAULT_VALIDITY_SECS {
            tracing::warn!(
                validity_secs = validity.as_secs(),
                max_secs = DEFAULT_VALIDITY_SECS,
                "Client secret lifetime exceeds the six month maximum Apple accepts"
            );
        }

        Ok(Self {
            key_id: get(KEY_ID_VAR),
            team_id: get(TEAM_ID_VAR),
            client_id: get(CLIENT_ID_VAR),
            key_file: get(KEY_FILE_VAR).map(PathBuf::from),
            validity,
        })
    }
}

fn parse_validity(raw: &str) -> Result<Validity, ConfigError> {
    raw.parse::<u64>()
        .ok()
        .and_then(Validity::from_secs)
        .ok_or_else(|| ConfigError::InvalidValidity(raw.to_string()))
}
