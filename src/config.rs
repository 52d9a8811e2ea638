use std::{env, time::Duration};
use thiserror::Error;

use crate::friendship_store::DEFAULT_STORE_TIMEOUT;

const DEFAULT_KEYSPACE: &str = "chat";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Must set {0} environment variable")]
    Missing(&'static str),
    #[error("{name} environment variable could not be parsed: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, PartialEq)]
pub enum StoreBackend {
    Scylla {
        url: String,
        username: String,
        password: String,
        keyspace: String,
    },
    Memory,
}

#[derive(Debug, PartialEq)]
pub struct Config {
    pub port: u16,
    pub access_token_secret: String,
    pub store_backend: StoreBackend,
    pub store_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        let port = required("PORT")?;
        let port = port.parse().map_err(|_| ConfigError::Invalid {
            name: "PORT",
            value: port,
        })?;

        let store_backend = match var("FRIENDSHIP_STORE").as_deref() {
            None | Some("scylla") => StoreBackend::Scylla {
                url: required("SCYLLA_URL")?,
                username: required("SCYLLA_USERNAME")?,
                password: required("SCYLLA_PASSWORD")?,
                keyspace: var("SCYLLA_KEYSPACE").unwrap_or_else(|| DEFAULT_KEYSPACE.to_owned()),
            },
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "FRIENDSHIP_STORE",
                    value: other.to_owned(),
                })
            }
        };

        let store_timeout = match var("STORE_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(secs.parse().map_err(|_| ConfigError::Invalid {
                name: "STORE_TIMEOUT_SECS",
                value: secs,
            })?),
            None => DEFAULT_STORE_TIMEOUT,
        };

        Ok(Self {
            port,
            access_token_secret: required("ACCESS_TOKEN_SECRET")?,
            store_backend,
            store_timeout,
        })
    }
}
