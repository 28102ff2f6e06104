//! Runtime configuration.
//!
//! Settings come from the environment (a `.env` file is honoured by `main`):
//!
//! - `CATALOG_BUNDLE`: path of the connection bundle.
//! - `CATALOG_USERNAME` / `CATALOG_PASSWORD`: store credentials. For DynamoDB
//!   these are the access key id and secret access key.
//! - `CATALOG_KEYSPACE`: keyspace the tables live in (default `catalog`).
//! - `CATALOG_LOAD_WIDTH`: bulk-load worker width (default 250).
//! - `CATALOG_LOAD_TIMEOUT_SECS`: bound on waiting for a load (default 3600).
//!
//! A connection bundle is a JSON document naming the backend:
//!
//! ```json
//! {"backend": "dynamodb", "region": "eu-west-1"}
//! {"backend": "dynamodb", "endpoint": "http://localhost:8000"}
//! {"backend": "memory"}
//! ```
//!
//! The `memory` backend is for tests and offline use only. Its data lives in
//! the session's driver and is gone once the session is closed; a later
//! `connect` starts from an empty store.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use tokio::time::Duration;

use crate::catalog::{CatalogError, Result};

pub const DEFAULT_KEYSPACE: &str = "catalog";
pub const DEFAULT_LOAD_WIDTH: usize = 250;
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Where and how to reach the store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum Bundle {
    Dynamodb {
        region: Option<String>,
        endpoint: Option<String>,
    },
    /// In-process store, discarded on close.
    Memory,
}

impl Bundle {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::BundleIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CatalogError::BundleFormat {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Bulk-load tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Maximum number of records in flight.
    pub width: usize,
    /// How long a load waits for in-flight records after EOF.
    pub wait_timeout: Duration,
    pub item_progress_every: usize,
    pub review_progress_every: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_LOAD_WIDTH,
            wait_timeout: DEFAULT_LOAD_TIMEOUT,
            item_progress_every: 1_000,
            review_progress_every: 10_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub bundle: Option<PathBuf>,
    pub credentials: Credentials,
    pub keyspace: String,
    pub loader: LoaderConfig,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut loader = LoaderConfig::default();
        if let Some(width) = parse_var::<usize>(&lookup, "CATALOG_LOAD_WIDTH")? {
            if width == 0 {
                return Err(CatalogError::Config {
                    name: "CATALOG_LOAD_WIDTH",
                    message: "must be at least 1".to_string(),
                });
            }
            loader.width = width;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "CATALOG_LOAD_TIMEOUT_SECS")? {
            loader.wait_timeout = Duration::from_secs(secs);
        }

        Ok(Self {
            bundle: lookup("CATALOG_BUNDLE").map(PathBuf::from),
            credentials: Credentials::new(
                lookup("CATALOG_USERNAME").unwrap_or_default(),
                lookup("CATALOG_PASSWORD").unwrap_or_default(),
            ),
            keyspace: lookup("CATALOG_KEYSPACE").unwrap_or_else(|| DEFAULT_KEYSPACE.to_string()),
            loader,
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    lookup(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| CatalogError::Config {
                name,
                message: format!("{raw:?}: {e}"),
            })
        })
        .transpose()
}
