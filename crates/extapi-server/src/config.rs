use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use extapi_bulk::BatchConfig;

use crate::error::{ServerError, ServerResult};

/// Default request body limit (1 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Largest accepted request body, in bytes.
    pub body_limit: usize,
    /// Seed file for the in-memory record store.
    pub fixture: Option<PathBuf>,
    pub batch: BatchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 3000)),
            body_limit: DEFAULT_BODY_LIMIT,
            fixture: None,
            batch: BatchConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ServerResult<Self> {
        toml::from_str(content).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }
}
