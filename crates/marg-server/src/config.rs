use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use marg_types::Identity;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

pub const DEFAULT_PORT: u16 = 8080;

/// Runtime settings for `MarginaliaServer`, loadable from TOML.
///
/// Every key is optional:
///
/// ```toml
/// bind_addr = "0.0.0.0:8080"
/// branch = "main"
///
/// [committer]
/// name = "annotator"
/// email = "annotator@example.com"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Branch to serve; the repository's default branch when unset.
    pub branch: Option<String>,
    /// Author and committer recorded on every write.
    pub committer: Identity,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            branch: None,
            committer: Identity::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text).map_err(|e| match e {
            ServerError::Config(msg) => ServerError::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    pub fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }
}
