//! Configuration for peerkv nodes
//!
//! Sources, lowest priority first: built-in defaults, an optional TOML file,
//! `PEERKV_*` environment variables. The node binary applies its CLI flags on top.

use crate::common::{Error, PeerAddress, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

pub const ENV_PREFIX: &str = "PEERKV";

/// Wire protocol spoken between nodes and clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Form-encoded HTTP endpoints
    #[default]
    Http,
    /// gRPC service
    Grpc,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Http => write!(f, "http"),
            TransportKind::Grpc => write!(f, "grpc"),
        }
    }
}

/// Node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Address the listener binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Address announced to peers (defaults to the bound address)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertise_addr: Option<PeerAddress>,

    /// Peers contacted at startup
    #[serde(default)]
    pub peers: Vec<PeerAddress>,

    #[serde(default)]
    pub transport: TransportKind,

    /// Per-call timeout for every outbound peer request
    #[serde(default = "default_peer_timeout")]
    pub peer_timeout_ms: u64,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 4000))
}
fn default_peer_timeout() -> u64 {
    1000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            advertise_addr: None,
            peers: Vec::new(),
            transport: TransportKind::default(),
            peer_timeout_ms: default_peer_timeout(),
            log_level: default_log_level(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from an optional file plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("peers"),
            )
            .build()?;

        let config: NodeConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.peer_timeout_ms == 0 {
            return Err(Error::InvalidConfig("peer_timeout_ms must be > 0".into()));
        }
        Ok(())
    }

    pub fn peer_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_timeout_ms)
    }
}
