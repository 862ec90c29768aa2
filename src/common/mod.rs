//! Common utilities and types shared across peerkv

pub mod address;
pub mod config;
pub mod error;
pub mod tracing_middleware;
pub mod utils;

pub use address::PeerAddress;
pub use config::{NodeConfig, TransportKind};
pub use error::{Error, Result};
pub use utils::{parse_assignment, required, validate_key, validate_value};
