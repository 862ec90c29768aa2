//! # peerkv
//!
//! A small replicated key-value store:
//! - Every node holds a full in-memory copy of a string → string map
//! - Client writes are applied locally, then broadcast to every alive peer
//! - New nodes announce themselves to their peers and pull their snapshots
//! - Unreachable peers are marked dead and never contacted again
//! - HTTP (form-encoded) or gRPC between nodes and clients
//!
//! Consistency is deliberately weak: writes are last-applied-wins with no
//! ordering, so concurrent writes to one key can leave nodes disagreeing.
//!
//! ## Architecture
//!
//! ```text
//!   client ──Set──▶ ┌──────────┐ ──PeerSet──▶ ┌──────────┐
//!                   │  Node A  │              │  Node B  │  (no re-broadcast)
//!                   └──────────┘ ──PeerSet──▶ ┌──────────┐
//!                                             │  Node C  │
//!                                             └──────────┘
//! ```
//!
//! ## Usage
//!
//! ### Start nodes
//! ```bash
//! peerkv-node serve --listen 127.0.0.1:4000
//! peerkv-node serve --listen 127.0.0.1:4001 --peers 127.0.0.1:4000
//! ```
//!
//! ### Use the CLI
//! ```bash
//! peerkv --node 127.0.0.1:4000 set color blue
//! peerkv --node 127.0.0.1:4001 get color
//! peerkv --node 127.0.0.1:4001 list
//! ```

pub mod client;
pub mod common;
pub mod node;

// Re-export commonly used types
pub use client::Client;
pub use common::{Error, NodeConfig, PeerAddress, Result, TransportKind};
pub use node::Node;

// Generated protobuf code
pub mod proto {
    tonic::include_proto!("peerkv");
}

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
