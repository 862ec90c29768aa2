//! Replicated node
//!
//! A node is responsible for:
//! - Holding a full copy of the key-value data (store)
//! - Tracking peers and their liveness (peers)
//! - Bootstrapping from peers at startup (join)
//! - Fanning out client writes to alive peers (service)
//! - Serving clients and peers over HTTP or gRPC (http, grpc)

pub mod grpc;
pub mod http;
pub mod join;
pub mod peers;
pub mod server;
pub mod service;
pub mod store;
pub mod transport;

pub use join::{JoinProtocol, JoinReport};
pub use peers::{PeerRecord, PeerRegistry};
pub use server::Node;
pub use service::{FanoutReport, ReplicationService};
pub use store::{Snapshot, Store};
pub use transport::{SetAck, Transport};
