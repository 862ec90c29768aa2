//! Transport abstraction
//!
//! The replication core talks to other nodes only through [`Transport`]. Each
//! method is one logical operation sent to one node; a failure means the call
//! did not complete (connect error, timeout, undecodable reply, or an error
//! status from the remote side).

use crate::common::{PeerAddress, Result, TransportKind};
use crate::node::grpc::GrpcTransport;
use crate::node::http::HttpTransport;
use crate::node::store::Snapshot;
use std::sync::Arc;
use std::time::Duration;

/// Acknowledgement of a client write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetAck {
    /// Peers the write reached
    pub replicated_to: u32,
    /// Peers that failed and were marked dead
    pub failed: u32,
}

#[tonic::async_trait]
pub trait Transport: Send + Sync {
    /// Client read.
    async fn get(&self, node: &PeerAddress, key: &str) -> Result<Option<String>>;

    /// Client write; the receiving node fans it out to its peers.
    async fn set(&self, node: &PeerAddress, key: &str, value: &str) -> Result<SetAck>;

    /// Client listing of every entry.
    async fn list(&self, node: &PeerAddress) -> Result<Snapshot>;

    /// Full snapshot pulled by a joining node.
    async fn peer_snapshot(&self, node: &PeerAddress) -> Result<Snapshot>;

    /// Announce `local` to `node`; the reply carries `node`'s current snapshot.
    async fn register_peer(&self, node: &PeerAddress, local: &PeerAddress) -> Result<Snapshot>;

    /// Replicated write. The receiving node applies it without re-broadcasting.
    async fn peer_set(&self, node: &PeerAddress, key: &str, value: &str) -> Result<()>;
}

/// Build the transport matching `kind`, with `timeout` applied to every call.
pub fn for_kind(kind: TransportKind, timeout: Duration) -> Result<Arc<dyn Transport>> {
    let transport: Arc<dyn Transport> = match kind {
        TransportKind::Http => Arc::new(HttpTransport::new(timeout)?),
        TransportKind::Grpc => Arc::new(GrpcTransport::new(timeout)),
    };
    Ok(transport)
}
