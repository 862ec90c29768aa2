//! Client for a single node
//!
//! Inputs are validated locally so malformed keys never leave the process.

use crate::common::{validate_key, validate_value, PeerAddress, Result, TransportKind};
use crate::node::store::Snapshot;
use crate::node::transport::{self, SetAck, Transport};
use std::sync::Arc;
use std::time::Duration;

pub struct Client {
    node: PeerAddress,
    transport: Arc<dyn Transport>,
}

impl Client {
    pub fn new(node: PeerAddress, kind: TransportKind, timeout: Duration) -> Result<Self> {
        Ok(Self {
            node,
            transport: transport::for_kind(kind, timeout)?,
        })
    }

    pub fn node(&self) -> &PeerAddress {
        &self.node
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        tracing::debug!("Sending GET to {} for key {}", self.node, key);
        self.transport.get(&self.node, key).await
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<SetAck> {
        validate_key(key)?;
        validate_value(value)?;
        tracing::debug!("Sending SET to {} for key {}", self.node, key);
        self.transport.set(&self.node, key, value).await
    }

    pub async fn list(&self) -> Result<Snapshot> {
        tracing::debug!("Sending LIST to {}", self.node);
        self.transport.list(&self.node).await
    }
}
