//! Replication service
//!
//! The logical operations both transports expose, and the fan-out of client
//! writes. Peer writes (`broadcast == false`) are applied locally only, which
//! is what keeps a write from bouncing between nodes forever.

use crate::common::{validate_key, validate_value, PeerAddress, Result};
use crate::node::peers::{PeerRecord, PeerRegistry};
use crate::node::store::{Snapshot, Store};
use crate::node::transport::{SetAck, Transport};
use futures_util::future::join_all;
use std::sync::Arc;

/// Outcome of propagating one write to the alive peers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanoutReport {
    pub delivered: Vec<PeerAddress>,
    pub failed: Vec<PeerAddress>,
}

impl FanoutReport {
    pub fn ack(&self) -> SetAck {
        SetAck {
            replicated_to: self.delivered.len() as u32,
            failed: self.failed.len() as u32,
        }
    }
}

pub struct ReplicationService {
    store: Arc<Store>,
    peers: Arc<PeerRegistry>,
    transport: Arc<dyn Transport>,
}

impl ReplicationService {
    pub fn new(store: Arc<Store>, peers: Arc<PeerRegistry>, transport: Arc<dyn Transport>) -> Self {
        Self {
            store,
            peers,
            transport,
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn peers(&self) -> &Arc<PeerRegistry> {
        &self.peers
    }

    pub fn local_address(&self) -> &PeerAddress {
        self.peers.local()
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let value = self.store.get(key);
        match &value {
            Some(v) => tracing::debug!("GET {} = {}", key, v),
            None => tracing::debug!("GET {}: undefined", key),
        }
        Ok(value)
    }

    /// Apply a write. Client writes (`broadcast`) are then pushed to every alive peer.
    ///
    /// Peer failures never fail the write itself; they only show up in the report.
    pub async fn set(&self, key: &str, value: &str, broadcast: bool) -> Result<FanoutReport> {
        validate_key(key)?;
        validate_value(value)?;

        self.store.set(key, value);

        if !broadcast {
            tracing::debug!("Peer update applied: {} = {}", key, value);
            return Ok(FanoutReport::default());
        }

        tracing::debug!("SET {} = {}", key, value);
        Ok(self.fan_out(key, value).await)
    }

    /// Send `key = value` to every alive peer concurrently.
    ///
    /// Each call is bounded by the transport's timeout. A failing peer is marked
    /// dead and skipped from then on; the write is not retried or queued.
    pub async fn fan_out(&self, key: &str, value: &str) -> FanoutReport {
        let targets = self.peers.alive_snapshot();
        if targets.is_empty() {
            return FanoutReport::default();
        }

        let calls = targets.iter().map(|peer| async move {
            let res = self.transport.peer_set(peer, key, value).await;
            (peer, res)
        });

        let mut report = FanoutReport::default();
        for (peer, res) in join_all(calls).await {
            match res {
                Ok(()) => {
                    tracing::debug!("Replicated {} to {}", key, peer);
                    report.delivered.push(peer.clone());
                }
                Err(e) => {
                    if self.peers.mark_dead(peer) {
                        tracing::warn!("Peer {} marked dead after failed update: {}", peer, e);
                    }
                    report.failed.push(peer.clone());
                }
            }
        }
        report
    }

    pub fn list(&self) -> Snapshot {
        self.store.snapshot()
    }

    /// Record an announcing node and hand it our current state.
    pub fn register_peer(&self, address: PeerAddress) -> Snapshot {
        if self.peers.register(address.clone()) {
            tracing::info!("Registered new peer {}", address);
        } else {
            tracing::debug!("Peer {} already known", address);
        }
        self.store.snapshot()
    }

    pub fn peer_records(&self) -> Vec<PeerRecord> {
        self.peers.records()
    }
}
