//! Startup synchronisation
//!
//! Runs once, before the node serves anything:
//!   1. Announce: register with every configured peer. A peer that cannot be
//!      reached is marked dead and skipped for the rest of the pass.
//!   2. Pull: fetch the snapshot of every peer still alive and merge it into the
//!      local store. Peers are merged one after another, so when two peers
//!      disagree on a key the last one merged wins.

use crate::common::PeerAddress;
use crate::node::peers::PeerRegistry;
use crate::node::store::Store;
use crate::node::transport::Transport;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinReport {
    /// Peers that accepted our registration
    pub announced: Vec<PeerAddress>,
    /// Peers whose snapshot was merged
    pub synced: Vec<PeerAddress>,
    /// Peers marked dead during the join
    pub dead: Vec<PeerAddress>,
    /// Entries applied from peer snapshots
    pub merged_entries: usize,
}

pub struct JoinProtocol {
    store: Arc<Store>,
    peers: Arc<PeerRegistry>,
    transport: Arc<dyn Transport>,
}

impl JoinProtocol {
    pub fn new(store: Arc<Store>, peers: Arc<PeerRegistry>, transport: Arc<dyn Transport>) -> Self {
        Self {
            store,
            peers,
            transport,
        }
    }

    pub async fn run(&self) -> JoinReport {
        let mut report = JoinReport::default();
        let local = self.peers.local().clone();

        for peer in self.peers.alive_snapshot() {
            tracing::info!("Registering with peer {}...", peer);
            match self.transport.register_peer(&peer, &local).await {
                Ok(_) => report.announced.push(peer),
                Err(e) => {
                    tracing::warn!("Cannot contact peer {}: {}", peer, e);
                    self.peers.mark_dead(&peer);
                    report.dead.push(peer);
                }
            }
        }

        for peer in self.peers.alive_snapshot() {
            tracing::info!("Synchronizing with peer {}...", peer);
            match self.transport.peer_snapshot(&peer).await {
                Ok(snapshot) => {
                    let n = self.store.merge(snapshot);
                    tracing::debug!("Merged {} entries from {}", n, peer);
                    report.merged_entries += n;
                    report.synced.push(peer);
                }
                Err(e) => {
                    tracing::warn!("Cannot synchronize with peer {}: {}", peer, e);
                    self.peers.mark_dead(&peer);
                    report.dead.push(peer);
                }
            }
        }

        tracing::info!(
            "Initial synchronization done: {} peer(s) synced, {} dead, {} key(s) in store",
            report.synced.len(),
            report.dead.len(),
            self.store.len()
        );
        if tracing::enabled!(tracing::Level::DEBUG) {
            for (key, value) in self.store.snapshot() {
                tracing::debug!("  {} = {}", key, value);
            }
        }

        report
    }
}
