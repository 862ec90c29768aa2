//! Peer registry
//!
//! Known peers and whether they are still worth contacting. A peer flips to
//! dead on its first failed call and stays dead: there is no re-probing and
//! records are never removed. The registry has its own lock, independent of
//! the store's.

use crate::common::PeerAddress;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    pub address: PeerAddress,
    pub alive: bool,
}

pub struct PeerRegistry {
    /// This node's own address, never recorded as a peer
    local: PeerAddress,
    peers: RwLock<HashMap<String, PeerRecord>>,
}

impl PeerRegistry {
    pub fn new(local: PeerAddress) -> Self {
        Self {
            local,
            peers: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, PeerRecord>> {
        self.peers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, PeerRecord>> {
        self.peers.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn local(&self) -> &PeerAddress {
        &self.local
    }

    /// Seed the registry with the startup peer list, all alive.
    pub fn configure(&self, addresses: impl IntoIterator<Item = PeerAddress>) {
        let mut peers = self.write();
        for address in addresses {
            if address == self.local {
                tracing::debug!("Ignoring own address {} in peer list", address);
                continue;
            }
            peers.insert(
                address.to_string(),
                PeerRecord {
                    address,
                    alive: true,
                },
            );
        }
    }

    /// Add a peer that announced itself. Known peers keep their liveness.
    ///
    /// Returns true if the peer was not known before.
    pub fn register(&self, address: PeerAddress) -> bool {
        if address == self.local {
            return false;
        }
        let mut peers = self.write();
        let key = address.to_string();
        if peers.contains_key(&key) {
            return false;
        }
        peers.insert(
            key,
            PeerRecord {
                address,
                alive: true,
            },
        );
        true
    }

    /// Stop contacting `address`. Returns true if it was alive until now.
    pub fn mark_dead(&self, address: &PeerAddress) -> bool {
        match self.write().get_mut(&address.to_string()) {
            Some(record) if record.alive => {
                record.alive = false;
                true
            }
            _ => false,
        }
    }

    pub fn is_alive(&self, address: &PeerAddress) -> bool {
        self.read()
            .get(&address.to_string())
            .is_some_and(|r| r.alive)
    }

    pub fn alive_snapshot(&self) -> Vec<PeerAddress> {
        self.read()
            .values()
            .filter(|r| r.alive)
            .map(|r| r.address.clone())
            .collect()
    }

    /// Every record, dead ones included, ordered by address.
    pub fn records(&self) -> Vec<PeerRecord> {
        let mut records: Vec<PeerRecord> = self.read().values().cloned().collect();
        records.sort_by(|a, b| a.address.cmp(&b.address));
        records
    }
}
