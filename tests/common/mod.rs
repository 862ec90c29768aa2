//! Helpers to run real nodes on loopback ports

#![allow(dead_code)]

use peerkv::node::ReplicationService;
use peerkv::{Node, NodeConfig, PeerAddress, TransportKind};
use std::sync::Arc;
use tokio::sync::oneshot;

pub struct TestNode {
    pub addr: PeerAddress,
    pub service: Arc<ReplicationService>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestNode {
    /// Start a node on an ephemeral port, join `peers`, and serve in the background.
    pub async fn start(transport: TransportKind, peers: &[&PeerAddress]) -> Self {
        let config = NodeConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            peers: peers.iter().map(|p| (*p).clone()).collect(),
            transport,
            peer_timeout_ms: 500,
            ..Default::default()
        };
        let node = Node::start(config).await.unwrap();
        let addr = node.local_address().clone();
        let service = node.service();

        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            node.serve_with_shutdown(async {
                let _ = rx.await;
            })
            .await
            .unwrap();
        });

        Self {
            addr,
            service,
            shutdown: Some(tx),
            handle,
        }
    }

    /// Stop serving and wait until the listener is closed.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.handle.await;
    }
}

/// An address nobody listens on.
pub fn dead_address() -> PeerAddress {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    PeerAddress::advertised(listener.local_addr().unwrap()).unwrap()
}
