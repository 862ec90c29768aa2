//! Replication between real nodes over gRPC

mod common;

use common::{dead_address, TestNode};
use peerkv::{Client, PeerAddress, TransportKind};
use std::time::Duration;

fn client(node: &PeerAddress) -> Client {
    Client::new(node.clone(), TransportKind::Grpc, Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn scenario_two_nodes() {
    let x = TestNode::start(TransportKind::Grpc, &[]).await;
    client(&x.addr).set("a", "1").await.unwrap();
    assert_eq!(client(&x.addr).get("a").await.unwrap().as_deref(), Some("1"));

    let y = TestNode::start(TransportKind::Grpc, &[&x.addr]).await;
    let snapshot = client(&y.addr).list().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot["a"], "1");

    client(&y.addr).set("b", "2").await.unwrap();
    assert_eq!(client(&x.addr).get("b").await.unwrap().as_deref(), Some("2"));
    assert_eq!(x.service.store().write_count("b"), 1);
    assert_eq!(y.service.store().write_count("b"), 1);
}

#[tokio::test]
async fn unset_key_is_not_found() {
    let x = TestNode::start(TransportKind::Grpc, &[]).await;
    assert_eq!(client(&x.addr).get("nothing").await.unwrap(), None);
}

#[tokio::test]
async fn dead_peer_does_not_fail_client_write() {
    let gone = dead_address();
    let a = TestNode::start(TransportKind::Grpc, &[]).await;
    // Simulate a peer that registered and then vanished
    a.service.register_peer(gone.clone());

    let ack = client(&a.addr).set("k", "v").await.unwrap();
    assert_eq!(ack.failed, 1);
    assert!(a.service.peers().alive_snapshot().is_empty());
    assert_eq!(client(&a.addr).get("k").await.unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn unreachable_node_is_an_error() {
    let gone = dead_address();
    let err = client(&gone).get("a").await.unwrap_err();
    assert!(err.is_peer_failure());
}
