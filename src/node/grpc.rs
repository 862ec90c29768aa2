//! gRPC transport
//!
//! Same operations as the HTTP endpoints, over the `peerkv.Replication`
//! service. Peer updates are `Set` calls with `broadcast = false`.

use crate::common::{Error, PeerAddress};
use crate::node::service::ReplicationService;
use crate::node::store::Snapshot;
use crate::node::transport::{SetAck, Transport};
use crate::proto::replication_client::ReplicationClient;
use crate::proto::replication_server::{Replication, ReplicationServer};
use crate::proto::*;
use std::sync::Arc;
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Request, Response, Status};

/// ReplicationGrpcService serves the replication API to clients and peers.
pub struct ReplicationGrpcService {
    service: Arc<ReplicationService>,
}

impl ReplicationGrpcService {
    pub fn new(service: Arc<ReplicationService>) -> Self {
        Self { service }
    }

    /// Converts this service into a gRPC server instance.
    pub fn into_server(self) -> ReplicationServer<Self> {
        ReplicationServer::new(self)
    }
}

#[tonic::async_trait]
impl Replication for ReplicationGrpcService {
    async fn get(&self, req: Request<GetRequest>) -> Result<Response<GetReply>, Status> {
        let key = req.into_inner().key;
        let value = self.service.get(&key).map_err(|e| e.to_grpc_status())?;
        Ok(Response::new(GetReply {
            found: value.is_some(),
            value: value.unwrap_or_default(),
        }))
    }

    async fn set(&self, req: Request<SetRequest>) -> Result<Response<SetReply>, Status> {
        let SetRequest {
            key,
            value,
            broadcast,
        } = req.into_inner();
        let ack = self
            .service
            .set(&key, &value, broadcast)
            .await
            .map_err(|e| e.to_grpc_status())?
            .ack();
        Ok(Response::new(SetReply {
            value,
            replicated_to: ack.replicated_to,
            failed: ack.failed,
        }))
    }

    async fn list(&self, _req: Request<Empty>) -> Result<Response<StoreReply>, Status> {
        Ok(Response::new(StoreReply {
            store: self.service.list().into_iter().collect(),
        }))
    }

    async fn peer_snapshot(&self, _req: Request<Empty>) -> Result<Response<StoreReply>, Status> {
        Ok(Response::new(StoreReply {
            store: self.service.list().into_iter().collect(),
        }))
    }

    async fn register_peer(
        &self,
        req: Request<RegisterRequest>,
    ) -> Result<Response<StoreReply>, Status> {
        let address: PeerAddress = req
            .into_inner()
            .address
            .parse()
            .map_err(|e: Error| e.to_grpc_status())?;
        let snapshot = self.service.register_peer(address);
        Ok(Response::new(StoreReply {
            store: snapshot.into_iter().collect(),
        }))
    }
}

/// [`Transport`] over the gRPC service. Each call opens its own channel.
pub struct GrpcTransport {
    timeout: Duration,
}

impl GrpcTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn connect(&self, node: &PeerAddress) -> crate::Result<ReplicationClient<Channel>> {
        let endpoint = Endpoint::from_shared(node.http_url())
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", node, e)))?
            .connect_timeout(self.timeout)
            .timeout(self.timeout);
        let channel = endpoint.connect().await.map_err(|e| Error::PeerUnreachable {
            peer: node.to_string(),
            reason: e.to_string(),
        })?;
        Ok(ReplicationClient::new(channel))
    }

    fn status_error(&self, node: &PeerAddress, status: Status) -> Error {
        match status.code() {
            Code::DeadlineExceeded | Code::Cancelled => Error::PeerTimeout {
                peer: node.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            },
            Code::Unavailable => Error::PeerUnreachable {
                peer: node.to_string(),
                reason: status.message().to_string(),
            },
            _ => Error::Grpc(status),
        }
    }
}

#[tonic::async_trait]
impl Transport for GrpcTransport {
    async fn get(&self, node: &PeerAddress, key: &str) -> crate::Result<Option<String>> {
        let mut client = self.connect(node).await?;
        let reply = client
            .get(GetRequest {
                key: key.to_string(),
            })
            .await
            .map_err(|s| self.status_error(node, s))?
            .into_inner();
        Ok(reply.found.then_some(reply.value))
    }

    async fn set(&self, node: &PeerAddress, key: &str, value: &str) -> crate::Result<SetAck> {
        let mut client = self.connect(node).await?;
        let reply = client
            .set(SetRequest {
                key: key.to_string(),
                value: value.to_string(),
                broadcast: true,
            })
            .await
            .map_err(|s| self.status_error(node, s))?
            .into_inner();
        Ok(SetAck {
            replicated_to: reply.replicated_to,
            failed: reply.failed,
        })
    }

    async fn list(&self, node: &PeerAddress) -> crate::Result<Snapshot> {
        let mut client = self.connect(node).await?;
        let reply = client
            .list(Empty {})
            .await
            .map_err(|s| self.status_error(node, s))?
            .into_inner();
        Ok(reply.store.into_iter().collect())
    }

    async fn peer_snapshot(&self, node: &PeerAddress) -> crate::Result<Snapshot> {
        let mut client = self.connect(node).await?;
        let reply = client
            .peer_snapshot(Empty {})
            .await
            .map_err(|s| self.status_error(node, s))?
            .into_inner();
        Ok(reply.store.into_iter().collect())
    }

    async fn register_peer(
        &self,
        node: &PeerAddress,
        local: &PeerAddress,
    ) -> crate::Result<Snapshot> {
        let mut client = self.connect(node).await?;
        let reply = client
            .register_peer(RegisterRequest {
                address: local.to_string(),
            })
            .await
            .map_err(|s| self.status_error(node, s))?
            .into_inner();
        Ok(reply.store.into_iter().collect())
    }

    async fn peer_set(&self, node: &PeerAddress, key: &str, value: &str) -> crate::Result<()> {
        let mut client = self.connect(node).await?;
        client
            .set(SetRequest {
                key: key.to_string(),
                value: value.to_string(),
                broadcast: false,
            })
            .await
            .map_err(|s| self.status_error(node, s))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::peers::PeerRegistry;
    use crate::node::store::Store;
    use tokio_stream::wrappers::TcpListenerStream;

    async fn spawn_node() -> (PeerAddress, Arc<ReplicationService>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let local = PeerAddress::advertised(listener.local_addr().unwrap()).unwrap();
        let registry = Arc::new(PeerRegistry::new(local.clone()));
        let service = Arc::new(ReplicationService::new(
            Arc::new(Store::new()),
            registry,
            Arc::new(GrpcTransport::new(Duration::from_millis(500))),
        ));
        let grpc = ReplicationGrpcService::new(service.clone());
        tokio::spawn(async move {
            tonic::transport::Server::builder()
                .add_service(grpc.into_server())
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await
                .unwrap();
        });
        (local, service)
    }

    #[tokio::test]
    async fn test_get_set_list() {
        let (addr, _) = spawn_node().await;
        let client = GrpcTransport::new(Duration::from_secs(1));

        assert_eq!(client.get(&addr, "a").await.unwrap(), None);
        client.set(&addr, "a", "1").await.unwrap();
        assert_eq!(client.get(&addr, "a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(client.list(&addr).await.unwrap()["a"], "1");
    }

    #[tokio::test]
    async fn test_invalid_key_is_invalid_argument() {
        let (addr, service) = spawn_node().await;
        let client = GrpcTransport::new(Duration::from_secs(1));

        let err = client.set(&addr, "not valid", "1").await.unwrap_err();
        match err {
            Error::Grpc(status) => assert_eq!(status.code(), Code::InvalidArgument),
            other => panic!("unexpected error: {}", other),
        }
        assert!(service.store().is_empty());
    }

    #[tokio::test]
    async fn test_register_and_peer_set() {
        let (addr, service) = spawn_node().await;
        let client = GrpcTransport::new(Duration::from_secs(1));
        service.store().set("x", "1");

        let joiner: PeerAddress = "127.0.0.1:65002".parse().unwrap();
        let snapshot = client.register_peer(&addr, &joiner).await.unwrap();
        assert_eq!(snapshot["x"], "1");
        assert!(service.peers().is_alive(&joiner));

        client.peer_set(&addr, "y", "2").await.unwrap();
        assert_eq!(service.store().get("y").as_deref(), Some("2"));
        assert_eq!(client.peer_snapshot(&addr).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_register_rejects_bad_address() {
        let (addr, _) = spawn_node().await;
        let mut client = GrpcTransport::new(Duration::from_secs(1))
            .connect(&addr)
            .await
            .unwrap();
        let status = client
            .register_peer(RegisterRequest {
                address: "nonsense".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
    }
}
