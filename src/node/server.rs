//! Node server

use crate::common::{NodeConfig, PeerAddress, Result, TransportKind};
use crate::node::grpc::ReplicationGrpcService;
use crate::node::http::{create_router, NodeState};
use crate::node::join::{JoinProtocol, JoinReport};
use crate::node::peers::PeerRegistry;
use crate::node::service::ReplicationService;
use crate::node::store::Store;
use crate::node::transport;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;

/// A started node: listener bound, initial synchronisation done, not yet serving.
pub struct Node {
    config: NodeConfig,
    listener: TcpListener,
    service: Arc<ReplicationService>,
    join_report: JoinReport,
}

impl Node {
    /// Bind the listener, then join the configured peers.
    ///
    /// Binding first lets `listen_addr` use port 0 while still advertising the
    /// real port. Requests arriving during the join wait in the accept backlog
    /// until [`Node::serve`] starts.
    pub async fn start(config: NodeConfig) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(config.listen_addr).await?;
        let bound = listener.local_addr()?;
        let local = match &config.advertise_addr {
            Some(addr) => addr.clone(),
            None => PeerAddress::advertised(bound)?,
        };

        tracing::info!("Starting node: {}", local);
        tracing::info!("  Listening on: {} ({})", bound, config.transport);
        tracing::info!("  Peers: {}", config.peers.len());
        tracing::info!("  Peer timeout: {} ms", config.peer_timeout_ms);

        let store = Arc::new(Store::new());
        let peers = Arc::new(PeerRegistry::new(local));
        peers.configure(config.peers.iter().cloned());
        let transport = transport::for_kind(config.transport, config.peer_timeout())?;

        let join_report = JoinProtocol::new(store.clone(), peers.clone(), transport.clone())
            .run()
            .await;

        let service = Arc::new(ReplicationService::new(store, peers, transport));

        Ok(Self {
            config,
            listener,
            service,
            join_report,
        })
    }

    pub fn local_address(&self) -> &PeerAddress {
        self.service.local_address()
    }

    pub fn bound_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn service(&self) -> Arc<ReplicationService> {
        self.service.clone()
    }

    pub fn join_report(&self) -> &JoinReport {
        &self.join_report
    }

    /// Serve until Ctrl-C.
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(shutdown_signal()).await
    }

    /// Serve until `signal` completes.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = self.local_address().clone();
        tracing::info!("✓ Node {} ready", local);

        match self.config.transport {
            TransportKind::Http => {
                let router = create_router(NodeState {
                    service: self.service,
                });
                axum::serve(self.listener, router)
                    .with_graceful_shutdown(signal)
                    .await?;
            }
            TransportKind::Grpc => {
                let grpc_service = ReplicationGrpcService::new(self.service);
                tonic::transport::Server::builder()
                    .add_service(grpc_service.into_server())
                    .serve_with_incoming_shutdown(TcpListenerStream::new(self.listener), signal)
                    .await?;
            }
        }

        tracing::info!("Node {} stopped", local);
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
