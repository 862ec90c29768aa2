//! HTTP transport
//!
//! Form-encoded requests, JSON responses.
//!
//! Client endpoints:
//! - `GET  /get?key=K`
//! - `POST /set`           (form: key, value) – applied, then fanned out
//! - `GET  /list`
//!
//! Peer endpoints:
//! - `GET  /peerinit`      – full snapshot for a joining node
//! - `POST /peerregister`  (form: host, port)
//! - `POST /peerupdate`    (form: key, value) – applied locally only
//!
//! Diagnostics: `GET /peers`, `GET /health`.

use crate::common::tracing_middleware::request_tracing_middleware;
use crate::common::{required, Error, PeerAddress, Result};
use crate::node::peers::PeerRecord;
use crate::node::service::ReplicationService;
use crate::node::store::Snapshot;
use crate::node::transport::{SetAck, Transport};
use axum::{
    extract::{DefaultBodyLimit, Form, Query, State},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// Request bodies are tiny forms; anything bigger is rejected.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared node state for HTTP handlers.
#[derive(Clone)]
pub struct NodeState {
    pub service: Arc<ReplicationService>,
}

#[derive(Debug, Deserialize)]
struct KeyQuery {
    key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SetForm {
    key: Option<String>,
    value: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RegisterForm {
    host: Option<String>,
    port: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetResponse {
    pub key: String,
    pub value: Option<String>,
    pub found: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetResponse {
    pub status: String,
    pub replicated_to: u32,
    pub failed: u32,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.to_http_status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Creates the HTTP router with client and peer endpoints.
pub fn create_router(state: NodeState) -> Router {
    Router::new()
        .route("/get", get(get_key))
        .route("/set", post(set_key))
        .route("/list", get(list))
        .route("/peerinit", get(peer_init))
        .route("/peerregister", post(peer_register))
        .route("/peerupdate", post(peer_update))
        .route("/peers", get(peers))
        .route("/health", get(health))
        .layer(middleware::from_fn(request_tracing_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

async fn get_key(
    State(state): State<NodeState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<GetResponse>> {
    let key = required(query.key, "key")?;
    let value = state.service.get(&key)?;
    Ok(Json(GetResponse {
        key,
        found: value.is_some(),
        value,
    }))
}

/// Client write: apply and broadcast.
async fn set_key(
    State(state): State<NodeState>,
    Form(form): Form<SetForm>,
) -> Result<Json<SetResponse>> {
    let key = required(form.key, "key")?;
    let value = required(form.value, "value")?;
    let ack = state.service.set(&key, &value, true).await?.ack();
    Ok(Json(SetResponse {
        status: "ok".to_string(),
        replicated_to: ack.replicated_to,
        failed: ack.failed,
    }))
}

async fn list(State(state): State<NodeState>) -> Json<Snapshot> {
    Json(state.service.list())
}

async fn peer_init(State(state): State<NodeState>) -> Json<Snapshot> {
    Json(state.service.list())
}

async fn peer_register(
    State(state): State<NodeState>,
    Form(form): Form<RegisterForm>,
) -> Result<Json<Snapshot>> {
    let host = required(form.host, "host")?;
    let port = required(form.port, "port")?;
    let port: u16 = port
        .parse()
        .map_err(|_| Error::InvalidAddress(format!("{}: port must be an integer", port)))?;
    let address = PeerAddress::new(host, port)?;
    Ok(Json(state.service.register_peer(address)))
}

/// Peer write: apply locally, never re-broadcast.
async fn peer_update(
    State(state): State<NodeState>,
    Form(form): Form<SetForm>,
) -> Result<Json<SetResponse>> {
    let key = required(form.key, "key")?;
    let value = required(form.value, "value")?;
    state.service.set(&key, &value, false).await?;
    Ok(Json(SetResponse {
        status: "ok".to_string(),
        replicated_to: 0,
        failed: 0,
    }))
}

async fn peers(State(state): State<NodeState>) -> Json<Vec<PeerRecord>> {
    Json(state.service.peer_records())
}

async fn health(State(state): State<NodeState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "address": state.service.local_address().to_string(),
        "keys": state.service.store().len(),
        "alive_peers": state.service.peers().alive_snapshot().len(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ============================================================================
// Client side
// ============================================================================

/// [`Transport`] over the HTTP endpoints above.
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| Error::Http(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { client, timeout })
    }

    fn request_error(&self, node: &PeerAddress, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::PeerTimeout {
                peer: node.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else if e.is_decode() {
            Error::Decode {
                peer: node.to_string(),
                reason: e.to_string(),
            }
        } else {
            Error::PeerUnreachable {
                peer: node.to_string(),
                reason: e.to_string(),
            }
        }
    }

    /// Send a request and decode the JSON reply, mapping non-2xx statuses to errors.
    async fn call<T: DeserializeOwned>(
        &self,
        node: &PeerAddress,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| self.request_error(node, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or(body);
            return Err(Error::Http(format!("{} returned {}: {}", node, status, message)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.request_error(node, e))?;
        serde_json::from_slice(&bytes).map_err(|e| Error::Decode {
            peer: node.to_string(),
            reason: e.to_string(),
        })
    }

    fn url(node: &PeerAddress, path: &str) -> String {
        format!("{}{}", node.http_url(), path)
    }
}

#[tonic::async_trait]
impl Transport for HttpTransport {
    async fn get(&self, node: &PeerAddress, key: &str) -> Result<Option<String>> {
        let request = self
            .client
            .get(Self::url(node, "/get"))
            .query(&[("key", key)]);
        let reply: GetResponse = self.call(node, request).await?;
        Ok(reply.value.filter(|_| reply.found))
    }

    async fn set(&self, node: &PeerAddress, key: &str, value: &str) -> Result<SetAck> {
        let request = self
            .client
            .post(Self::url(node, "/set"))
            .form(&[("key", key), ("value", value)]);
        let reply: SetResponse = self.call(node, request).await?;
        Ok(SetAck {
            replicated_to: reply.replicated_to,
            failed: reply.failed,
        })
    }

    async fn list(&self, node: &PeerAddress) -> Result<Snapshot> {
        let request = self.client.get(Self::url(node, "/list"));
        self.call(node, request).await
    }

    async fn peer_snapshot(&self, node: &PeerAddress) -> Result<Snapshot> {
        let request = self.client.get(Self::url(node, "/peerinit"));
        self.call(node, request).await
    }

    async fn register_peer(&self, node: &PeerAddress, local: &PeerAddress) -> Result<Snapshot> {
        let port = local.port().to_string();
        let request = self
            .client
            .post(Self::url(node, "/peerregister"))
            .form(&[("host", local.host()), ("port", port.as_str())]);
        self.call(node, request).await
    }

    async fn peer_set(&self, node: &PeerAddress, key: &str, value: &str) -> Result<()> {
        let request = self
            .client
            .post(Self::url(node, "/peerupdate"))
            .form(&[("key", key), ("value", value)]);
        let _: SetResponse = self.call(node, request).await?;
        Ok(())
    }
}
