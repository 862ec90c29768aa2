//! Error types for peerkv

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Validation Errors ===
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    // === Peer Errors ===
    #[error("Peer {peer} unreachable: {reason}")]
    PeerUnreachable { peer: String, reason: String },

    #[error("Peer {peer} timed out after {timeout_ms} ms")]
    PeerTimeout { peer: String, timeout_ms: u64 },

    #[error("Cannot decode response from {peer}: {reason}")]
    Decode { peer: String, reason: String },

    // === Network Errors ===
    #[error("gRPC error: {0}")]
    Grpc(#[from] tonic::Status),

    #[error("gRPC transport error: {0}")]
    GrpcTransport(#[from] tonic::transport::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Is this a validation failure the caller should fix?
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidKey(_)
                | Error::InvalidValue(_)
                | Error::InvalidAddress(_)
                | Error::MissingField(_)
        )
    }

    /// Did this error come from talking to another node?
    pub fn is_peer_failure(&self) -> bool {
        matches!(
            self,
            Error::PeerUnreachable { .. }
                | Error::PeerTimeout { .. }
                | Error::Decode { .. }
                | Error::Grpc(_)
                | Error::GrpcTransport(_)
                | Error::Http(_)
        )
    }

    /// Convert to gRPC status for RPC responses
    pub fn to_grpc_status(&self) -> tonic::Status {
        use tonic::Code;
        match self {
            e if e.is_validation() => tonic::Status::new(Code::InvalidArgument, self.to_string()),
            Error::PeerTimeout { .. } => {
                tonic::Status::new(Code::DeadlineExceeded, self.to_string())
            }
            Error::PeerUnreachable { .. } => {
                tonic::Status::new(Code::Unavailable, self.to_string())
            }
            Error::Grpc(status) => status.clone(),
            _ => tonic::Status::new(Code::Internal, self.to_string()),
        }
    }

    /// Convert to HTTP status code
    pub fn to_http_status(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            e if e.is_validation() => StatusCode::BAD_REQUEST,
            Error::PeerTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Error::PeerUnreachable { .. } | Error::Decode { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}
