// MIT License - Copyright (c) 2026 Peter Wright
// Lares4 WebSocket client

use crate::protocol::BootstrapKind;
use crate::state::ConnectionState;

/// All errors that can occur in the lares4 library.
#[derive(Debug, thiserror::Error)]
pub enum Lares4Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("Authentication failed: {details}")]
    AuthenticationFailed { details: String },

    #[error("Bootstrap query {query} failed: {details}")]
    BootstrapFailed { query: BootstrapKind, details: String },

    #[error("Timed out during {phase}")]
    Timeout { phase: &'static str },

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },

    #[error("Serialized envelope has no CRC_16 field")]
    ChecksumFieldMissing,

    #[error("Client is not ready (state: {state:?})")]
    NotReady { state: ConnectionState },

    #[error("Connection closed")]
    Disconnected,

    #[error("Channel closed")]
    ChannelClosed,
}

impl Lares4Error {
    /// Whether the connection is gone for good.
    ///
    /// There is no reconnection inside the client: after a transport failure
    /// the caller has to build a new one.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            Lares4Error::Io(_)
                | Lares4Error::WebSocket(_)
                | Lares4Error::Tls(_)
                | Lares4Error::Disconnected
                | Lares4Error::ChannelClosed
        )
    }
}

pub type Result<T> = std::result::Result<T, Lares4Error>;
