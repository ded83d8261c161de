//! Error types for redis-stats-probe

use std::io;
use thiserror::Error;

/// Top-level probe error
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("IO error: {0}")]
    Io(io::Error),
}

impl ProbeError {
    /// Connect, AUTH and SELECT failures. These abort a cycle before any item is emitted.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            ProbeError::Connection(
                ConnectionError::ConnectFailed { .. }
                    | ConnectionError::AuthFailed(_)
                    | ConnectionError::SelectFailed { .. }
            )
        )
    }

    /// Failures that leave the connection in sync with the server, so the
    /// next command on the same session can still be issued.
    pub fn is_reply_scoped(&self) -> bool {
        matches!(
            self,
            ProbeError::Protocol(
                ProtocolError::ServerError(_) | ProtocolError::UnexpectedResponse { .. }
            )
        )
    }
}

impl From<io::Error> for ProbeError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                ProbeError::Connection(ConnectionError::Timeout)
            }
            io::ErrorKind::UnexpectedEof => ProbeError::Connection(ConnectionError::Closed),
            _ => ProbeError::Io(e),
        }
    }
}

/// Connection-related errors
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Failed to connect to {host}:{port}: {source}")]
    ConnectFailed {
        host: String,
        port: u16,
        source: io::Error,
    },

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Could not select db {db}: {reason}")]
    SelectFailed { db: u32, reason: String },

    #[error("Connection closed unexpectedly")]
    Closed,

    #[error("Timed out waiting for server reply")]
    Timeout,
}

/// RESP protocol errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Unknown reply prefix: {0:?}")]
    InvalidType(char),

    #[error("Invalid length: {0}")]
    InvalidLength(i64),

    #[error("Reply line not terminated by CRLF")]
    MissingTerminator,

    #[error("Unexpected response: expected {expected}, got {actual}")]
    UnexpectedResponse { expected: String, actual: String },

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Outbound sink errors. Items rejected by the sink are dropped, never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Item sink is full")]
    Full,

    #[error("Item sink is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, ProbeError>;
