//! Error types for the IRC client library.
//!
//! This module defines error types for protocol-level errors,
//! message parsing failures, and client/connection errors.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error.
    #[error("decode error: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    /// Outbound line exceeded the RFC 1459 payload limit.
    #[error("line too long: {actual} bytes (limit: {limit})")]
    LineTooLong {
        /// Actual line length in bytes, excluding the terminator.
        actual: usize,
        /// Maximum allowed length.
        limit: usize,
    },

    /// Failed to parse an IRC message.
    #[error("invalid message: {string}")]
    InvalidMessage {
        /// The invalid message string.
        string: String,
        /// The underlying parse error.
        #[source]
        cause: MessageParseError,
    },
}

impl ProtocolError {
    /// Whether this error means the peer sent a line we could not parse,
    /// as opposed to the stream itself failing.
    pub fn is_malformed_line(&self) -> bool {
        matches!(
            self,
            ProtocolError::InvalidMessage { .. } | ProtocolError::Decode(_)
        )
    }
}

/// Errors encountered when parsing IRC messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Message was empty.
    #[error("empty message")]
    EmptyMessage,

    /// Command verb was missing.
    #[error("missing command verb")]
    MissingCommand,

    /// Invalid message prefix.
    #[error("invalid prefix: {0}")]
    InvalidPrefix(String),
}

/// Errors surfaced to callers of the client API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// A protocol-level failure (oversized line, codec error).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The operation requires an established connection.
    #[error("not connected")]
    NotConnected,

    /// The configured server host is not a valid TLS server name.
    #[error("invalid server name: {0}")]
    InvalidServerName(String),

    /// I/O failure while connecting.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
