//! Error types for fileport
//!
//! Provides a unified error type for all operations.

use std::io;

use thiserror::Error;

/// Result type alias using FileportError
pub type Result<T> = std::result::Result<T, FileportError>;

/// Unified error type for fileport operations
#[derive(Debug, Error)]
pub enum FileportError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    /// Socket-level I/O failure
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Failure on the local filesystem; the connection stream is still aligned
    #[error("Local IO error while {context}: {source}")]
    LocalIo {
        context: String,
        #[source]
        source: io::Error,
    },

    // -------------------------------------------------------------------------
    // Framing Errors
    // -------------------------------------------------------------------------
    /// Peer closed the connection before a new frame began
    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Truncated frame: expected {expected} bytes, got {received}")]
    TruncatedFrame { expected: usize, received: usize },

    #[error("Frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Transfer Errors
    // -------------------------------------------------------------------------
    #[error("Incomplete transfer: expected {expected} bytes, received {received}")]
    IncompleteTransfer { expected: u64, received: u64 },

    #[error("Transfer too large: {size} bytes (max {max})")]
    TransferTooLarge { size: u64, max: u64 },

    #[error("Transfer aborted after {sent} of {size} bytes: {reason}")]
    TransferAborted { sent: u64, size: u64, reason: String },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    // -------------------------------------------------------------------------
    // Peer Replies
    // -------------------------------------------------------------------------
    /// The peer answered a command with a non-200 status
    #[error("Error {code}: {message}")]
    Remote { code: u16, message: String },

    /// The server refused the connection in its greeting
    #[error("Connection rejected ({code}): {message}")]
    Rejected { code: u16, message: String },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FileportError {
    /// Wrap a filesystem error with what was being attempted
    pub fn local(context: impl Into<String>, source: io::Error) -> Self {
        FileportError::LocalIo {
            context: context.into(),
            source,
        }
    }

    /// Whether the connection can no longer be trusted after this error
    ///
    /// Non-fatal errors leave the byte stream aligned on a message boundary,
    /// so the command loop may continue.
    pub fn is_connection_fatal(&self) -> bool {
        !matches!(
            self,
            FileportError::LocalIo { .. }
                | FileportError::InvalidFilename(_)
                | FileportError::Remote { .. }
                | FileportError::Config(_)
        )
    }

    /// Whether this is a normal disconnect rather than a failure
    pub fn is_clean_close(&self) -> bool {
        match self {
            FileportError::ConnectionClosed => true,
            FileportError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for FileportError {
    fn from(e: serde_json::Error) -> Self {
        FileportError::Decode(e.to_string())
    }
}
