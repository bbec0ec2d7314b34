//! File Transfer Module
//!
//! Moves one whole file across a connection.
//!
//! ## Session Format
//! ```text
//! ┌───────────────────────────┬──────────────────────┬──────────────────────────────┐
//! │ file_transfer_start frame │ `size` raw bytes     │ file_transfer_complete frame │
//! │ {filename, size}          │ (unframed, chunked)  │ {bytes_sent}                 │
//! └───────────────────────────┴──────────────────────┴──────────────────────────────┘
//! ```
//! The declared `size` is authoritative; `bytes_sent` is informational.

mod sender;
mod receiver;

pub use sender::{send_file, send_stream};
pub use receiver::{recv_file, recv_into};

/// Raw content is moved in chunks of this size
pub const CHUNK_SIZE: usize = 4096;

/// Outcome of a completed receive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    /// Name announced by the sender
    pub filename: String,

    /// Size announced by the sender
    pub size: u64,

    /// Content bytes actually read (equals `size` on success)
    pub bytes_received: u64,
}
