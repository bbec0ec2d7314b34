//! Protocol codec
//!
//! Encoding and decoding of control messages.
//!
//! ## Wire Format
//! Each message is one frame whose payload is a UTF-8 JSON object:
//! ```text
//! ┌──────────┬──────────────────────────────────────────────┐
//! │ Len (4)  │ {"type":"command","command":"GET",...}       │
//! └──────────┴──────────────────────────────────────────────┘
//! ```

use std::io::{Read, Write};

use crate::error::{FileportError, Result};
use super::frame::{read_frame, write_frame};
use super::Message;

/// Encode a message to its JSON payload
///
/// Field order is fixed (tag first, then declaration order), so equal
/// messages always encode to identical bytes.
pub fn encode(message: &Message) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(message)?)
}

/// Decode a message from a JSON payload
pub fn decode(bytes: &[u8]) -> Result<Message> {
    if bytes.is_empty() {
        return Err(FileportError::Decode("empty payload".to_string()));
    }
    Ok(serde_json::from_slice(bytes)?)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete message from a stream
///
/// Blocks until a complete frame is received or the stream ends
pub fn read_message<R: Read>(reader: &mut R, max_frame_size: usize) -> Result<Message> {
    let payload = read_frame(reader, max_frame_size)?;
    let message = decode(&payload)?;
    tracing::trace!("<- {}", String::from_utf8_lossy(&payload));
    Ok(message)
}

/// Write a message to a stream
pub fn write_message<W: Write>(writer: &mut W, message: &Message) -> Result<()> {
    let payload = encode(message)?;
    tracing::trace!("-> {}", String::from_utf8_lossy(&payload));
    write_frame(writer, &payload)
}
