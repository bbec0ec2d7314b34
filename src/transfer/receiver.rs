//! Transfer receiver
//!
//! Consumes one transfer session from the stream.

use std::io::{Read, Write};
use std::path::Path;

use crate::config::Limits;
use crate::error::{FileportError, Result};
use crate::protocol::frame::read_full;
use crate::protocol::{read_message, Message};
use crate::storage::StagedFile;
use super::{TransferReport, CHUNK_SIZE};

/// Receive a file into `dest`
///
/// Bytes are staged beside `dest` and renamed into place only after the
/// whole session succeeds, so a failure never leaves a partial file at
/// `dest`.
pub fn recv_file<R: Read>(reader: &mut R, dest: &Path, limits: Limits) -> Result<TransferReport> {
    let mut staged = StagedFile::new(dest)?;
    let report = recv_into(reader, &mut staged, limits)?;
    staged.commit()?;
    Ok(report)
}

/// Receive one transfer session, writing the content to `sink`
///
/// If `sink` fails, the remaining content is read and discarded so the
/// stream ends up aligned after the completion message, then `LocalIo` is
/// returned. Any stream-level failure is returned instead and is fatal to
/// the connection.
pub fn recv_into<R: Read, W: Write>(
    reader: &mut R,
    sink: &mut W,
    limits: Limits,
) -> Result<TransferReport> {
    let start = match read_message(reader, limits.max_frame_size) {
        Ok(Message::FileTransferStart(start)) => start,
        Ok(other) => {
            return Err(FileportError::Protocol(format!(
                "expected file_transfer_start, got {}",
                other.kind()
            )))
        }
        Err(FileportError::ConnectionClosed) => {
            return Err(FileportError::Protocol(
                "connection closed before file_transfer_start".to_string(),
            ))
        }
        Err(e) => return Err(e),
    };

    if start.size > limits.max_transfer_size {
        return Err(FileportError::TransferTooLarge {
            size: start.size,
            max: limits.max_transfer_size,
        });
    }

    let mut buf = [0u8; CHUNK_SIZE];
    let mut received: u64 = 0;
    let mut sink_error: Option<std::io::Error> = None;

    while received < start.size {
        let want = (start.size - received).min(CHUNK_SIZE as u64) as usize;
        let n = read_full(reader, &mut buf[..want])?;
        if n < want {
            return Err(FileportError::IncompleteTransfer {
                expected: start.size,
                received: received + n as u64,
            });
        }

        if sink_error.is_none() {
            if let Err(e) = sink.write_all(&buf[..n]) {
                tracing::warn!(
                    "Write failed for {} after {} bytes, discarding the rest: {}",
                    start.filename,
                    received,
                    e
                );
                sink_error = Some(e);
            }
        }
        received += n as u64;
    }

    if sink_error.is_none() {
        if let Err(e) = sink.flush() {
            sink_error = Some(e);
        }
    }

    match read_message(reader, limits.max_frame_size) {
        Ok(Message::FileTransferComplete(done)) => {
            if done.bytes_sent != start.size {
                tracing::warn!(
                    "Peer reported {} bytes sent for {}, declared {}",
                    done.bytes_sent,
                    start.filename,
                    start.size
                );
            }
        }
        Ok(other) => {
            return Err(FileportError::Protocol(format!(
                "expected file_transfer_complete, got {}",
                other.kind()
            )))
        }
        Err(FileportError::ConnectionClosed) => {
            return Err(FileportError::Protocol(
                "connection closed before file_transfer_complete".to_string(),
            ))
        }
        Err(e) => return Err(e),
    }

    if let Some(e) = sink_error {
        return Err(FileportError::local(
            format!("writing {}", start.filename),
            e,
        ));
    }

    tracing::debug!("Received {} ({} bytes)", start.filename, received);

    Ok(TransferReport {
        filename: start.filename,
        size: start.size,
        bytes_received: received,
    })
}
