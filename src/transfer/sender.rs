//! Transfer sender
//!
//! Streams a file as start message, raw chunks, completion message.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{FileportError, Result};
use crate::protocol::{write_message, Message, TransferComplete, TransferStart};
use super::CHUNK_SIZE;

/// Send the file at `path` under the name `filename`
///
/// Returns the number of content bytes sent.
pub fn send_file<W: Write>(writer: &mut W, filename: &str, path: &Path) -> Result<u64> {
    let context = || format!("opening {}", path.display());
    let file = File::open(path).map_err(|e| FileportError::local(context(), e))?;
    let size = file
        .metadata()
        .map_err(|e| FileportError::local(context(), e))?
        .len();

    send_stream(writer, filename, file, size)
}

/// Send exactly `size` bytes from `source`
///
/// Local errors before the start message leave the stream untouched. Once
/// the start message is out, a short or failing source aborts the transfer
/// and the connection must be closed.
pub fn send_stream<W: Write, S: Read>(
    writer: &mut W,
    filename: &str,
    source: S,
    size: u64,
) -> Result<u64> {
    write_message(
        writer,
        &Message::FileTransferStart(TransferStart {
            filename: filename.to_string(),
            size,
        }),
    )?;

    // Never send more than declared, even if the file grew
    let mut source = source.take(size);
    let mut buf = [0u8; CHUNK_SIZE];
    let mut sent: u64 = 0;

    while sent < size {
        let n = match source.read(&mut buf) {
            Ok(0) => {
                return Err(FileportError::TransferAborted {
                    sent,
                    size,
                    reason: "source ended early".to_string(),
                })
            }
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(FileportError::TransferAborted {
                    sent,
                    size,
                    reason: e.to_string(),
                })
            }
        };
        writer.write_all(&buf[..n])?;
        sent += n as u64;
    }

    write_message(
        writer,
        &Message::FileTransferComplete(TransferComplete { bytes_sent: sent }),
    )?;

    tracing::debug!("Sent {} ({} bytes)", filename, sent);
    Ok(sent)
}
