//! Framing layer
//!
//! Turns a byte stream into discrete frames.
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬─────────────────────────────┐
//! │ Len (4)  │       Payload (Len)         │
//! └──────────┴─────────────────────────────┘
//! ```
//! `Len` is a big-endian u32. Zero-length payloads are legal here.

use std::io::{self, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FileportError, Result};

/// Length prefix size
pub const LEN_PREFIX_SIZE: usize = 4;

/// Write one frame: length prefix + payload in a single buffered write
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| FileportError::FrameTooLarge {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;

    let mut frame = BytesMut::with_capacity(LEN_PREFIX_SIZE + payload.len());
    frame.put_u32(len);
    frame.put_slice(payload);

    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

/// Read one frame
///
/// Returns `ConnectionClosed` if the stream ends before the first prefix
/// byte, and `TruncatedFrame` if it ends anywhere after that.
pub fn read_frame<R: Read>(reader: &mut R, max_frame_size: usize) -> Result<Bytes> {
    let mut prefix = [0u8; LEN_PREFIX_SIZE];
    let n = read_full(reader, &mut prefix)?;
    if n == 0 {
        return Err(FileportError::ConnectionClosed);
    }
    if n < LEN_PREFIX_SIZE {
        return Err(FileportError::TruncatedFrame {
            expected: LEN_PREFIX_SIZE,
            received: n,
        });
    }

    let len = u32::from_be_bytes(prefix) as usize;
    if len > max_frame_size {
        return Err(FileportError::FrameTooLarge {
            size: len,
            max: max_frame_size,
        });
    }

    let mut payload = vec![0u8; len];
    let n = read_full(reader, &mut payload)?;
    if n < len {
        return Err(FileportError::TruncatedFrame {
            expected: len,
            received: n,
        });
    }

    Ok(Bytes::from(payload))
}

/// Read until `buf` is full or the stream ends
///
/// Returns the number of bytes read; it is short only at end of stream.
pub fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
