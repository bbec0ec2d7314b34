//! Tests for the file transfer engine
//!
//! These tests verify:
//! - Byte-for-byte fidelity for empty, small, and multi-chunk files
//! - Out-of-sequence and truncated sessions are rejected
//! - Failed receives never leave a file at the destination
//! - A failing sink keeps the stream aligned

use std::fs;
use std::io::{self, Cursor, Write};

use fileport::protocol::{read_message, write_message, Message, TransferComplete, TransferStart};
use fileport::transfer::{recv_file, recv_into, send_file, send_stream, CHUNK_SIZE};
use fileport::{FileportError, Limits};
use rand::RngCore;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn random_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut data);
    data
}

/// Run `send_file` for `data` and return the bytes it put on the wire
fn wire_for(dir: &TempDir, name: &str, data: &[u8]) -> Vec<u8> {
    let source = dir.path().join(format!("src-{}", name));
    fs::write(&source, data).unwrap();

    let mut wire = Vec::new();
    let sent = send_file(&mut wire, name, &source).unwrap();
    assert_eq!(sent, data.len() as u64);
    wire
}

/// Sink that accepts `budget` bytes, then fails every write
struct FailingSink {
    budget: usize,
    written: Vec<u8>,
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.budget == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        let n = buf.len().min(self.budget);
        self.budget -= n;
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// Fidelity Tests
// =============================================================================

#[test]
fn test_round_trip_various_sizes() {
    let dir = TempDir::new().unwrap();

    for size in [0, 1, CHUNK_SIZE - 1, CHUNK_SIZE, CHUNK_SIZE + 1, 3 * CHUNK_SIZE + 17] {
        let data = random_bytes(size);
        let name = format!("file-{}.bin", size);
        let wire = wire_for(&dir, &name, &data);

        let dest = dir.path().join(format!("dst-{}", name));
        let report = recv_file(&mut Cursor::new(wire), &dest, Limits::default()).unwrap();

        assert_eq!(report.filename, name);
        assert_eq!(report.size, size as u64);
        assert_eq!(report.bytes_received, size as u64);
        assert_eq!(fs::read(&dest).unwrap(), data, "size {}", size);
    }
}

#[test]
fn test_wire_layout() {
    let mut wire = Vec::new();
    send_stream(&mut wire, "abc.txt", Cursor::new(b"hello".to_vec()), 5).unwrap();

    let mut cursor = Cursor::new(wire);
    let start = read_message(&mut cursor, 1024).unwrap();
    assert_eq!(
        start,
        Message::FileTransferStart(TransferStart {
            filename: "abc.txt".into(),
            size: 5
        })
    );

    // Raw, unframed content follows directly
    let mut raw = [0u8; 5];
    io::Read::read_exact(&mut cursor, &mut raw).unwrap();
    assert_eq!(&raw, b"hello");

    let complete = read_message(&mut cursor, 1024).unwrap();
    assert_eq!(
        complete,
        Message::FileTransferComplete(TransferComplete { bytes_sent: 5 })
    );
}

#[test]
fn test_recv_overwrites_existing_destination() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("out.txt");
    fs::write(&dest, b"old contents that are longer").unwrap();

    let wire = wire_for(&dir, "out.txt", b"new");
    recv_file(&mut Cursor::new(wire), &dest, Limits::default()).unwrap();

    assert_eq!(fs::read(&dest).unwrap(), b"new");
}

#[test]
fn test_stream_stays_aligned_for_next_message() {
    let dir = TempDir::new().unwrap();
    let mut wire = wire_for(&dir, "a.bin", &random_bytes(5000));
    write_message(&mut wire, &fileport::protocol::Response::goodbye().into()).unwrap();

    let mut cursor = Cursor::new(wire);
    let mut sink = Vec::new();
    recv_into(&mut cursor, &mut sink, Limits::default()).unwrap();

    match read_message(&mut cursor, 1024).unwrap() {
        Message::Response(r) => assert_eq!(r.message, "Goodbye"),
        other => panic!("Expected response, got {:?}", other),
    }
}

// =============================================================================
// Sender Error Tests
// =============================================================================

#[test]
fn test_send_short_source_aborts() {
    let mut wire = Vec::new();
    let err = send_stream(&mut wire, "short", Cursor::new(vec![1u8; 10]), 20).unwrap_err();

    assert!(err.is_connection_fatal());
    match err {
        FileportError::TransferAborted { sent, size, .. } => {
            assert_eq!(sent, 10);
            assert_eq!(size, 20);
        }
        other => panic!("Expected TransferAborted, got {:?}", other),
    }
}

#[test]
fn test_send_longer_source_is_capped() {
    let mut wire = Vec::new();
    let sent = send_stream(&mut wire, "capped", Cursor::new(vec![9u8; 100]), 40).unwrap();
    assert_eq!(sent, 40);

    let mut sink = Vec::new();
    let report = recv_into(&mut Cursor::new(wire), &mut sink, Limits::default()).unwrap();
    assert_eq!(report.bytes_received, 40);
    assert_eq!(sink, vec![9u8; 40]);
}

#[test]
fn test_send_missing_file_is_local_error() {
    let dir = TempDir::new().unwrap();
    let mut wire = Vec::new();
    let err = send_file(&mut wire, "nope", &dir.path().join("nope")).unwrap_err();

    assert!(matches!(err, FileportError::LocalIo { .. }));
    assert!(!err.is_connection_fatal());
    // Nothing was written, the stream is untouched
    assert!(wire.is_empty());
}

// =============================================================================
// Receiver Error Tests
// =============================================================================

#[test]
fn test_recv_rejects_out_of_sequence_message() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("x");

    let mut wire = Vec::new();
    write_message(&mut wire, &fileport::protocol::Response::ok("OK").into()).unwrap();

    let err = recv_file(&mut Cursor::new(wire), &dest, Limits::default()).unwrap_err();
    assert!(matches!(err, FileportError::Protocol(_)));
    assert!(err.is_connection_fatal());
    assert!(!dest.exists());
}

#[test]
fn test_recv_truncated_content_leaves_no_file() {
    let dir = TempDir::new().unwrap();
    let data = random_bytes(10_000);
    let mut wire = wire_for(&dir, "big.bin", &data);

    // Cut the stream in the middle of the raw content
    let start_len = 4 + u32::from_be_bytes([wire[0], wire[1], wire[2], wire[3]]) as usize;
    wire.truncate(start_len + 6_000);

    let dest = dir.path().join("big.bin");
    let err = recv_file(&mut Cursor::new(wire), &dest, Limits::default()).unwrap_err();

    match err {
        FileportError::IncompleteTransfer { expected, received } => {
            assert_eq!(expected, 10_000);
            assert_eq!(received, 6_000);
        }
        other => panic!("Expected IncompleteTransfer, got {:?}", other),
    }
    assert!(!dest.exists());

    // No staging leftovers either
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(".fileport-"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_recv_missing_trailer_is_fatal() {
    let dir = TempDir::new().unwrap();
    let mut wire = Vec::new();
    write_message(
        &mut wire,
        &Message::FileTransferStart(TransferStart {
            filename: "t".into(),
            size: 3,
        }),
    )
    .unwrap();
    wire.extend_from_slice(b"abc");

    let dest = dir.path().join("t");
    let err = recv_file(&mut Cursor::new(wire), &dest, Limits::default()).unwrap_err();
    assert!(matches!(err, FileportError::Protocol(_)));
    assert!(!dest.exists());
}

#[test]
fn test_recv_wrong_trailer_is_fatal() {
    let mut wire = Vec::new();
    write_message(
        &mut wire,
        &Message::FileTransferStart(TransferStart {
            filename: "t".into(),
            size: 2,
        }),
    )
    .unwrap();
    wire.extend_from_slice(b"hi");
    write_message(&mut wire, &fileport::protocol::Response::ok("OK").into()).unwrap();

    let mut sink = Vec::new();
    let err = recv_into(&mut Cursor::new(wire), &mut sink, Limits::default()).unwrap_err();
    assert!(matches!(err, FileportError::Protocol(_)));
}

#[test]
fn test_recv_mismatched_bytes_sent_is_tolerated() {
    let mut wire = Vec::new();
    write_message(
        &mut wire,
        &Message::FileTransferStart(TransferStart {
            filename: "m".into(),
            size: 4,
        }),
    )
    .unwrap();
    wire.extend_from_slice(b"data");
    write_message(
        &mut wire,
        &Message::FileTransferComplete(TransferComplete { bytes_sent: 999 }),
    )
    .unwrap();

    let mut sink = Vec::new();
    let report = recv_into(&mut Cursor::new(wire), &mut sink, Limits::default()).unwrap();
    assert_eq!(report.bytes_received, 4);
    assert_eq!(sink, b"data");
}

#[test]
fn test_recv_rejects_oversized_transfer() {
    let mut wire = Vec::new();
    write_message(
        &mut wire,
        &Message::FileTransferStart(TransferStart {
            filename: "huge".into(),
            size: 1 << 40,
        }),
    )
    .unwrap();

    let limits = Limits {
        max_transfer_size: 1024,
        ..Limits::default()
    };
    let mut sink = Vec::new();
    let err = recv_into(&mut Cursor::new(wire), &mut sink, limits).unwrap_err();

    assert!(matches!(
        err,
        FileportError::TransferTooLarge { size, max: 1024 } if size == 1 << 40
    ));
    assert!(sink.is_empty());
}

#[test]
fn test_recv_failing_sink_drains_and_reports_local_error() {
    let data = random_bytes(3 * CHUNK_SIZE);
    let mut wire = Vec::new();
    send_stream(&mut wire, "drain.bin", Cursor::new(data.clone()), data.len() as u64).unwrap();
    write_message(&mut wire, &fileport::protocol::Response::goodbye().into()).unwrap();

    let mut cursor = Cursor::new(wire);
    let mut sink = FailingSink {
        budget: 100,
        written: Vec::new(),
    };
    let err = recv_into(&mut cursor, &mut sink, Limits::default()).unwrap_err();

    assert!(matches!(err, FileportError::LocalIo { .. }));
    assert!(!err.is_connection_fatal());
    assert_eq!(sink.written, &data[..100]);

    // Content and trailer were consumed; the next message is intact
    assert!(matches!(
        read_message(&mut cursor, 1024).unwrap(),
        Message::Response(_)
    ));
}

#[test]
fn test_recv_closed_before_start() {
    let mut sink = Vec::new();
    let err = recv_into(&mut Cursor::new(Vec::new()), &mut sink, Limits::default()).unwrap_err();
    assert!(matches!(err, FileportError::Protocol(_)));
}
