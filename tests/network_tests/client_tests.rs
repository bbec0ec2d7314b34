//! Tests for the client against a live server

use std::fs;
use std::thread;

use fileport::{Client, FileportError};
use rand::RngCore;
use tempfile::TempDir;

use super::common::TestServer;

fn random_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut data);
    data
}

#[test]
fn test_connect_reads_greeting() {
    let server = TestServer::start();
    let client = Client::connect(server.addr).unwrap();
    assert_eq!(client.greeting(), "Connection established");
}

#[test]
fn test_list() {
    let server = TestServer::start();
    fs::write(server.dir.path().join("a.txt"), b"a").unwrap();
    fs::write(server.dir.path().join("b.txt"), b"b").unwrap();

    let mut client = Client::connect(server.addr).unwrap();
    let mut files = client.list().unwrap();
    files.sort();
    assert_eq!(files, vec!["a.txt", "b.txt"]);
}

#[test]
fn test_put_then_get_from_another_client() {
    let server = TestServer::start();
    let local = TempDir::new().unwrap();

    let data = random_bytes(1000);
    let source = local.path().join("x.bin");
    fs::write(&source, &data).unwrap();

    let mut uploader = Client::connect(server.addr).unwrap();
    assert_eq!(uploader.put("x.bin", &source).unwrap(), 1000);
    // Upload is committed before the server reads the next command
    assert_eq!(uploader.list().unwrap(), vec!["x.bin"]);

    let mut downloader = Client::connect(server.addr).unwrap();
    let dest = local.path().join("x.downloaded");
    let report = downloader.get("x.bin", &dest).unwrap();

    assert_eq!(report.size, 1000);
    assert_eq!(report.bytes_received, 1000);
    assert_eq!(fs::read(&dest).unwrap(), data);
}

#[test]
fn test_empty_file_round_trip() {
    let server = TestServer::start();
    let local = TempDir::new().unwrap();
    let source = local.path().join("empty");
    fs::write(&source, b"").unwrap();

    let mut client = Client::connect(server.addr).unwrap();
    assert_eq!(client.put("empty", &source).unwrap(), 0);

    let dest = local.path().join("empty.back");
    let report = client.get("empty", &dest).unwrap();
    assert_eq!(report.bytes_received, 0);
    assert_eq!(fs::read(&dest).unwrap(), b"");
}

#[test]
fn test_large_file_round_trip() {
    let server = TestServer::start();
    let local = TempDir::new().unwrap();
    let data = random_bytes(1024 * 1024 + 123);
    let source = local.path().join("large.bin");
    fs::write(&source, &data).unwrap();

    let mut client = Client::connect(server.addr).unwrap();
    client.put("large.bin", &source).unwrap();

    let dest = local.path().join("large.back");
    client.get("large.bin", &dest).unwrap();
    assert_eq!(fs::read(&dest).unwrap(), data);
}

#[test]
fn test_get_missing_is_remote_404_and_session_survives() {
    let server = TestServer::start();
    let local = TempDir::new().unwrap();
    let dest = local.path().join("nothing");

    let mut client = Client::connect(server.addr).unwrap();
    let err = client.get("nothing", &dest).unwrap_err();

    match &err {
        FileportError::Remote { code, message } => {
            assert_eq!(*code, 404);
            assert_eq!(message, "File Not Found: nothing");
        }
        other => panic!("Expected Remote, got {:?}", other),
    }
    assert!(!err.is_connection_fatal());
    assert!(!dest.exists());

    assert!(client.list().unwrap().is_empty());
}

#[test]
fn test_put_missing_local_file_sends_nothing() {
    let server = TestServer::start();
    let local = TempDir::new().unwrap();

    let mut client = Client::connect(server.addr).unwrap();
    let err = client.put("ghost", &local.path().join("ghost")).unwrap_err();
    assert!(matches!(err, FileportError::LocalIo { .. }));

    // The server never saw a PUT, so the session is still idle
    assert!(client.list().unwrap().is_empty());
}

#[test]
fn test_put_not_stored_is_remote_500_and_session_survives() {
    let server = TestServer::start();
    fs::create_dir(server.dir.path().join("report.txt")).unwrap();

    let local = TempDir::new().unwrap();
    let source = local.path().join("report.txt");
    fs::write(&source, b"quarterly numbers").unwrap();

    let mut client = Client::connect(server.addr).unwrap();
    let err = client.put("report.txt", &source).unwrap_err();

    match &err {
        FileportError::Remote { code, message } => {
            assert_eq!(*code, 500);
            assert!(message.starts_with("Internal Error"), "{}", message);
        }
        other => panic!("Expected Remote, got {:?}", other),
    }
    assert!(!err.is_connection_fatal());

    assert!(client.list().unwrap().is_empty());
    assert!(server.dir.path().join("report.txt").is_dir());
}

#[test]
fn test_raw_request_unknown_command() {
    let server = TestServer::start();
    let mut client = Client::connect(server.addr).unwrap();

    let response = client.request("DELETE", Some("a.txt")).unwrap();
    assert_eq!(response.code, 400);

    assert!(client.list().is_ok());
}

#[test]
fn test_quit_returns_farewell() {
    let server = TestServer::start();
    let client = Client::connect(server.addr).unwrap();
    assert_eq!(client.quit().unwrap(), "Goodbye");
}

#[test]
fn test_busy_server_rejects_client() {
    let server = TestServer::start_with(|b| b.max_connections(1));

    let _first = Client::connect(server.addr).unwrap();
    match Client::connect(server.addr) {
        Err(FileportError::Rejected { code, .. }) => assert_eq!(code, 503),
        Err(other) => panic!("Expected Rejected, got {:?}", other),
        Ok(_) => panic!("Expected Rejected, got a session"),
    }
}

#[test]
fn test_concurrent_clients() {
    let server = TestServer::start();
    let addr = server.addr;
    let local = TempDir::new().unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let base = local.path().to_path_buf();
            thread::spawn(move || {
                let name = format!("file-{}.bin", i);
                let data = random_bytes(10_000 + i * 100);
                let source = base.join(&name);
                fs::write(&source, &data).unwrap();

                let mut client = Client::connect(addr).unwrap();
                client.put(&name, &source).unwrap();

                let dest = base.join(format!("{}.back", name));
                client.get(&name, &dest).unwrap();
                assert_eq!(fs::read(&dest).unwrap(), data);
                client.quit().unwrap();
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let mut client = Client::connect(addr).unwrap();
    assert_eq!(client.list().unwrap().len(), 8);
}
