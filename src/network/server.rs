//! TCP Server
//!
//! Accepts connections and hands each one to its own thread.

use std::io::{self, BufWriter};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::protocol::{write_message, Greeting, Message};
use crate::storage::Directory;
use super::Connection;

/// How long the acceptor sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// TCP server exposing one directory
pub struct Server {
    config: Config,
    directory: Arc<Directory>,
    shutdown: Arc<AtomicBool>,
    active: Arc<AtomicUsize>,
}

/// Stops a running server's accept loop from another thread
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Signal the server to stop accepting; open sessions run to completion
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }
}

/// Decrements the active connection count when a worker ends
struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Server {
    /// Create a new server, opening (or creating) the served directory
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let directory = Arc::new(Directory::open(&config.root_dir)?);

        Ok(Self {
            config,
            directory,
            shutdown: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
        }
    }

    /// Number of connections currently being served
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Bind the configured listen address
    pub fn bind(&self) -> Result<TcpListener> {
        Ok(TcpListener::bind(&self.config.listen_addr)?)
    }

    /// Bind and serve until shut down (blocking)
    pub fn run(&self) -> Result<()> {
        let listener = self.bind()?;
        self.serve(listener)
    }

    /// Serve connections from an already bound listener (blocking)
    pub fn serve(&self, listener: TcpListener) -> Result<()> {
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Server listening on {}", local_addr);
        tracing::info!("Server directory: {}", self.directory.root().display());

        let mut next_id: u64 = 0;

        while !self.shutdown.load(Ordering::Relaxed) {
            match listener.accept() {
                Ok((stream, addr)) => {
                    next_id += 1;
                    if let Err(e) = self.accept(stream, addr, next_id) {
                        tracing::warn!("Failed to set up connection from {}: {}", addr, e);
                    }
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    // Per-connection accept failures (e.g. aborted handshakes)
                    // should not take the listener down
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        tracing::info!("Server on {} stopped accepting", local_addr);
        Ok(())
    }

    /// Start a worker for one accepted stream, or turn it away when full
    fn accept(&self, stream: TcpStream, addr: SocketAddr, id: u64) -> Result<()> {
        // Accepted sockets may inherit non-blocking mode from the listener
        stream.set_nonblocking(false)?;

        let active = self.active.fetch_add(1, Ordering::AcqRel) + 1;
        let guard = ActiveGuard(Arc::clone(&self.active));

        if active > self.config.max_connections {
            tracing::warn!(
                "Rejecting {}: {} connections already open",
                addr,
                self.config.max_connections
            );
            let mut writer = BufWriter::new(stream);
            write_message(&mut writer, &Message::Connection(Greeting::busy()))?;
            return Ok(());
        }

        tracing::debug!("Connected by {} ({} active)", addr, active);

        let mut connection = Connection::new(stream, Arc::clone(&self.directory), self.config.limits())?;
        connection.set_timeouts(self.config.read_timeout_ms, self.config.write_timeout_ms)?;

        thread::Builder::new()
            .name(format!("fileport-conn-{}", id))
            .spawn(move || {
                let _guard = guard;
                if let Err(e) = connection.handle() {
                    tracing::warn!("Connection {} closed with error: {}", connection.peer_addr(), e);
                } else {
                    tracing::debug!("Connection {} closed", connection.peer_addr());
                }
            })?;

        Ok(())
    }
}
