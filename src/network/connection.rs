//! Connection Handler
//!
//! Runs the server side of the command loop for one client.

use std::io::{self, BufReader, BufWriter};
use std::net::{Shutdown, TcpStream};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Limits;
use crate::error::{FileportError, Result};
use crate::protocol::{
    read_message, write_message, CommandKind, CommandRequest, Greeting, Message, Response,
};
use crate::storage::{Directory, StagedFile};
use crate::transfer::{recv_into, send_stream};

/// What the command loop does after a command
enum Flow {
    Continue,
    Close,
}

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Reference to the served directory
    directory: Arc<Directory>,

    /// Bounds on peer-supplied sizes
    limits: Limits,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O on two handles to the same socket
    pub fn new(stream: TcpStream, directory: Arc<Directory>, limits: Limits) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Control messages are small; don't let Nagle hold them back
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            directory,
            limits,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 leaves the stream blocking forever)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Send the greeting and serve commands until the session ends
    ///
    /// Returns `Ok` on QUIT or a clean disconnect, `Err` when the session
    /// had to be cut because of a protocol or transfer failure.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        let result = self
            .send(Greeting::welcome().into())
            .and_then(|_| self.command_loop());

        // Best effort; the peer may already be gone
        let _ = self.writer.get_ref().shutdown(Shutdown::Both);

        match result {
            Err(e) if e.is_clean_close() => {
                tracing::debug!("Client {} disconnected", self.peer_addr);
                Ok(())
            }
            Err(FileportError::Io(ref e))
                if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
            {
                tracing::debug!("Timeout for client {}", self.peer_addr);
                Ok(())
            }
            other => other,
        }
    }

    fn command_loop(&mut self) -> Result<()> {
        loop {
            let message = match read_message(&mut self.reader, self.limits.max_frame_size) {
                Ok(m) => m,
                Err(e) if e.is_clean_close() => return Err(e),
                Err(e @ FileportError::Io(_)) => return Err(e),
                Err(e) => {
                    // Framing is lost; answer once, then close
                    tracing::warn!("Malformed message from {}: {}", self.peer_addr, e);
                    let _ = self.send(Response::bad_request(format!("Malformed message: {}", e)).into());
                    return Err(e);
                }
            };

            let request = match message {
                Message::Command(request) => request,
                other => {
                    tracing::warn!(
                        "Unexpected {} message from {}",
                        other.kind(),
                        self.peer_addr
                    );
                    self.send(
                        Response::bad_request(format!("Unexpected message: {}", other.kind()))
                            .into(),
                    )?;
                    return Err(FileportError::Protocol(format!(
                        "unexpected {} message while idle",
                        other.kind()
                    )));
                }
            };

            match self.dispatch(request)? {
                Flow::Continue => continue,
                Flow::Close => return Ok(()),
            }
        }
    }

    /// Execute one command, including any nested file transfer
    fn dispatch(&mut self, request: CommandRequest) -> Result<Flow> {
        let kind = match CommandKind::from_str(&request.command) {
            Ok(kind) => kind,
            Err(e) => {
                tracing::debug!("Unknown command from {}: {:?}", self.peer_addr, request.command);
                let message = match e {
                    FileportError::Protocol(m) => m,
                    other => other.to_string(),
                };
                self.send(Response::bad_request(message).into())?;
                return Ok(Flow::Continue);
            }
        };

        tracing::trace!(
            "Received command from {}: {} {:?}",
            self.peer_addr,
            kind,
            request.filename
        );

        let filename = request.filename.filter(|f| !f.is_empty());

        match kind {
            CommandKind::Ls => self.handle_ls()?,
            CommandKind::Get => match filename {
                Some(name) => self.handle_get(&name)?,
                None => self.send(Response::bad_request("Bad Request: filename required").into())?,
            },
            CommandKind::Put => match filename {
                Some(name) => self.handle_put(&name)?,
                None => self.send(Response::bad_request("Bad Request: filename required").into())?,
            },
            CommandKind::Quit => {
                self.send(Response::goodbye().into())?;
                tracing::debug!("Client {} requested disconnect", self.peer_addr);
                return Ok(Flow::Close);
            }
        }

        Ok(Flow::Continue)
    }

    fn handle_ls(&mut self) -> Result<()> {
        let response = match self.directory.list_files() {
            Ok(files) => {
                tracing::info!("LS: sent {} files to {}", files.len(), self.peer_addr);
                Response::listing(files)
            }
            Err(e) => {
                tracing::warn!("LS failed: {}", e);
                Response::server_error(format!("Internal Error: {}", e))
            }
        };
        self.send(response.into())
    }

    fn handle_get(&mut self, name: &str) -> Result<()> {
        let (file, size) = match self.directory.open_file(name) {
            Ok(opened) => opened,
            Err(e) => {
                let response = match &e {
                    FileportError::InvalidFilename(_) => {
                        Response::bad_request(format!("Bad Request: {}", e))
                    }
                    FileportError::LocalIo { source, .. }
                        if source.kind() == io::ErrorKind::NotFound =>
                    {
                        tracing::info!("GET: file not found - {}", name);
                        Response::not_found(name)
                    }
                    _ => {
                        tracing::warn!("GET {} failed: {}", name, e);
                        Response::server_error(format!("Internal Error: {}", e))
                    }
                };
                return self.send(response.into());
            }
        };

        self.send(Response::ok("OK").into())?;
        let sent = send_stream(&mut self.writer, name, file, size)?;
        tracing::info!("GET: sent {} ({} bytes) to {}", name, sent, self.peer_addr);
        Ok(())
    }

    fn handle_put(&mut self, name: &str) -> Result<()> {
        let staged = match self.directory.stage(name) {
            Ok(staged) => staged,
            Err(e @ FileportError::InvalidFilename(_)) => {
                return self.send(Response::bad_request(format!("Bad Request: {}", e)).into());
            }
            Err(e) => {
                tracing::warn!("PUT {} failed: {}", name, e);
                return self.send(Response::server_error(format!("Internal Error: {}", e)).into());
            }
        };

        let slot = self.directory.write_slot(name);
        let result = {
            let _writer_guard = slot.lock();
            self.receive_upload(name, staged)
        };
        self.directory.release_write_slot(name, slot);
        result
    }

    /// Run the upload after `Ready`, then report whether it was stored
    ///
    /// A local failure drains the rest of the transfer and is answered with a
    /// 500; only errors that break the stream end the session.
    fn receive_upload(&mut self, name: &str, mut staged: StagedFile) -> Result<()> {
        self.send(Response::ready().into())?;

        let outcome = match recv_into(&mut self.reader, &mut staged, self.limits) {
            Ok(report) => staged.commit().map(|_| report),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(report) => {
                tracing::info!(
                    "PUT: received {} ({} bytes) from {}",
                    name,
                    report.bytes_received,
                    self.peer_addr
                );
                self.send(Response::stored().into())
            }
            Err(e) if !e.is_connection_fatal() => {
                tracing::warn!("PUT: failed to store {}: {}", name, e);
                self.send(Response::server_error(format!("Internal Error: {}", e)).into())
            }
            Err(e) => {
                tracing::warn!("PUT: transfer of {} from {} aborted: {}", name, self.peer_addr, e);
                Err(e)
            }
        }
    }

    /// Send a message to the client
    fn send(&mut self, message: Message) -> Result<()> {
        write_message(&mut self.writer, &message)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
