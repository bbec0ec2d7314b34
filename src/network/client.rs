//! Client
//!
//! Client side of the command loop: one command, one response, and for
//! GET/PUT a nested file transfer.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;

use crate::config::Limits;
use crate::error::{FileportError, Result};
use crate::protocol::{
    read_message, write_message, CommandKind, CommandRequest, Message, Response,
};
use crate::storage::StagedFile;
use crate::transfer::{recv_into, send_file, TransferReport};

/// A connected session with a fileport server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    limits: Limits,
    greeting: String,
}

impl Client {
    /// Connect with default limits and wait for the server's greeting
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        Self::connect_with(addr, Limits::default())
    }

    /// Connect and wait for the server's greeting
    ///
    /// A greeting with a non-200 code becomes `Rejected`.
    pub fn connect_with<A: ToSocketAddrs>(addr: A, limits: Limits) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        let mut reader = BufReader::new(stream.try_clone()?);
        let writer = BufWriter::new(stream);

        let greeting = match read_message(&mut reader, limits.max_frame_size)? {
            Message::Connection(g) if g.code == 200 => g.message,
            Message::Connection(g) => {
                return Err(FileportError::Rejected {
                    code: g.code,
                    message: g.message,
                })
            }
            other => {
                return Err(FileportError::Protocol(format!(
                    "expected connection greeting, got {}",
                    other.kind()
                )))
            }
        };

        Ok(Self {
            reader,
            writer,
            limits,
            greeting,
        })
    }

    /// Message the server sent on connect
    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// Send one command and read its response, whatever the status
    ///
    /// `command` is sent verbatim so callers can exercise unknown keywords.
    pub fn request(&mut self, command: &str, filename: Option<&str>) -> Result<Response> {
        let request = CommandRequest {
            command: command.to_string(),
            filename: filename.map(str::to_string),
        };
        write_message(&mut self.writer, &Message::Command(request))?;
        self.read_response()
    }

    fn read_response(&mut self) -> Result<Response> {
        match read_message(&mut self.reader, self.limits.max_frame_size)? {
            Message::Response(r) => Ok(r),
            other => Err(FileportError::Protocol(format!(
                "expected response, got {}",
                other.kind()
            ))),
        }
    }

    /// Like `request`, but a non-200 status becomes `Remote`
    fn expect_ok(&mut self, kind: CommandKind, filename: Option<&str>) -> Result<Response> {
        let response = self.request(kind.as_str(), filename)?;
        into_ok(response)
    }

    /// List the files on the server
    pub fn list(&mut self) -> Result<Vec<String>> {
        let response = self.expect_ok(CommandKind::Ls, None)?;
        Ok(response.data.map(|d| d.files).unwrap_or_default())
    }

    /// Download `name` into `dest`
    ///
    /// The destination is staged before the command goes out, so a local
    /// failure is reported without involving the server. `dest` only changes
    /// once the whole file has arrived.
    pub fn get(&mut self, name: &str, dest: &Path) -> Result<TransferReport> {
        let mut staged = StagedFile::new(dest)?;
        self.expect_ok(CommandKind::Get, Some(name))?;

        let report = recv_into(&mut self.reader, &mut staged, self.limits)?;
        staged.commit()?;
        Ok(report)
    }

    /// Upload the local file at `source` as `name`
    ///
    /// Returns the number of bytes sent once the server confirms the file is
    /// stored. A server that could not store it answers with `Remote`.
    pub fn put(&mut self, name: &str, source: &Path) -> Result<u64> {
        if !source.is_file() {
            return Err(FileportError::local(
                format!("reading {}", source.display()),
                std::io::Error::new(std::io::ErrorKind::NotFound, "File not found"),
            ));
        }

        self.expect_ok(CommandKind::Put, Some(name))?;
        let sent = match send_file(&mut self.writer, name, source) {
            Ok(sent) => sent,
            // The server is waiting for a transfer that will never come
            Err(FileportError::LocalIo { context, source }) => {
                return Err(FileportError::TransferAborted {
                    sent: 0,
                    size: 0,
                    reason: format!("{}: {}", context, source),
                })
            }
            Err(e) => return Err(e),
        };

        let response = self.read_response()?;
        into_ok(response)?;
        Ok(sent)
    }

    /// End the session, returning the server's farewell
    pub fn quit(mut self) -> Result<String> {
        let response = self.expect_ok(CommandKind::Quit, None)?;
        Ok(response.message)
    }
}

fn into_ok(response: Response) -> Result<Response> {
    if response.is_ok() {
        Ok(response)
    } else {
        Err(FileportError::Remote {
            code: response.code,
            message: response.message,
        })
    }
}
