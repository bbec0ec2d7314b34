//! Message definitions
//!
//! Every control message is one variant, discriminated on the wire by the
//! `type` key. Each payload struct rejects fields that do not belong to it.

use serde::{Deserialize, Serialize};

use super::{CommandKind, Status};

/// A control message exchanged over the framing layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Server greeting, sent once on accept
    Connection(Greeting),

    /// Client request
    Command(CommandRequest),

    /// Reply to a command
    Response(Response),

    /// Precedes `size` raw bytes of file content
    FileTransferStart(TransferStart),

    /// Follows the raw bytes
    FileTransferComplete(TransferComplete),
}

impl Message {
    /// The wire `type` tag, for logging and error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Connection(_) => "connection",
            Message::Command(_) => "command",
            Message::Response(_) => "response",
            Message::FileTransferStart(_) => "file_transfer_start",
            Message::FileTransferComplete(_) => "file_transfer_complete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Greeting {
    pub code: u16,
    pub message: String,
}

impl Greeting {
    pub fn welcome() -> Self {
        Self {
            code: Status::Ok.code(),
            message: "Connection established".to_string(),
        }
    }

    pub fn busy() -> Self {
        Self {
            code: Status::ServiceUnavailable.code(),
            message: "Server busy".to_string(),
        }
    }
}

/// A command as sent on the wire
///
/// `command` stays a string so unknown keywords still decode and can be
/// answered with a 400.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandRequest {
    pub command: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl CommandRequest {
    pub fn new(kind: CommandKind, filename: Option<String>) -> Self {
        Self {
            command: kind.as_str().to_string(),
            filename,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Response {
    pub code: u16,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

/// Extra payload carried by an LS reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseData {
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransferStart {
    pub filename: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransferComplete {
    pub bytes_sent: u64,
}

impl From<Greeting> for Message {
    fn from(g: Greeting) -> Self {
        Message::Connection(g)
    }
}

impl From<CommandRequest> for Message {
    fn from(c: CommandRequest) -> Self {
        Message::Command(c)
    }
}

impl From<Response> for Message {
    fn from(r: Response) -> Self {
        Message::Response(r)
    }
}
