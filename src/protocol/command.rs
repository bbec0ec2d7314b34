//! Command definitions
//!
//! The command keywords a client may send.

use std::fmt;
use std::str::FromStr;

use crate::error::FileportError;

/// Command keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// List files in the server directory
    Ls,

    /// Download a file
    Get,

    /// Upload a file
    Put,

    /// End the session
    Quit,
}

impl CommandKind {
    /// Normalized (upper-case) wire keyword
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Ls => "LS",
            CommandKind::Get => "GET",
            CommandKind::Put => "PUT",
            CommandKind::Quit => "QUIT",
        }
    }

    /// Whether the command needs a `filename`
    pub fn takes_filename(&self) -> bool {
        matches!(self, CommandKind::Get | CommandKind::Put)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = FileportError;

    /// Case-insensitive; surrounding whitespace is ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LS" => Ok(CommandKind::Ls),
            "GET" => Ok(CommandKind::Get),
            "PUT" => Ok(CommandKind::Put),
            "QUIT" => Ok(CommandKind::Quit),
            other => Err(FileportError::Protocol(format!(
                "Invalid Command, command: \"{}\" unknown.",
                other
            ))),
        }
    }
}
