//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬─────────────────────────────┐
//! │ Len (4)  │      JSON payload           │
//! └──────────┴─────────────────────────────┘
//! ```
//!
//! ### Message Types (`type` key)
//! - connection:             server greeting {code, message}
//! - command:                {command, filename?}
//! - response:               {code, message, data?: {files}}
//! - file_transfer_start:    {filename, size}, then `size` raw bytes
//! - file_transfer_complete: {bytes_sent}
//!
//! ### Status Codes
//! - 200: OK / Ready / File stored / Goodbye
//! - 400: bad request, unknown command, missing filename
//! - 404: file not found
//! - 500: server-side file error
//! - 503: server busy (greeting only)

mod command;
mod response;
mod message;
mod codec;
pub mod frame;

pub use command::CommandKind;
pub use response::Status;
pub use message::{
    CommandRequest, Greeting, Message, Response, ResponseData, TransferComplete, TransferStart,
};
pub use codec::{decode, encode, read_message, write_message};
pub use frame::{read_frame, write_frame};
