//! Response definitions
//!
//! Status codes and the replies built from them.

use super::message::{Response, ResponseData};

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Status {
    Ok = 200,
    BadRequest = 400,
    NotFound = 404,
    ServerError = 500,
    ServiceUnavailable = 503,
}

impl Status {
    pub fn code(self) -> u16 {
        self as u16
    }
}

impl Response {
    fn with_status(status: Status, message: impl Into<String>) -> Self {
        Self {
            code: status.code(),
            message: message.into(),
            data: None,
        }
    }

    /// Create a 200 response with a message
    pub fn ok(message: impl Into<String>) -> Self {
        Self::with_status(Status::Ok, message)
    }

    /// Create a 200 LS response carrying file names
    pub fn listing(files: Vec<String>) -> Self {
        Self {
            data: Some(ResponseData { files }),
            ..Self::ok("OK")
        }
    }

    /// PUT accepted, the upload may begin
    pub fn ready() -> Self {
        Self::ok("Ready to receive file")
    }

    /// PUT finished and the file is in place
    pub fn stored() -> Self {
        Self::ok("File stored")
    }

    pub fn goodbye() -> Self {
        Self::ok("Goodbye")
    }

    /// Create a 400 response
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(Status::BadRequest, message)
    }

    /// Create a 404 response for a missing file
    pub fn not_found(filename: &str) -> Self {
        Self::with_status(Status::NotFound, format!("File Not Found: {}", filename))
    }

    /// Create a 500 response
    pub fn server_error(message: impl Into<String>) -> Self {
        Self::with_status(Status::ServerError, message)
    }

    pub fn is_ok(&self) -> bool {
        self.code == Status::Ok.code()
    }

    /// File names from an LS reply (empty when absent)
    pub fn files(&self) -> &[String] {
        self.data.as_ref().map(|d| d.files.as_slice()).unwrap_or(&[])
    }
}
