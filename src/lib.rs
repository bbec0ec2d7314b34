//! # fileport
//!
//! A small remote file-access service:
//! - Length-prefixed JSON control messages over TCP
//! - Whole-file transfers as raw byte streams between two control messages
//! - LS / GET / PUT / QUIT over one flat directory
//! - Thread-per-connection server with staged, atomic uploads
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │               (one thread per connection)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                Command State Machine                         │
//! │            (Connection / Client, one request)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Protocol   │◄─────────│  Transfer   │
//!   │ frame+codec │          │ send / recv │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │   Storage   │
//!                           │ (Directory) │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod transfer;
pub mod storage;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FileportError, Result};
pub use config::{Config, Limits};
pub use network::{Client, Server};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of fileport
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
