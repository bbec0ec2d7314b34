//! Configuration for fileport
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{FileportError, Result};

/// Main configuration shared by the server and client
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory exposed by the server (flat, no subdirectories)
    /// Upload staging files live here too, hidden from listings:
    ///   {root_dir}/
    ///     ├── a.txt
    ///     └── .fileport-XXXXXX   (in-flight upload)
    pub root_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = wait forever)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = wait forever)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Protocol Limits
    // -------------------------------------------------------------------------
    /// Largest control frame accepted from a peer (bytes)
    pub max_frame_size: usize,

    /// Largest file accepted in a single transfer (bytes)
    pub max_transfer_size: u64,
}

/// Bounds applied to data arriving from a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_frame_size: usize,
    pub max_transfer_size: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_frame_size: 16 * 1024 * 1024,        // 16 MB
            max_transfer_size: 4 * 1024 * 1024 * 1024, // 4 GB
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let limits = Limits::default();
        Self {
            root_dir: PathBuf::from("./server_files"),
            listen_addr: "127.0.0.1:5002".to_string(),
            max_connections: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            max_frame_size: limits.max_frame_size,
            max_transfer_size: limits.max_transfer_size,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(FileportError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        // A frame must at least hold the smallest JSON object
        if self.max_frame_size < 2 {
            return Err(FileportError::Config(format!(
                "max_frame_size too small: {} bytes",
                self.max_frame_size
            )));
        }
        if self.listen_addr.is_empty() {
            return Err(FileportError::Config("listen_addr is empty".to_string()));
        }
        Ok(())
    }

    /// Protocol limits derived from this config
    pub fn limits(&self) -> Limits {
        Limits {
            max_frame_size: self.max_frame_size,
            max_transfer_size: self.max_transfer_size,
        }
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the served directory
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.root_dir = path.into();
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the largest accepted control frame (in bytes)
    pub fn max_frame_size(mut self, bytes: usize) -> Self {
        self.config.max_frame_size = bytes;
        self
    }

    /// Set the largest accepted file transfer (in bytes)
    pub fn max_transfer_size(mut self, bytes: u64) -> Self {
        self.config.max_transfer_size = bytes;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
