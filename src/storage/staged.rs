//! Staged file writes
//!
//! Incoming bytes go to a hidden temporary file in the destination's
//! directory and are renamed into place on commit. Dropping an uncommitted
//! `StagedFile` removes the temporary file.

use std::io::{self, Write};
use std::path::PathBuf;

use tempfile::NamedTempFile;

use crate::error::{FileportError, Result};
use super::names::STAGING_PREFIX;

/// A file being written that is not yet visible at its final path
pub struct StagedFile {
    temp: NamedTempFile,
    dest: PathBuf,
}

impl StagedFile {
    /// Create a staging file next to `dest`
    pub fn new(dest: impl Into<PathBuf>) -> Result<Self> {
        let dest = dest.into();
        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let temp = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(&parent)
            .map_err(|e| {
                FileportError::local(format!("creating staging file in {}", parent.display()), e)
            })?;

        Ok(Self { temp, dest })
    }

    /// Flush and atomically rename into place, replacing any existing file
    pub fn commit(mut self) -> Result<PathBuf> {
        let dest = self.dest.clone();
        self.temp
            .as_file_mut()
            .sync_all()
            .map_err(|e| FileportError::local(format!("syncing {}", dest.display()), e))?;
        self.temp
            .persist(&dest)
            .map_err(|e| FileportError::local(format!("renaming into {}", dest.display()), e.error))?;
        Ok(dest)
    }
}

impl Write for StagedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.temp.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.temp.flush()
    }
}
