//! Served directory
//!
//! The only resource shared between connections.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{FileportError, Result};
use super::names::{validate_filename, STAGING_PREFIX};
use super::StagedFile;

/// A flat directory of files exposed to clients
///
/// ## Concurrency
/// - Listings and reads take no locks.
/// - Uploads are staged and renamed into place, so a reader sees either the
///   old or the new file, never a partial one.
/// - Writers of the same name are serialized through `write_slot`; the last
///   one to commit wins.
pub struct Directory {
    root: PathBuf,

    /// One lock per filename with a write in progress
    write_slots: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Directory {
    /// Open (creating if needed) the directory at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| FileportError::local(format!("creating {}", root.display()), e))?;

        Ok(Self {
            root,
            write_slots: Mutex::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of the regular files in the directory, sorted
    ///
    /// Subdirectories and in-flight uploads are left out.
    pub fn list_files(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| FileportError::local(format!("reading {}", self.root.display()), e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| FileportError::local(format!("reading {}", self.root.display()), e))?;

            // Entries removed between read_dir and here are skipped
            let is_file = match entry.file_type() {
                Ok(t) => t.is_file(),
                Err(_) => continue,
            };
            if !is_file {
                continue;
            }

            let Ok(name) = entry.file_name().into_string() else {
                tracing::debug!("Skipping non UTF-8 file name {:?}", entry.file_name());
                continue;
            };
            if name.starts_with(STAGING_PREFIX) {
                continue;
            }
            files.push(name);
        }

        files.sort();
        Ok(files)
    }

    /// Validate `name` and join it to the directory
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        Ok(self.root.join(validate_filename(name)?))
    }

    /// Open a file for reading, returning the handle and its size
    ///
    /// A missing file maps to `io::ErrorKind::NotFound` inside `LocalIo`.
    pub fn open_file(&self, name: &str) -> Result<(File, u64)> {
        let path = self.resolve(name)?;
        let context = || format!("opening {}", path.display());

        let file = File::open(&path).map_err(|e| FileportError::local(context(), e))?;
        let meta = file.metadata().map_err(|e| FileportError::local(context(), e))?;
        if !meta.is_file() {
            return Err(FileportError::local(
                context(),
                io::Error::new(io::ErrorKind::NotFound, "not a regular file"),
            ));
        }

        Ok((file, meta.len()))
    }

    /// Start an upload of `name`; nothing is visible until `commit`
    pub fn stage(&self, name: &str) -> Result<StagedFile> {
        StagedFile::new(self.resolve(name)?)
    }

    /// The lock serializing writers of `name`
    ///
    /// Hand it back through `release_write_slot` once the write is done.
    pub fn write_slot(&self, name: &str) -> Arc<Mutex<()>> {
        let mut slots = self.write_slots.lock();
        Arc::clone(slots.entry(name.to_string()).or_default())
    }

    /// Drop a slot taken with `write_slot`, forgetting it if no one else holds it
    pub fn release_write_slot(&self, name: &str, slot: Arc<Mutex<()>>) {
        drop(slot);

        // Clones are only handed out under the map lock, so a count of one
        // here means the map holds the last reference
        let mut slots = self.write_slots.lock();
        if slots.get(name).is_some_and(|s| Arc::strong_count(s) == 1) {
            slots.remove(name);
        }
    }
}
