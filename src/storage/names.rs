//! Filename validation
//!
//! Names arrive from the wire and are joined to the served directory, so
//! only a single plain path component is accepted.

use std::path::{Component, Path};

use crate::error::{FileportError, Result};

/// Prefix of in-flight upload files
pub const STAGING_PREFIX: &str = ".fileport-";

/// Check that `name` is one plain file name inside the served directory
///
/// Rejects: empty, NUL bytes, `/` or `\`, `.` and `..`, absolute paths,
/// and names that collide with staging files.
pub fn validate_filename(name: &str) -> Result<&str> {
    let reject = |why: &str| Err(FileportError::InvalidFilename(format!("{:?}: {}", name, why)));

    if name.is_empty() {
        return reject("empty");
    }
    if name.contains('\0') {
        return reject("contains a null byte");
    }
    // Backslash is rejected on every platform so names mean the same thing
    // to all clients
    if name.contains('/') || name.contains('\\') {
        return reject("contains a path separator");
    }
    if name.starts_with(STAGING_PREFIX) {
        return reject("reserved prefix");
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(name),
        (Some(Component::ParentDir), _) | (Some(Component::CurDir), _) => {
            reject("refers to a directory")
        }
        _ => reject("not a plain file name"),
    }
}
