//! Storage Module
//!
//! Filesystem side of the service.
//!
//! ## Responsibilities
//! - List and open files in the served directory
//! - Validate filenames arriving from the wire
//! - Stage uploads and rename them into place atomically
//! - Serialize concurrent writers of the same filename

mod directory;
mod names;
mod staged;

pub use directory::Directory;
pub use names::{validate_filename, STAGING_PREFIX};
pub use staged::StagedFile;
