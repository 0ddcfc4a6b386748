//! Error types shared by the sync and setup paths.
//!
//! The split follows who can recover from what:
//! - [`StoreError`] is what a storage collaborator returns for a single call.
//! - [`FileError`] is a per-file failure inside a sync pass; it is recorded in
//!   the report and the pass moves on to the next file.
//! - [`SyncError`] aborts a sync before any file is touched.
//! - [`SetupError`] aborts bucket setup.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single call against the object store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{operation} failed: {message}")]
    Remote {
        operation: &'static str,
        message: String,
    },
    #[error("local I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn remote(operation: &'static str, message: impl Into<String>) -> Self {
        StoreError::Remote {
            operation,
            message: message.into(),
        }
    }
}

/// Fatal errors of a sync pass. All of them are raised before the first remote call.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("local path {} does not exist", .0.display())]
    MissingRoot(PathBuf),
    #[error("local path {} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("could not resolve local path {}: {source}", path.display())]
    Resolve {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Recoverable failure for one local file.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("could not read directory entry under {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("file name of {} is not valid UTF-8 and cannot be used as an object key", path.display())]
    NonUtf8Key { path: PathBuf },
    #[error("could not fingerprint {key}: {source}")]
    Fingerprint {
        key: String,
        source: std::io::Error,
    },
    #[error("could not upload {key}: {source}")]
    Upload { key: String, source: StoreError },
}

impl FileError {
    /// Object key of the file the error belongs to, when one was derived.
    pub fn key(&self) -> Option<&str> {
        match self {
            FileError::Walk { .. } | FileError::NonUtf8Key { .. } => None,
            FileError::Fingerprint { key, .. } | FileError::Upload { key, .. } => Some(key),
        }
    }
}

/// Fatal errors of the bucket setup path.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("bucket {0} already exists and is owned by another account")]
    BucketTaken(String),
    #[error("could not create bucket {bucket}: {source}")]
    Create { bucket: String, source: StoreError },
    #[error("could not lift the public access block on {bucket}: {source}")]
    PublicAccess { bucket: String, source: StoreError },
    #[error("could not apply the public read policy to {bucket}: {source}")]
    Policy { bucket: String, source: StoreError },
    #[error("could not enable website hosting on {bucket}: {source}")]
    Website { bucket: String, source: StoreError },
}
