//! Sync pass: load manifest → walk → diff → upload.
//!
//! This module pushes a local directory into a bucket, uploading only files
//! whose fingerprint differs from the remote manifest. A pass keeps no state
//! between calls, so running it twice over an unchanged tree uploads nothing
//! the second time.
//!
//! # Error Handling
//! - The local root is validated before any remote call; a bad root is a [`SyncError`].
//! - A failed listing page leaves a partial manifest and is recorded in the report.
//! - Fingerprint and upload failures are per file: they are logged, collected in
//!   [`SynchroniseReport::failed`] and the pass moves on.
//!
//! # Navigation
//! - Main entrypoint: [`synchronise`]
//! - Pure diff step: [`plan_file`]

use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::content_type::guess_content_type;
use crate::contract::ObjectStore;
use crate::error::{FileError, StoreError, SyncError};
use crate::fingerprint::{fingerprint_with_chunk_size, Fingerprint, CHUNK_SIZE};
use crate::manifest::{load_manifest, Manifest};
use crate::walk::{local_files, resolve_root, LocalFile};

/// Everything a sync pass needs from the outside, passed in explicitly.
pub struct SyncContext<'a> {
    pub store: &'a dyn ObjectStore,
    /// Chunk size for fingerprints and multipart uploads; must match on both sides.
    pub chunk_size: u64,
}

impl<'a> SyncContext<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self {
            store,
            chunk_size: CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}

/// Decision for a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Skip,
    Upload,
}

/// What happened during one pass.
#[derive(Debug, Default)]
pub struct SynchroniseReport {
    pub bucket: String,
    pub root: PathBuf,
    pub uploaded: Vec<String>,
    pub unchanged: Vec<String>,
    pub failed: Vec<FileError>,
    /// Listing error, when the manifest could only be loaded partially.
    pub listing_error: Option<StoreError>,
}

impl SynchroniseReport {
    /// True when every file was either uploaded or confirmed unchanged.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.listing_error.is_none()
    }
}

/// Compare a local fingerprint with the manifest entry for `key`.
///
/// A zero-byte file has no fingerprint; it counts as unchanged only when the
/// remote object holds the ETag of empty content.
pub fn plan_file(manifest: &Manifest, key: &str, local: Option<&Fingerprint>) -> FileAction {
    match (local, manifest.get(key)) {
        (_, None) => FileAction::Upload,
        (Some(local), Some(remote)) if local == remote => FileAction::Skip,
        (None, Some(remote)) if *remote == Fingerprint::empty_content() => FileAction::Skip,
        _ => FileAction::Upload,
    }
}

/// Synchronise the directory at `local_root` into `bucket`.
pub async fn synchronise(
    ctx: &SyncContext<'_>,
    local_root: &Path,
    bucket: &str,
) -> Result<SynchroniseReport, SyncError> {
    let root = resolve_root(local_root)?;
    info!(root = %root.display(), bucket, "[SYNC] Starting synchronisation");

    let listing = load_manifest(ctx.store, bucket).await;
    let mut report = SynchroniseReport {
        bucket: bucket.to_string(),
        root: root.clone(),
        listing_error: listing.error,
        ..Default::default()
    };

    for entry in local_files(&root) {
        let file = match entry {
            Ok(file) => file,
            Err(e) => {
                report.failed.push(e);
                continue;
            }
        };

        match sync_file(ctx, &listing.manifest, bucket, &file).await {
            Ok(FileAction::Skip) => {
                info!(key = %file.key, "[SYNC] Fingerprint unchanged, no need to upload");
                report.unchanged.push(file.key);
            }
            Ok(FileAction::Upload) => report.uploaded.push(file.key),
            Err(e) => {
                error!(key = %file.key, error = %e, "[SYNC][ERROR] File could not be synchronised");
                report.failed.push(e);
            }
        }
    }

    if report.is_clean() {
        info!(
            uploaded = report.uploaded.len(),
            unchanged = report.unchanged.len(),
            "[SYNC] Synchronisation complete"
        );
    } else {
        warn!(
            uploaded = report.uploaded.len(),
            unchanged = report.unchanged.len(),
            failed = report.failed.len(),
            listing_failed = report.listing_error.is_some(),
            "[SYNC] Synchronisation finished with errors"
        );
    }
    Ok(report)
}

async fn sync_file(
    ctx: &SyncContext<'_>,
    manifest: &Manifest,
    bucket: &str,
    file: &LocalFile,
) -> Result<FileAction, FileError> {
    let local = fingerprint_with_chunk_size(&file.path, ctx.chunk_size).map_err(|source| {
        FileError::Fingerprint {
            key: file.key.clone(),
            source,
        }
    })?;

    let action = plan_file(manifest, &file.key, local.as_ref());
    if action == FileAction::Skip {
        return Ok(action);
    }

    let content_type = guess_content_type(&file.key);
    info!(
        key = %file.key,
        content_type,
        fingerprint = local.as_ref().map(Fingerprint::as_str).unwrap_or("<empty>"),
        "[SYNC][UPLOAD] Missing or changed remotely, uploading"
    );
    ctx.store
        .upload(bucket, &file.key, &file.path, content_type, ctx.chunk_size)
        .await
        .map_err(|source| FileError::Upload {
            key: file.key.clone(),
            source,
        })?;
    Ok(action)
}
