//! Local directory traversal.
//!
//! [`local_files`] yields every regular file under a root as a [`LocalFile`]
//! carrying the object key it maps to. The walk is lazy and knows nothing
//! about the remote side, so traversal and diffing can be tested apart.
//!
//! Symlinks below the root: links to regular files are yielded (their content
//! is read through the link), links to directories are not descended into.

use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{FileError, SyncError};

/// A regular file found under the sync root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    /// Root-relative path joined with `/`.
    pub key: String,
}

/// Expand a leading `~`, then check that `path` exists and is a directory and
/// return its canonical (absolute, symlink-free) form.
pub fn resolve_root(path: &Path) -> Result<PathBuf, SyncError> {
    let expanded = expand_home(path);
    if !expanded.exists() {
        return Err(SyncError::MissingRoot(expanded));
    }
    let resolved = fs::canonicalize(&expanded).map_err(|source| SyncError::Resolve {
        path: expanded.clone(),
        source,
    })?;
    if !resolved.is_dir() {
        return Err(SyncError::NotADirectory(resolved));
    }
    Ok(resolved)
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

/// Object key for `path` relative to `root`, using `/` whatever the platform separator.
///
/// Returns `Ok(None)` for the root itself or a path outside it. Object keys
/// are UTF-8, so a path segment that is not valid UTF-8 is an error rather
/// than a lossy key that could collide with another file's.
pub fn key_for(root: &Path, path: &Path) -> Result<Option<String>, FileError> {
    let Ok(relative) = path.strip_prefix(root) else {
        return Ok(None);
    };
    let mut segments = Vec::new();
    for component in relative.components() {
        if let Component::Normal(segment) = component {
            let segment = segment.to_str().ok_or_else(|| FileError::NonUtf8Key {
                path: path.to_path_buf(),
            })?;
            segments.push(segment);
        }
    }
    if segments.is_empty() {
        Ok(None)
    } else {
        Ok(Some(segments.join("/")))
    }
}

/// Lazily enumerate regular files under `root`, depth-first, entries sorted by name.
pub fn local_files(root: &Path) -> LocalFiles {
    LocalFiles {
        root: root.to_path_buf(),
        inner: WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter(),
    }
}

pub struct LocalFiles {
    root: PathBuf,
    inner: walkdir::IntoIter,
}

impl LocalFiles {
    fn to_local_file(&self, path: &Path) -> Option<Result<LocalFile, FileError>> {
        let key = match key_for(&self.root, path).transpose()? {
            Ok(key) => key,
            Err(e) => {
                warn!(path = %path.display(), "File name is not valid UTF-8, skipping");
                return Some(Err(e));
            }
        };
        Some(Ok(LocalFile {
            path: path.to_path_buf(),
            key,
        }))
    }
}

impl Iterator for LocalFiles {
    type Item = Result<LocalFile, FileError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(source) => {
                    let path = source
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    warn!(path = %path.display(), error = %source, "Failed to read directory entry");
                    return Some(Err(FileError::Walk { path, source }));
                }
            };

            let file_type = entry.file_type();
            if file_type.is_file() {
                if let Some(file) = self.to_local_file(entry.path()) {
                    return Some(file);
                }
                continue;
            }

            if file_type.is_symlink() {
                match fs::metadata(entry.path()) {
                    Ok(target) if target.is_file() => {
                        if let Some(file) = self.to_local_file(entry.path()) {
                            return Some(file);
                        }
                    }
                    Ok(target) if target.is_dir() => {
                        debug!(path = %entry.path().display(), "Not descending into symlinked directory");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        debug!(path = %entry.path().display(), error = %e, "Skipping dangling symlink");
                    }
                }
            }
        }
    }
}
