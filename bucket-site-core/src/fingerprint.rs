//! Content fingerprints that reproduce S3 ETags.
//!
//! S3 computes the ETag of an object uploaded with a single PUT as the MD5 of
//! its body. For multipart uploads it hashes every part, hashes the
//! concatenated binary part digests again and appends `-<part count>`.
//! Computing the same value locally lets a sync pass skip files whose remote
//! copy is already current.

use md5::{Digest, Md5};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Chunk size used for fingerprints, the multipart threshold and the part size.
pub const CHUNK_SIZE: u64 = 8 * 1024 * 1024;

/// ETag S3 reports for an object with an empty body.
const EMPTY_CONTENT_ETAG: &str = "\"d41d8cd98f00b204e9800998ecf8427e\"";

/// A quoted, lowercase ETag-compatible fingerprint such as `"9e107d9d372bb6826bd81d3542a419d6"`
/// or `"3b5d3c7d207e37dceeedd301e35e2e58-3"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Normalise an ETag as returned by a store. Some S3-compatible services drop
    /// the surrounding quotes or return upper-case hex; both compare equal here.
    pub fn parse(raw: &str) -> Self {
        let bare = raw.trim().trim_matches('"').to_ascii_lowercase();
        Fingerprint(format!("\"{bare}\""))
    }

    /// Fingerprint S3 assigns to an empty object.
    pub fn empty_content() -> Self {
        Fingerprint(EMPTY_CONTENT_ETAG.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of parts for a multipart fingerprint, `None` for a single-part one.
    pub fn part_count(&self) -> Option<usize> {
        let bare = self.0.trim_matches('"');
        let (_, count) = bare.rsplit_once('-')?;
        count.parse().ok()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a file of `size` bytes must be uploaded in parts of `chunk_size`.
///
/// Must agree with [`fingerprint_reader`]: a file of exactly one chunk gets a
/// plain MD5 fingerprint, so it has to go up with a single PUT.
pub fn is_multipart(size: u64, chunk_size: u64) -> bool {
    size > chunk_size
}

/// Fingerprint the file at `path` with the standard [`CHUNK_SIZE`].
///
/// Returns `Ok(None)` for a zero-byte file.
pub fn fingerprint(path: &Path) -> io::Result<Option<Fingerprint>> {
    fingerprint_with_chunk_size(path, CHUNK_SIZE)
}

/// Fingerprint the file at `path` with an explicit chunk size.
pub fn fingerprint_with_chunk_size(path: &Path, chunk_size: u64) -> io::Result<Option<Fingerprint>> {
    let file = File::open(path)?;
    fingerprint_reader(file, chunk_size)
}

/// Fingerprint everything `reader` yields, split into `chunk_size` chunks.
pub fn fingerprint_reader<R: Read>(mut reader: R, chunk_size: u64) -> io::Result<Option<Fingerprint>> {
    if chunk_size == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "chunk size must be greater than zero",
        ));
    }

    let mut digests = Vec::new();
    loop {
        let mut hasher = Md5::new();
        let read = io::copy(&mut (&mut reader).take(chunk_size), &mut hasher)?;
        if read == 0 {
            break;
        }
        digests.push(hasher.finalize());
        if read < chunk_size {
            break;
        }
    }

    let fingerprint = match digests.as_slice() {
        [] => return Ok(None),
        [single] => format!("\"{:x}\"", single),
        parts => {
            let mut combined = Md5::new();
            for digest in parts {
                combined.update(digest);
            }
            format!("\"{:x}-{}\"", combined.finalize(), parts.len())
        }
    };
    Ok(Some(Fingerprint(fingerprint)))
}
