//! The remote manifest: object key → fingerprint, built from a full bucket
//! listing at the start of a sync pass and dropped when the pass ends.

use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::contract::{ObjectStore, ObjectSummary};
use crate::error::StoreError;
use crate::fingerprint::Fingerprint;

#[derive(Debug, Default, Clone)]
pub struct Manifest {
    entries: HashMap<String, Fingerprint>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, fingerprint: Fingerprint) {
        self.entries.insert(key.into(), fingerprint);
    }

    pub fn get(&self, key: &str) -> Option<&Fingerprint> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add every listed object that carries an ETag; objects without one are
    /// left out, so a local file with that key is always uploaded.
    pub fn extend_from_objects<I>(&mut self, objects: I)
    where
        I: IntoIterator<Item = ObjectSummary>,
    {
        for object in objects {
            match object.etag {
                Some(etag) => self.insert(object.key, Fingerprint::parse(&etag)),
                None => debug!(key = %object.key, "Listed object has no ETag"),
            }
        }
    }
}

impl FromIterator<(String, Fingerprint)> for Manifest {
    fn from_iter<T: IntoIterator<Item = (String, Fingerprint)>>(iter: T) -> Self {
        Manifest {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Outcome of listing a bucket into a manifest.
#[derive(Debug)]
pub struct ManifestListing {
    pub manifest: Manifest,
    /// Pages fetched successfully.
    pub pages: usize,
    /// Set when a page request failed; `manifest` then holds the earlier pages only.
    pub error: Option<StoreError>,
}

/// List every object in `bucket`, following continuation tokens until the
/// store stops returning one.
///
/// A failed page does not fail the load: the entries gathered so far are
/// returned together with the error, and keys missing from the partial
/// manifest will simply be uploaded again.
pub async fn load_manifest(store: &dyn ObjectStore, bucket: &str) -> ManifestListing {
    let mut manifest = Manifest::new();
    let mut pages = 0;
    let mut continuation = None;

    loop {
        match store.list_objects(bucket, continuation.take()).await {
            Ok(page) => {
                pages += 1;
                debug!(bucket, page = pages, objects = page.objects.len(), "Listed manifest page");
                manifest.extend_from_objects(page.objects);
                match page.next_continuation {
                    Some(token) => continuation = Some(token),
                    None => break,
                }
            }
            Err(e) => {
                warn!(bucket, page = pages + 1, error = %e, "Listing bucket failed; continuing with a partial manifest");
                return ManifestListing {
                    manifest,
                    pages,
                    error: Some(e),
                };
            }
        }
    }

    info!(bucket, pages, entries = manifest.len(), "Loaded remote manifest");
    ManifestListing {
        manifest,
        pages,
        error: None,
    }
}

/// Every object in `bucket`, in listing order. Unlike [`load_manifest`], the
/// first failed page fails the whole call.
pub async fn list_all_objects(
    store: &dyn ObjectStore,
    bucket: &str,
) -> Result<Vec<ObjectSummary>, StoreError> {
    let mut objects = Vec::new();
    let mut continuation = None;
    loop {
        let page = store.list_objects(bucket, continuation.take()).await?;
        objects.extend(page.objects);
        match page.next_continuation {
            Some(token) => continuation = Some(token),
            None => return Ok(objects),
        }
    }
}
