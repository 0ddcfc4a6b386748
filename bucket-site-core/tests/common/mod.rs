#![allow(dead_code)]

use async_trait::async_trait;
use bucket_site_core::contract::{ObjectPage, ObjectStore, ObjectSummary};
use bucket_site_core::error::StoreError;
use bucket_site_core::fingerprint::{fingerprint_reader, Fingerprint};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub etag: String,
    pub content_type: String,
}

/// In-memory bucket that assigns ETags the way S3 does for the chunk size
/// each upload was made with, and lists keys in pages of `page_size`.
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    uploads: Mutex<Vec<String>>,
    failing_keys: HashSet<String>,
    page_size: usize,
    list_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_page_size(1000)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            uploads: Mutex::new(Vec::new()),
            failing_keys: HashSet::new(),
            page_size,
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Make every upload of `key` fail.
    pub fn failing_on(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    /// Seed an object as if it had been uploaded with a single PUT.
    pub fn seed(&self, key: &str, body: &[u8]) {
        let etag = etag_for(body, u64::MAX);
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                body: body.to_vec(),
                etag,
                content_type: "text/plain".to_string(),
            },
        );
    }

    /// Seed an object with an arbitrary raw ETag.
    pub fn seed_etag(&self, key: &str, etag: &str) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                body: Vec::new(),
                etag: etag.to_string(),
                content_type: "text/plain".to_string(),
            },
        );
    }

    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn clear_uploads(&self) {
        self.uploads.lock().unwrap().clear();
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

fn etag_for(body: &[u8], chunk_size: u64) -> String {
    fingerprint_reader(body, chunk_size)
        .expect("in-memory read")
        .unwrap_or_else(Fingerprint::empty_content)
        .as_str()
        .to_string()
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_objects(
        &self,
        _bucket: &str,
        continuation: Option<String>,
    ) -> Result<ObjectPage, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let objects = self.objects.lock().unwrap();
        let remaining: Vec<(&String, &StoredObject)> = match &continuation {
            Some(after) => objects
                .iter()
                .filter(|(key, _)| key.as_str() > after.as_str())
                .collect(),
            None => objects.iter().collect(),
        };

        let page: Vec<ObjectSummary> = remaining
            .iter()
            .take(self.page_size)
            .map(|(key, object)| ObjectSummary {
                key: key.to_string(),
                etag: Some(object.etag.clone()),
                size: object.body.len() as i64,
            })
            .collect();
        let next_continuation = if remaining.len() > self.page_size {
            page.last().map(|object| object.key.clone())
        } else {
            None
        };
        Ok(ObjectPage {
            objects: page,
            next_continuation,
        })
    }

    async fn upload(
        &self,
        _bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
        chunk_size: u64,
    ) -> Result<(), StoreError> {
        self.uploads.lock().unwrap().push(key.to_string());
        if self.failing_keys.contains(key) {
            return Err(StoreError::remote("PutObject", "injected failure"));
        }
        let body = std::fs::read(path)?;
        let etag = etag_for(&body, chunk_size);
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                body,
                etag,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}

/// Write `files` (relative path, content) under `root`, creating parent directories.
pub fn write_tree(root: &Path, files: &[(&str, &[u8])]) {
    for (relative, content) in files {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }
}
