//! # contract: interfaces to the object store
//!
//! This module defines the two traits through which the core talks to a bucket
//! service, plus the plain data types they exchange:
//!
//! - [`ObjectStore`] is everything a sync pass needs: paginated listing and
//!   uploading one local file under one key.
//! - [`BucketAdmin`] is the setup path: creating a bucket, opening it for
//!   public reads and turning on website hosting.
//!
//! ## Mocking & Testing
//! Both traits are annotated for `mockall`; `MockObjectStore` and
//! `MockBucketAdmin` are exported under the `test-export-mocks` feature so
//! integration tests in this crate and in dependents can script remote behaviour.
//!
//! ## Implementing a store
//! - `list_objects` returns one page and the token for the next one; the core
//!   keeps calling until no token comes back.
//! - `upload` must split files larger than `chunk_size` into parts of exactly
//!   `chunk_size` bytes, otherwise remote ETags will never match local
//!   fingerprints.

use async_trait::async_trait;
use std::path::Path;

use crate::config::WebsiteConfig;
use crate::error::StoreError;

/// One listed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    /// Raw ETag as returned by the store, usually quoted.
    pub etag: Option<String>,
    pub size: i64,
}

/// A page of a bucket listing.
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    pub objects: Vec<ObjectSummary>,
    /// Token for the following page; `None` once the listing is exhausted.
    pub next_continuation: Option<String>,
}

/// Result of asking the store to create a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// The bucket exists and belongs to the caller.
    AlreadyOwnedByYou,
    /// The name is taken by another account.
    AlreadyExists,
}

/// Listing and upload operations used by a sync pass.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one page of objects in `bucket`, starting after `continuation`.
    async fn list_objects(
        &self,
        bucket: &str,
        continuation: Option<String>,
    ) -> Result<ObjectPage, StoreError>;

    /// Upload the file at `path` as `key`, switching to multipart transfer with
    /// parts of `chunk_size` bytes when the file is larger than `chunk_size`.
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
        chunk_size: u64,
    ) -> Result<(), StoreError>;
}

/// Bucket-level administration used by `setup-bucket` and the listing commands.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait BucketAdmin: Send + Sync {
    /// Names of all buckets visible to the caller.
    async fn list_buckets(&self) -> Result<Vec<String>, StoreError>;

    /// Create `bucket` in `region`.
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<CreateOutcome, StoreError>;

    /// Remove the bucket's public access block so a public policy can be attached.
    async fn allow_public_access(&self, bucket: &str) -> Result<(), StoreError>;

    /// Attach a JSON bucket policy document.
    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), StoreError>;

    /// Enable static website hosting with the given documents.
    async fn put_bucket_website(
        &self,
        bucket: &str,
        website: &WebsiteConfig,
    ) -> Result<(), StoreError>;

    /// Region the bucket lives in, normalised (`us-east-1` for the empty constraint).
    async fn get_bucket_region(&self, bucket: &str) -> Result<String, StoreError>;
}
