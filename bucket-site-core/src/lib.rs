#![doc = "bucket-site-core: core logic library for bucket-site."]

//! This crate contains the storage-agnostic logic of bucket-site: content
//! fingerprints compatible with S3 ETags, the remote manifest, the local
//! directory walk and the synchronisation pass that ties them together.
//!
//! The S3 client itself lives in the `bucket-site` crate, which implements the
//! [`contract::ObjectStore`] and [`contract::BucketAdmin`] traits.
//!
//! # Usage
//! Build a [`synchronise::SyncContext`] around any [`contract::ObjectStore`]
//! and call [`synchronise::synchronise`] with a local root and a bucket name.

pub mod config;
pub mod content_type;
pub mod contract;
pub mod error;
pub mod fingerprint;
pub mod manifest;
pub mod setup;
pub mod synchronise;
pub mod walk;
pub mod website;
