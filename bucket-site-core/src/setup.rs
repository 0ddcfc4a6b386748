//! Bucket setup for static website hosting: create (or adopt) the bucket,
//! open it for anonymous reads and enable the website endpoint.
//!
//! Every step is fatal on failure; the only tolerated "error" is a bucket that
//! already exists and belongs to the caller.

use serde_json::json;
use tracing::{error, info};

use crate::config::WebsiteConfig;
use crate::contract::{BucketAdmin, CreateOutcome};
use crate::error::{SetupError, StoreError};
use crate::website::bucket_url;

/// How the bucket came to be available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStatus {
    Created,
    AlreadyOwned,
}

/// Policy document granting anonymous `s3:GetObject` on every key of `bucket`.
pub fn public_read_policy(bucket: &str) -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Sid": "PublicReadGetObject",
            "Effect": "Allow",
            "Principal": "*",
            "Action": ["s3:GetObject"],
            "Resource": [format!("arn:aws:s3:::{bucket}/*")]
        }]
    })
    .to_string()
}

pub async fn setup_bucket(
    admin: &dyn BucketAdmin,
    bucket: &str,
    region: &str,
    website: &WebsiteConfig,
) -> Result<BucketStatus, SetupError> {
    info!(bucket, region, "[SETUP] Creating bucket");
    let status = match admin.create_bucket(bucket, region).await {
        Ok(CreateOutcome::Created) => BucketStatus::Created,
        Ok(CreateOutcome::AlreadyOwnedByYou) => {
            info!(bucket, "[SETUP] Bucket already exists and is owned by you, reusing it");
            BucketStatus::AlreadyOwned
        }
        Ok(CreateOutcome::AlreadyExists) => {
            error!(bucket, "[SETUP][ERROR] Bucket name is taken by another account");
            return Err(SetupError::BucketTaken(bucket.to_string()));
        }
        Err(source) => {
            error!(bucket, error = %source, "[SETUP][ERROR] create_bucket failed");
            return Err(SetupError::Create {
                bucket: bucket.to_string(),
                source,
            });
        }
    };

    admin
        .allow_public_access(bucket)
        .await
        .map_err(|source| {
            error!(bucket, error = %source, "[SETUP][ERROR] allow_public_access failed");
            SetupError::PublicAccess {
                bucket: bucket.to_string(),
                source,
            }
        })?;

    let policy = public_read_policy(bucket);
    admin
        .put_bucket_policy(bucket, &policy)
        .await
        .map_err(|source| {
            error!(bucket, error = %source, "[SETUP][ERROR] put_bucket_policy failed");
            SetupError::Policy {
                bucket: bucket.to_string(),
                source,
            }
        })?;
    info!(bucket, "[SETUP] Public read policy applied");

    admin
        .put_bucket_website(bucket, website)
        .await
        .map_err(|source| {
            error!(bucket, error = %source, "[SETUP][ERROR] put_bucket_website failed");
            SetupError::Website {
                bucket: bucket.to_string(),
                source,
            }
        })?;
    info!(
        bucket,
        index = %website.index_document,
        error_document = %website.error_document,
        "[SETUP] Website hosting enabled"
    );

    Ok(status)
}

/// Public website URL of `bucket`, built from the region the bucket actually
/// lives in rather than the session's region.
pub async fn site_url(admin: &dyn BucketAdmin, bucket: &str) -> Result<String, StoreError> {
    let region = admin.get_bucket_region(bucket).await?;
    Ok(bucket_url(bucket, &region))
}
