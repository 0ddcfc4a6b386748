//! # S3 integration (CLI <-> Core)
//!
//! Bridges the storage traits of [`bucket_site_core::contract`] to Amazon S3
//! through the official AWS SDK. [`S3Client`] implements both
//! [`ObjectStore`] (listing and uploads for `sync`) and [`BucketAdmin`]
//! (bucket creation, policy, website hosting).
//!
//! Credentials and the default region come from the usual AWS chain
//! (environment, shared config files, instance metadata), narrowed to a named
//! profile when `--profile` is given.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CompletedMultipartUpload, CompletedPart, CreateBucketConfiguration,
    ErrorDocument, IndexDocument, WebsiteConfiguration,
};
use aws_sdk_s3::Client;
use std::path::Path;
use tokio::io::AsyncReadExt;

use bucket_site_core::config::WebsiteConfig;
use bucket_site_core::contract::{
    BucketAdmin, CreateOutcome, ObjectPage, ObjectStore, ObjectSummary,
};
use bucket_site_core::error::StoreError;
use bucket_site_core::fingerprint::is_multipart;
use bucket_site_core::website::{normalise_region, DEFAULT_REGION};

use crate::load_config::CliConfig;

pub struct S3Client {
    client: Client,
    region: String,
}

/// Map an SDK error into a [`StoreError`], keeping the full error chain in the message.
fn remote<E: std::error::Error>(operation: &'static str) -> impl FnOnce(E) -> StoreError {
    move |e| StoreError::remote(operation, DisplayErrorContext(&e).to_string())
}

impl S3Client {
    /// Build a client from the AWS credential chain, optionally pinned to `profile`.
    ///
    /// Region precedence: config file / environment override, then the
    /// profile's region, then `us-east-1`.
    pub async fn connect(profile: Option<&str>, config: &CliConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let region = sdk_config
            .region()
            .map(|region| region.as_ref().to_string())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .region(Region::new(region.clone()));
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        tracing::info!(
            profile = profile.unwrap_or("default"),
            %region,
            endpoint = config.endpoint.as_deref().unwrap_or("aws"),
            "Initialised S3 client"
        );

        S3Client {
            client: Client::from_conf(builder.build()),
            region,
        }
    }

    /// Region of the session; new buckets are created here.
    pub fn region(&self) -> &str {
        &self.region
    }

    async fn put_single(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(remote("PutObject"))?;
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(remote("PutObject"))?;
        Ok(())
    }

    async fn put_multipart(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
        chunk_size: u64,
    ) -> Result<(), StoreError> {
        let created = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(remote("CreateMultipartUpload"))?;
        let upload_id = created
            .upload_id()
            .ok_or_else(|| StoreError::remote("CreateMultipartUpload", "no upload id returned"))?
            .to_string();

        match self
            .upload_parts(bucket, key, path, &upload_id, chunk_size)
            .await
        {
            Ok(parts) => {
                self.client
                    .complete_multipart_upload()
                    .bucket(bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .multipart_upload(
                        CompletedMultipartUpload::builder()
                            .set_parts(Some(parts))
                            .build(),
                    )
                    .send()
                    .await
                    .map_err(remote("CompleteMultipartUpload"))?;
                Ok(())
            }
            Err(e) => {
                if let Err(abort) = self
                    .client
                    .abort_multipart_upload()
                    .bucket(bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    tracing::warn!(
                        key,
                        upload_id = %upload_id,
                        error = %DisplayErrorContext(&abort),
                        "Could not abort multipart upload"
                    );
                }
                Err(e)
            }
        }
    }

    /// Upload `path` in parts of exactly `chunk_size` bytes (the last one may be shorter).
    async fn upload_parts(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        upload_id: &str,
        chunk_size: u64,
    ) -> Result<Vec<CompletedPart>, StoreError> {
        let mut file = tokio::fs::File::open(path).await?;
        let mut parts = Vec::new();
        let mut part_number: i32 = 1;
        loop {
            let mut chunk = Vec::new();
            (&mut file).take(chunk_size).read_to_end(&mut chunk).await?;
            if chunk.is_empty() {
                break;
            }
            let uploaded = self
                .client
                .upload_part()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(ByteStream::from(chunk))
                .send()
                .await
                .map_err(remote("UploadPart"))?;
            tracing::debug!(key, part_number, "Uploaded part");
            parts.push(
                CompletedPart::builder()
                    .set_e_tag(uploaded.e_tag().map(str::to_string))
                    .part_number(part_number)
                    .build(),
            );
            part_number += 1;
        }
        Ok(parts)
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_objects(
        &self,
        bucket: &str,
        continuation: Option<String>,
    ) -> Result<ObjectPage, StoreError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_continuation_token(continuation)
            .send()
            .await
            .map_err(remote("ListObjectsV2"))?;

        let objects = output
            .contents()
            .iter()
            .filter_map(|object| {
                Some(ObjectSummary {
                    key: object.key()?.to_string(),
                    etag: object.e_tag().map(str::to_string),
                    size: object.size().unwrap_or_default(),
                })
            })
            .collect();
        let next_continuation = if output.is_truncated().unwrap_or(false) {
            output.next_continuation_token().map(str::to_string)
        } else {
            None
        };
        Ok(ObjectPage {
            objects,
            next_continuation,
        })
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
        chunk_size: u64,
    ) -> Result<(), StoreError> {
        let size = tokio::fs::metadata(path).await?.len();
        if is_multipart(size, chunk_size) {
            self.put_multipart(bucket, key, path, content_type, chunk_size)
                .await
        } else {
            self.put_single(bucket, key, path, content_type).await
        }
    }
}

#[async_trait]
impl BucketAdmin for S3Client {
    async fn list_buckets(&self) -> Result<Vec<String>, StoreError> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(remote("ListBuckets"))?;
        Ok(output
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(str::to_string))
            .collect())
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<CreateOutcome, StoreError> {
        let mut request = self.client.create_bucket().bucket(bucket);
        // us-east-1 rejects an explicit location constraint.
        if region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        let e = match request.send().await {
            Ok(_) => return Ok(CreateOutcome::Created),
            Err(e) => e,
        };
        let (owned, taken) = match e.as_service_error() {
            Some(service) => (
                service.is_bucket_already_owned_by_you(),
                service.is_bucket_already_exists(),
            ),
            None => (false, false),
        };
        if owned {
            Ok(CreateOutcome::AlreadyOwnedByYou)
        } else if taken {
            Ok(CreateOutcome::AlreadyExists)
        } else {
            Err(remote("CreateBucket")(e))
        }
    }

    async fn allow_public_access(&self, bucket: &str) -> Result<(), StoreError> {
        self.client
            .delete_public_access_block()
            .bucket(bucket)
            .send()
            .await
            .map_err(remote("DeletePublicAccessBlock"))?;
        Ok(())
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), StoreError> {
        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .map_err(remote("PutBucketPolicy"))?;
        Ok(())
    }

    async fn put_bucket_website(
        &self,
        bucket: &str,
        website: &WebsiteConfig,
    ) -> Result<(), StoreError> {
        let index = IndexDocument::builder()
            .suffix(&website.index_document)
            .build()
            .map_err(remote("PutBucketWebsite"))?;
        let error = ErrorDocument::builder()
            .key(&website.error_document)
            .build()
            .map_err(remote("PutBucketWebsite"))?;

        self.client
            .put_bucket_website()
            .bucket(bucket)
            .website_configuration(
                WebsiteConfiguration::builder()
                    .index_document(index)
                    .error_document(error)
                    .build(),
            )
            .send()
            .await
            .map_err(remote("PutBucketWebsite"))?;
        Ok(())
    }

    async fn get_bucket_region(&self, bucket: &str) -> Result<String, StoreError> {
        let output = self
            .client
            .get_bucket_location()
            .bucket(bucket)
            .send()
            .await
            .map_err(remote("GetBucketLocation"))?;
        Ok(normalise_region(
            output.location_constraint().map(|constraint| constraint.as_str()),
        ))
    }
}
