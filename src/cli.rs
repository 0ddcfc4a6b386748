//! # bucket-site CLI
//!
//! Argument parsing and command routing. All business logic (fingerprints,
//! manifest diffing, bucket setup) lives in `bucket-site-core`; this module
//! wires it to an [`S3Client`] and prints results for the user.
//!
//! ## Commands
//! - `list-buckets`: names of all buckets visible to the profile.
//! - `list-bucket-objects <bucket>`: every object with its size and ETag.
//! - `setup-bucket <bucket>`: create the bucket and configure it for website hosting.
//! - `sync <pathname> <bucket>`: upload new and changed files, then print the site URL.
//!
//! For programmatic and integration use, build a [`Cli`] and call [`run`].

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use bucket_site_core::contract::BucketAdmin;
use bucket_site_core::manifest::list_all_objects;
use bucket_site_core::setup::{setup_bucket, site_url, BucketStatus};
use bucket_site_core::synchronise::{synchronise, SyncContext, SynchroniseReport};
use bucket_site_core::walk::resolve_root;

use crate::load_config::load_optional_config;
use crate::s3::S3Client;

/// Deploy static websites to S3.
#[derive(Parser)]
#[clap(
    name = "bucket-site",
    version,
    about = "Deploy static websites to S3 buckets, uploading only what changed"
)]
pub struct Cli {
    /// Use a given AWS profile
    #[clap(long, global = true)]
    pub profile: Option<String>,

    /// Optional YAML config file (region, endpoint, website documents)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List all S3 buckets
    ListBuckets,
    /// List objects in an S3 bucket
    ListBucketObjects {
        bucket: String,
    },
    /// Create and configure an S3 bucket for static website hosting
    SetupBucket {
        bucket: String,
    },
    /// Sync the files under PATHNAME into BUCKET
    Sync {
        pathname: PathBuf,
        bucket: String,
    },
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    // Reject a bad sync root before touching config or credentials.
    let sync_root = match &cli.command {
        Commands::Sync { pathname, .. } => Some(resolve_root(pathname)?),
        _ => None,
    };

    let config = load_optional_config(cli.config.as_deref())?;
    if let Some(profile) = &cli.profile {
        println!("Running with the {profile} AWS profile");
    }
    let client = S3Client::connect(cli.profile.as_deref(), &config).await;

    match cli.command {
        Commands::ListBuckets => {
            let buckets = client.list_buckets().await.context("Listing buckets failed")?;
            for bucket in buckets {
                println!("{bucket}");
            }
        }
        Commands::ListBucketObjects { bucket } => {
            let objects = list_all_objects(&client, &bucket)
                .await
                .with_context(|| format!("Listing objects in {bucket} failed"))?;
            for object in objects {
                println!(
                    "{}  {}  {}",
                    object.key,
                    object.size,
                    object.etag.as_deref().unwrap_or("-")
                );
            }
        }
        Commands::SetupBucket { bucket } => {
            tracing::info!(command = "setup-bucket", %bucket, "Starting bucket setup");
            let status = setup_bucket(&client, &bucket, client.region(), &config.website).await?;
            match status {
                BucketStatus::Created => println!("Created bucket {bucket}"),
                BucketStatus::AlreadyOwned => println!("Reusing existing bucket {bucket}"),
            }
            print_site_url(&client, &bucket, "setup-bucket").await;
        }
        Commands::Sync { bucket, .. } => {
            let root = sync_root.context("sync root was not resolved")?;
            tracing::info!(command = "sync", %bucket, "Starting synchronisation process");
            let ctx = SyncContext::new(&client);
            let report = synchronise(&ctx, &root, &bucket).await?;
            print_report(&report);
            print_site_url(&client, &bucket, "sync").await;
        }
    }

    Ok(())
}

async fn print_site_url(admin: &dyn BucketAdmin, bucket: &str, command: &str) {
    match site_url(admin, bucket).await {
        Ok(url) => println!("{url}"),
        Err(e) => {
            tracing::warn!(command, bucket, error = %e, "Could not look up bucket region for the site URL")
        }
    }
}

fn print_report(report: &SynchroniseReport) {
    println!(
        "Synchronised {} into {}: {} uploaded, {} unchanged, {} failed",
        report.root.display(),
        report.bucket,
        report.uploaded.len(),
        report.unchanged.len(),
        report.failed.len()
    );
    if let Some(e) = &report.listing_error {
        println!("  listing incomplete: {e}");
    }
    for failure in &report.failed {
        println!("  failed: {failure}");
    }
}
