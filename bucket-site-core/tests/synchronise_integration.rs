mod common;

use bucket_site_core::contract::{MockObjectStore, ObjectPage, ObjectSummary};
use bucket_site_core::error::{FileError, StoreError, SyncError};
use bucket_site_core::fingerprint::{fingerprint_with_chunk_size, Fingerprint};
use bucket_site_core::synchronise::{synchronise, SyncContext};
use common::{write_tree, MemoryStore};
use std::path::Path;
use tempfile::tempdir;

const BUCKET: &str = "www.example.test";

#[tokio::test]
async fn test_only_changed_files_are_uploaded() {
    let site = tempdir().unwrap();
    write_tree(site.path(), &[("a.txt", b"X"), ("b.txt", b"Y")]);

    let store = MemoryStore::new();
    store.seed("a.txt", b"X");

    let ctx = SyncContext::new(&store);
    let report = synchronise(&ctx, site.path(), BUCKET)
        .await
        .expect("sync should succeed");

    assert_eq!(store.uploads(), vec!["b.txt"]);
    assert_eq!(report.uploaded, vec!["b.txt"]);
    assert_eq!(report.unchanged, vec!["a.txt"]);
    assert!(report.is_clean());
}

#[tokio::test]
async fn test_second_run_over_unchanged_tree_uploads_nothing() {
    let site = tempdir().unwrap();
    write_tree(
        site.path(),
        &[
            ("index.html", b"<html>home</html>"),
            ("error.html", b"<html>oops</html>"),
            ("css/style.css", b"body { margin: 0 }"),
        ],
    );

    let store = MemoryStore::new();
    let ctx = SyncContext::new(&store);

    let first = synchronise(&ctx, site.path(), BUCKET).await.unwrap();
    assert_eq!(first.uploaded.len(), 3);

    store.clear_uploads();
    let second = synchronise(&ctx, site.path(), BUCKET).await.unwrap();
    assert!(store.uploads().is_empty(), "got {:?}", store.uploads());
    assert_eq!(second.unchanged.len(), 3);
}

#[tokio::test]
async fn test_modified_file_is_uploaded_again() {
    let site = tempdir().unwrap();
    write_tree(site.path(), &[("index.html", b"v1"), ("about.html", b"about")]);

    let store = MemoryStore::new();
    let ctx = SyncContext::new(&store);
    synchronise(&ctx, site.path(), BUCKET).await.unwrap();

    std::fs::write(site.path().join("index.html"), b"v2").unwrap();
    store.clear_uploads();
    synchronise(&ctx, site.path(), BUCKET).await.unwrap();

    assert_eq!(store.uploads(), vec!["index.html"]);
    assert_eq!(store.object("index.html").unwrap().body, b"v2");
}

#[tokio::test]
async fn test_uploaded_multipart_file_lists_with_local_fingerprint() {
    let site = tempdir().unwrap();
    let big: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    write_tree(site.path(), &[("assets/video.bin", &big), ("small.txt", b"tiny")]);

    let store = MemoryStore::new();
    let ctx = SyncContext::new(&store).with_chunk_size(4096);
    synchronise(&ctx, site.path(), BUCKET).await.unwrap();

    let local = fingerprint_with_chunk_size(&site.path().join("assets/video.bin"), 4096)
        .unwrap()
        .unwrap();
    assert_eq!(local.part_count(), Some(3));
    let remote = store.object("assets/video.bin").unwrap();
    assert_eq!(Fingerprint::parse(&remote.etag), local);

    store.clear_uploads();
    synchronise(&ctx, site.path(), BUCKET).await.unwrap();
    assert!(store.uploads().is_empty());
}

#[tokio::test]
async fn test_keys_are_root_relative_with_forward_slashes() {
    let site = tempdir().unwrap();
    write_tree(site.path(), &[("css/style.css", b"body{}")]);

    let store = MemoryStore::new();
    let ctx = SyncContext::new(&store);
    let report = synchronise(&ctx, site.path(), BUCKET).await.unwrap();

    assert_eq!(report.uploaded, vec!["css/style.css"]);
    let object = store.object("css/style.css").expect("object uploaded");
    assert_eq!(object.content_type, "text/css");
}

#[tokio::test]
async fn test_unknown_extension_uploads_as_text_plain() {
    let site = tempdir().unwrap();
    write_tree(site.path(), &[("CNAME", b"www.example.test")]);

    let store = MemoryStore::new();
    let ctx = SyncContext::new(&store);
    synchronise(&ctx, site.path(), BUCKET).await.unwrap();

    assert_eq!(store.object("CNAME").unwrap().content_type, "text/plain");
}

#[tokio::test]
async fn test_failed_upload_does_not_stop_the_walk() {
    let site = tempdir().unwrap();
    write_tree(site.path(), &[("a.txt", b"A"), ("b.txt", b"B"), ("c.txt", b"C")]);

    let store = MemoryStore::new().failing_on("b.txt");
    let ctx = SyncContext::new(&store);
    let report = synchronise(&ctx, site.path(), BUCKET).await.unwrap();

    assert_eq!(store.uploads(), vec!["a.txt", "b.txt", "c.txt"]);
    assert_eq!(report.uploaded, vec!["a.txt", "c.txt"]);
    assert_eq!(report.failed.len(), 1);
    assert!(matches!(
        &report.failed[0],
        FileError::Upload { key, .. } if key == "b.txt"
    ));
    assert!(!report.is_clean());
    assert!(store.object("c.txt").is_some());
}

#[tokio::test]
async fn test_manifest_spanning_several_pages_is_fully_loaded() {
    let site = tempdir().unwrap();
    let files: Vec<(String, Vec<u8>)> = (0..5)
        .map(|i| (format!("page{i}.html"), format!("page {i}").into_bytes()))
        .collect();
    let refs: Vec<(&str, &[u8])> = files
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_slice()))
        .collect();
    write_tree(site.path(), &refs);

    let store = MemoryStore::with_page_size(2);
    for (key, body) in &refs {
        store.seed(key, body);
    }

    let ctx = SyncContext::new(&store);
    let report = synchronise(&ctx, site.path(), BUCKET).await.unwrap();

    assert_eq!(store.list_calls(), 3);
    assert!(store.uploads().is_empty());
    assert_eq!(report.unchanged.len(), 5);
}

#[tokio::test]
async fn test_empty_file_is_uploaded_once_then_skipped() {
    let site = tempdir().unwrap();
    write_tree(site.path(), &[(".nojekyll", b"")]);

    let store = MemoryStore::new();
    let ctx = SyncContext::new(&store);

    let first = synchronise(&ctx, site.path(), BUCKET).await.unwrap();
    assert_eq!(first.uploaded, vec![".nojekyll"]);
    assert_eq!(
        store.object(".nojekyll").unwrap().etag,
        Fingerprint::empty_content().as_str()
    );

    store.clear_uploads();
    let second = synchronise(&ctx, site.path(), BUCKET).await.unwrap();
    assert!(store.uploads().is_empty());
    assert_eq!(second.unchanged, vec![".nojekyll"]);
}

#[tokio::test]
async fn test_empty_file_replaces_non_empty_remote_object() {
    let site = tempdir().unwrap();
    write_tree(site.path(), &[("robots.txt", b"")]);

    let store = MemoryStore::new();
    store.seed("robots.txt", b"User-agent: *");

    let ctx = SyncContext::new(&store);
    let report = synchronise(&ctx, site.path(), BUCKET).await.unwrap();
    assert_eq!(report.uploaded, vec!["robots.txt"]);
}

#[tokio::test]
async fn test_remote_etags_without_quotes_still_match() {
    let site = tempdir().unwrap();
    write_tree(site.path(), &[("index.html", b"home")]);

    let local = fingerprint_with_chunk_size(&site.path().join("index.html"), 1024)
        .unwrap()
        .unwrap();
    let store = MemoryStore::new();
    store.seed_etag("index.html", local.as_str().trim_matches('"'));

    let ctx = SyncContext::new(&store).with_chunk_size(1024);
    let report = synchronise(&ctx, site.path(), BUCKET).await.unwrap();
    assert_eq!(report.unchanged, vec!["index.html"]);
}

#[tokio::test]
async fn test_missing_root_is_rejected_before_listing() {
    let mut store = MockObjectStore::new();
    store.expect_list_objects().never();
    store.expect_upload().never();

    let ctx = SyncContext::new(&store);
    let err = synchronise(&ctx, Path::new("/definitely/not/a/site"), BUCKET)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::MissingRoot(_)));
}

#[tokio::test]
async fn test_listing_failure_falls_back_to_partial_manifest() {
    let site = tempdir().unwrap();
    write_tree(site.path(), &[("a.txt", b"A"), ("b.txt", b"B")]);
    let a_fp = fingerprint_with_chunk_size(&site.path().join("a.txt"), 1024)
        .unwrap()
        .unwrap();

    let mut store = MockObjectStore::new();
    store.expect_list_objects().times(2).returning(move |_, continuation| {
        match continuation {
            None => Ok(ObjectPage {
                objects: vec![ObjectSummary {
                    key: "a.txt".to_string(),
                    etag: Some(a_fp.as_str().to_string()),
                    size: 1,
                }],
                next_continuation: Some("a.txt".to_string()),
            }),
            Some(_) => Err(StoreError::remote("ListObjectsV2", "connection reset")),
        }
    });
    store
        .expect_upload()
        .withf(|bucket, key, _path, content_type, chunk_size| {
            bucket == BUCKET && key == "b.txt" && content_type == "text/plain" && *chunk_size == 1024
        })
        .times(1)
        .returning(|_, _, _, _, _| Ok(()));

    let ctx = SyncContext::new(&store).with_chunk_size(1024);
    let report = synchronise(&ctx, site.path(), BUCKET).await.unwrap();

    assert_eq!(report.unchanged, vec!["a.txt"]);
    assert_eq!(report.uploaded, vec!["b.txt"]);
    assert!(report.listing_error.is_some());
    assert!(!report.is_clean());
}

#[tokio::test]
async fn test_mocked_upload_error_is_reported_per_file() {
    let site = tempdir().unwrap();
    write_tree(site.path(), &[("a.txt", b"A"), ("b.txt", b"B"), ("c.txt", b"C")]);

    let mut store = MockObjectStore::new();
    store
        .expect_list_objects()
        .times(1)
        .returning(|_, _| Ok(ObjectPage::default()));
    store
        .expect_upload()
        .times(3)
        .returning(|_, key, _, _, _| {
            if key == "b.txt" {
                Err(StoreError::remote("PutObject", "AccessDenied"))
            } else {
                Ok(())
            }
        });

    let ctx = SyncContext::new(&store);
    let report = synchronise(&ctx, site.path(), BUCKET).await.unwrap();

    assert_eq!(report.uploaded, vec!["a.txt", "c.txt"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].key(), Some("b.txt"));
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_non_utf8_file_names_are_skipped_and_reruns_stay_idle() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let site = tempdir().unwrap();
    write_tree(site.path(), &[("ok.txt", b"ok")]);
    std::fs::write(site.path().join(OsStr::from_bytes(b"a\xff.txt")), "one").unwrap();
    std::fs::write(site.path().join(OsStr::from_bytes(b"a\xfe.txt")), "two").unwrap();

    let store = MemoryStore::new();
    let ctx = SyncContext::new(&store);

    let first = synchronise(&ctx, site.path(), BUCKET).await.unwrap();
    assert_eq!(first.uploaded, vec!["ok.txt"]);
    assert_eq!(first.failed.len(), 2);
    assert!(first
        .failed
        .iter()
        .all(|e| matches!(e, FileError::NonUtf8Key { .. })));

    store.clear_uploads();
    let second = synchronise(&ctx, site.path(), BUCKET).await.unwrap();
    assert!(store.uploads().is_empty(), "got {:?}", store.uploads());
    assert_eq!(second.unchanged, vec!["ok.txt"]);
}

#[tokio::test]
async fn test_known_s3_multipart_etag_is_recognised_as_unchanged() {
    // 20 MiB of zeros uploaded in 8 MiB parts; ETag computed outside this crate.
    let site = tempdir().unwrap();
    let zeros = vec![0u8; 20 * 1024 * 1024];
    write_tree(site.path(), &[("video/blank.bin", &zeros)]);

    let store = MemoryStore::new();
    store.seed_etag("video/blank.bin", "\"5452e5568d20a60209babc69a7b95911-3\"");

    let ctx = SyncContext::new(&store);
    let report = synchronise(&ctx, site.path(), BUCKET).await.unwrap();

    assert!(store.uploads().is_empty(), "got {:?}", store.uploads());
    assert_eq!(report.unchanged, vec!["video/blank.bin"]);
}

#[tokio::test]
async fn test_known_single_part_etag_at_chunk_boundary_is_unchanged() {
    // Exactly one chunk of zeros goes up with a single PUT: plain MD5, no part suffix.
    let site = tempdir().unwrap();
    let zeros = vec![0u8; 8 * 1024 * 1024];
    write_tree(site.path(), &[("blank.bin", &zeros)]);

    let store = MemoryStore::new();
    store.seed_etag("blank.bin", "\"96995b58d4cbf6aaa9041b4f00c7f6ae\"");

    let ctx = SyncContext::new(&store);
    let report = synchronise(&ctx, site.path(), BUCKET).await.unwrap();
    assert_eq!(report.unchanged, vec!["blank.bin"]);
}
