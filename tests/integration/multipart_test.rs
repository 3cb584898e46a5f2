// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{spider, FixtureServer, BLOB_LEN, SLOW_CHUNKS, SLOW_CHUNK_LEN};
use spiderkit::config::options::PartialOptions;
use spiderkit::spider::NoProgress;
use spiderkit::utils::errors::SpiderError;
use spiderkit::utils::progress::DownloadProgress;
use std::time::Duration;

#[tokio::test]
async fn test_multipart_save_is_bit_identical() {
    let server = FixtureServer::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("nested").join("blob.zip");
    let progress = DownloadProgress::hidden("blob.zip");

    let saved = spider()
        .save(
            &server.url("/blob.zip"),
            &target,
            &PartialOptions::new().parts(3),
            &progress,
        )
        .await
        .unwrap();

    assert!(saved);
    assert_eq!(std::fs::read(&target).unwrap(), server.blob().to_vec());
    assert_eq!(server.blob_heads(), 1);
    assert_eq!(
        server.blob_ranges(),
        vec![(0, 99_999), (100_000, 199_999), (200_000, 299_999)]
    );
    assert_eq!(progress.positions(), vec![100_000, 100_000, 100_000]);
}

#[tokio::test]
async fn test_multipart_remainder_goes_to_last_part() {
    let server = FixtureServer::spawn().await;
    let data = spider()
        .multipart_download(
            &server.url("/blob.zip"),
            7,
            &PartialOptions::new(),
            &NoProgress,
        )
        .await
        .unwrap();

    assert_eq!(data.len(), BLOB_LEN);
    assert_eq!(&data[..], &server.blob()[..]);

    let ranges = server.blob_ranges();
    assert_eq!(ranges.len(), 7);
    assert_eq!(ranges.first(), Some(&(0, 42_856)));
    assert_eq!(ranges.last(), Some(&(257_142, BLOB_LEN - 1)));
    assert!(ranges.windows(2).all(|w| w[0].1 + 1 == w[1].0));
}

#[tokio::test]
async fn test_server_without_ranges_is_unsupported() {
    let server = FixtureServer::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("plain.zip");
    let url = server.url("/plain.zip");
    let spider = spider();

    let result = spider
        .save(&url, &target, &PartialOptions::new().parts(4), &NoProgress)
        .await;
    assert!(matches!(result, Err(SpiderError::MultipartUnsupported(_))));
    assert!(!target.exists());

    // single stream fallback
    let saved = spider
        .save(&url, &target, &PartialOptions::new().parts(0), &NoProgress)
        .await
        .unwrap();
    assert!(saved);
    assert_eq!(std::fs::read(&target).unwrap(), server.blob().to_vec());
}

#[tokio::test]
async fn test_missing_resource_is_not_saved() {
    let server = FixtureServer::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("missing.html");

    let saved = spider()
        .save(
            &server.url("/page/9"),
            &target,
            &PartialOptions::new().retry(0),
            &NoProgress,
        )
        .await
        .unwrap();

    assert!(!saved);
    assert!(!target.exists());
}

#[tokio::test]
async fn test_slow_stream_save_is_not_cut_off() {
    let server = FixtureServer::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("slow.zip");

    // 整个传输约1.5s，远超超时；每块间隔只有100ms
    let saved = spider()
        .save(
            &server.url("/slow.zip"),
            &target,
            &PartialOptions::new()
                .timeout(Duration::from_millis(600))
                .retry(1),
            &NoProgress,
        )
        .await
        .unwrap();

    assert!(saved);
    let data = std::fs::read(&target).unwrap();
    assert_eq!(data.len(), SLOW_CHUNKS * SLOW_CHUNK_LEN);
    assert_eq!(data[SLOW_CHUNK_LEN * 14], 14);
}
