// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{spider, FixtureServer, PAGE_COUNT};
use spiderkit::config::options::PartialOptions;
use spiderkit::utils::errors::SpiderError;

#[tokio::test]
async fn test_follow_walks_every_page() {
    let server = FixtureServer::spawn().await;
    let spider = spider();
    let mut pager = spider.follow(
        &server.url("/page/1"),
        &["a.missing => @href", ".next => @href"],
        PartialOptions::new(),
    );

    let mut titles = Vec::new();
    while let Some(res) = pager.next_page().await.unwrap() {
        titles.push(res.css("title => %text").await.unwrap().into_vec().concat());
    }

    assert_eq!(titles, vec!["Page 1", "Page 2", "Page 3"]);
    for n in 1..=PAGE_COUNT {
        assert_eq!(server.page_hits(n), 1);
    }
}

#[tokio::test]
async fn test_pages_stop_on_caller_condition() {
    let server = FixtureServer::spawn().await;
    let spider = spider();
    let mut pager = spider
        .pages(&server.url("/page/[1..]"), PartialOptions::new().retry(0))
        .unwrap();

    let mut seen = 0;
    while let Some(res) = pager.next_page().await.unwrap() {
        if res.is_absent() {
            break;
        }
        seen += 1;
    }

    assert_eq!(seen, PAGE_COUNT);
    assert_eq!(server.page_hits(PAGE_COUNT + 1), 1);
    assert_eq!(server.page_hits(PAGE_COUNT + 2), 0);
}

#[tokio::test]
async fn test_pages_rejects_bounded_pattern() {
    let server = FixtureServer::spawn().await;
    let spider = spider();
    let result = spider.pages(&server.url("/page/[1..3]"), PartialOptions::new());
    assert!(matches!(result, Err(SpiderError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_batch_run_keeps_failures_in_place() {
    let server = FixtureServer::spawn().await;
    let results = spider()
        .batch_run(
            &server.url("/page/[1..5]"),
            3,
            PartialOptions::new().retry(0),
            |res| async move {
                if res.is_absent() {
                    return Err(SpiderError::FetchFailed(res.url().to_string()));
                }
                Ok(res.status())
            },
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 5);
    assert!(results[..3].iter().all(|r| matches!(r, Ok(200))));
    assert!(results[3..]
        .iter()
        .all(|r| matches!(r, Err(SpiderError::FetchFailed(_)))));
}
