// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{spider, FixtureServer, PAGE_COUNT};
use async_trait::async_trait;
use spiderkit::config::options::{PartialOptions, SpiderOptions, TransformFlags};
use spiderkit::engines::traits::{EngineError, HttpTransport, TransportRequest, TransportResponse};
use spiderkit::utils::errors::SpiderError;
use spiderkit::Spider;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 每次请求都失败并计数的传输
#[derive(Default)]
struct AlwaysFailing {
    attempts: AtomicUsize,
}

#[async_trait]
impl HttpTransport for AlwaysFailing {
    async fn get(&self, _request: &TransportRequest) -> Result<TransportResponse, EngineError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(EngineError::Timeout)
    }

    async fn head(&self, _request: &TransportRequest) -> Result<TransportResponse, EngineError> {
        Err(EngineError::Timeout)
    }

    fn name(&self) -> &'static str {
        "always-failing"
    }
}

#[tokio::test]
async fn test_batch_titles_in_order() {
    let server = FixtureServer::spawn().await;
    let spider = spider();

    let titles = spider
        .batch_run(
            &server.url(&format!("/page/[1..{}]", PAGE_COUNT)),
            2,
            PartialOptions::new(),
            |res| async move {
                let title = res.css("title => %text").await?;
                Ok::<_, SpiderError>(title.get().unwrap_or_default().to_string())
            },
        )
        .await
        .unwrap();

    let titles: Vec<String> = titles.into_iter().map(Result::unwrap).collect();
    assert_eq!(titles, vec!["Page 1", "Page 2", "Page 3"]);
}

#[tokio::test]
async fn test_selector_chain_on_live_page() {
    let server = FixtureServer::spawn().await;
    let res = spider()
        .get(&server.url("/page/1"), &PartialOptions::new())
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert!(res.header("content-type").is_some_and(|v| v.contains("text/html")));
    assert_eq!(
        res.css(".item a => @href => trim").await.unwrap().getall(),
        &["/a".to_string(), "/b".to_string()]
    );
}

#[tokio::test]
async fn test_transforms_apply_before_selection() {
    let server = FixtureServer::spawn().await;
    let options = PartialOptions::new().transforms(TransformFlags {
        remove_scripts: true,
        normalize_links: true,
        ..TransformFlags::default()
    });
    let res = spider().get(&server.url("/page/2"), &options).await.unwrap();

    assert!(res.css("script").await.unwrap().is_empty());
    assert_eq!(
        res.css(".next => @href").await.unwrap().get(),
        Some(server.url("/page/3").as_str())
    );
}

#[tokio::test]
async fn test_retry_exhaustion_counts_attempts() {
    let transport = Arc::new(AlwaysFailing::default());
    let spider = Spider::with_transport(
        transport.clone(),
        SpiderOptions {
            retry: 4,
            ..SpiderOptions::default()
        },
    );

    let res = spider
        .get("https://unreachable.test/", &PartialOptions::new())
        .await
        .unwrap();

    assert_eq!(transport.attempts.load(Ordering::SeqCst), 5);
    assert!(res.is_absent());
    assert_eq!(res.status(), 404);
    assert!(res.headers().is_none());
}

#[tokio::test]
async fn test_server_errors_are_retried_then_absent() {
    let server = FixtureServer::spawn().await;
    let res = spider()
        .get(&server.url("/fail"), &PartialOptions::new().retry(2))
        .await
        .unwrap();

    assert_eq!(server.fail_hits(), 3);
    assert!(res.is_absent());
    assert!(res.links().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_url_is_rejected() {
    let result = spider().get("not-a-url", &PartialOptions::new()).await;
    assert!(matches!(result, Err(SpiderError::MalformedUrl(_))));
}
