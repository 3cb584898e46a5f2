// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use spiderkit::queue::scheduler::JobScheduler;
use spiderkit::queue::url_pattern::{expand, expand_url, UrlPattern};
use spiderkit::utils::errors::SpiderError;

#[test]
fn test_expand_with_pattern_argument() {
    let urls: Vec<String> = expand(Some("  https://x.test/p[8..10]  ")).collect();
    assert_eq!(
        urls,
        vec!["https://x.test/p8", "https://x.test/p9", "https://x.test/p10"]
    );
}

#[test]
fn test_range_inside_query_and_port() {
    let pattern = UrlPattern::parse("http://127.0.0.1:8080/list?page=[2..2..6]&sort=asc");
    assert_eq!(
        pattern,
        UrlPattern::Range {
            prefix: "http://127.0.0.1:8080/list?page=".to_string(),
            suffix: "&sort=asc".to_string(),
            start: 2,
            step: 2,
            end: Some(6),
        }
    );
    assert!(!pattern.is_unbounded());
    assert_eq!(
        pattern.expand().collect::<Vec<_>>(),
        vec![
            "http://127.0.0.1:8080/list?page=2&sort=asc",
            "http://127.0.0.1:8080/list?page=4&sort=asc",
            "http://127.0.0.1:8080/list?page=6&sort=asc",
        ]
    );
}

#[test]
fn test_finite_size_is_known_up_front() {
    let urls = expand_url("https://x.test/[0..3..100]").into_finite().unwrap();
    assert_eq!(urls.len(), 34);
    assert_eq!(urls.clone().last().as_deref(), Some("https://x.test/99"));
}

#[tokio::test]
async fn test_unbounded_source_drives_scheduler_lazily() {
    let source = expand_url("https://x.test/item/[1..]").take(12);
    let scheduler = JobScheduler::new(4, true);

    let results = scheduler
        .collect(source, |url: String, _ctx| async move {
            let n: u64 = url
                .rsplit('/')
                .next()
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| SpiderError::MalformedUrl(url.clone()))?;
            if n % 5 == 0 {
                return Err(SpiderError::FetchFailed(url));
            }
            Ok(n * n)
        })
        .await;

    assert_eq!(results.len(), 12);
    let squares: Vec<u64> = results.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
    assert_eq!(squares, vec![1, 4, 9, 16, 36, 49, 64, 81, 121, 144]);
    assert!(matches!(results[4], Err(SpiderError::FetchFailed(_))));
    assert!(matches!(results[9], Err(SpiderError::FetchFailed(_))));
}

#[tokio::test]
async fn test_follow_ups_extend_a_single_seed() {
    let scheduler = JobScheduler::new(2, true);
    let mut visited = Vec::new();

    let stats = scheduler
        .run(
            expand_url("https://x.test/page/1"),
            |url: String, ctx| async move {
                let n: u32 = url.trim_start_matches("https://x.test/page/").parse().unwrap_or(0);
                if n < 4 {
                    ctx.enqueue(format!("https://x.test/page/{}", n + 1));
                }
                Ok::<_, SpiderError>(url)
            },
            |outcome| {
                if let Ok(url) = outcome.result {
                    visited.push(url);
                }
            },
        )
        .await;

    assert_eq!(stats.dispatched, 4);
    assert_eq!(stats.followed, 3);
    assert_eq!(
        visited,
        vec![
            "https://x.test/page/1",
            "https://x.test/page/2",
            "https://x.test/page/3",
            "https://x.test/page/4",
        ]
    );
}
