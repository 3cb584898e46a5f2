// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use bytes::Bytes;
use spiderkit::config::options::{SpiderOptions, TransformFlags};
use spiderkit::domain::models::Response;
use spiderkit::engines::traits::{Body, TransportResponse};
use std::collections::HashMap;
use spiderkit::utils::errors::SpiderError;

const CATALOG: &str = r#"<html><head><title>Catalog</title>
<style>.x { color: red }</style></head>
<body>
  <div class="product" data-sku="A1">
    <h2>Lamp</h2><span class="price">12.50</span>
    <a href="lamp.html">details</a><img src="/img/lamp.png">
  </div>
  <div class="product" data-sku="B2">
    <h2>Desk &amp; Chair</h2><span class="price">99.00</span>
    <a href="https://cdn.test/desk">details</a><img src="">
  </div>
</body></html>"#;

fn response(options: &SpiderOptions) -> Response {
    Response::from_body(
        "https://shop.test/list/index.html",
        Body::Buffered(Bytes::from_static(CATALOG.as_bytes())),
        options,
    )
}

#[tokio::test]
async fn test_nested_selection_per_product() {
    let res = response(&SpiderOptions::default());
    let products = res.css(".product").await.unwrap();

    let rows: Vec<(String, String)> = products.map(|product| {
        let name = product.css("h2 => %text").unwrap();
        let price = product.css(".price => %text").unwrap();
        (
            name.get().unwrap_or_default().to_string(),
            price.get().unwrap_or_default().to_string(),
        )
    });

    assert_eq!(
        rows,
        vec![
            ("Lamp".to_string(), "12.50".to_string()),
            ("Desk & Chair".to_string(), "99.00".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_unescape_applies_to_html_output() {
    let raw = response(&SpiderOptions::default());
    assert!(raw
        .css(".product h2")
        .await
        .unwrap()
        .getall()
        .iter()
        .any(|h| h.contains("&amp;")));

    let decoded = response(&SpiderOptions {
        unescape: true,
        ..SpiderOptions::default()
    });
    assert_eq!(
        decoded.css(".product h2").await.unwrap().getall()[1],
        "<h2>Desk & Chair</h2>"
    );
}

#[tokio::test]
async fn test_regex_groups() {
    let res = response(&SpiderOptions::default());

    let skus = res.regex(r#"data-sku="(\w)(\d)""#, 1).await.unwrap();
    assert_eq!(skus.getall(), &["A".to_string(), "B".to_string()]);

    let whole = res.regex(r#"data-sku="\w\d""#, 0).await.unwrap();
    assert_eq!(whole.get(), Some(r#"data-sku="A1""#));

    let err = res.regex(r"(\d+)\.(\d+)", 3).await.unwrap_err();
    assert!(matches!(
        err,
        SpiderError::InvalidGroup {
            group: 3,
            available: 2
        }
    ));
}

#[tokio::test]
async fn test_links_and_images_are_normalized() {
    let res = response(&SpiderOptions::default());

    assert_eq!(
        res.links().await.unwrap(),
        vec![
            "https://shop.test/lamp.html".to_string(),
            "https://cdn.test/desk".to_string(),
        ]
    );
    assert_eq!(
        res.images(1).await.unwrap(),
        vec!["https://shop.test/img/lamp.png".to_string()]
    );
    assert_eq!(res.images(0).await.unwrap().len(), 2);
    assert!(matches!(
        res.images(2).await,
        Err(SpiderError::InvalidImageLevel(2))
    ));
}

#[tokio::test]
async fn test_transforms_run_once_before_every_query() {
    let options = SpiderOptions {
        transforms: TransformFlags {
            remove_styles: true,
            normalize_links: true,
            ..TransformFlags::default()
        },
        ..SpiderOptions::default()
    };
    let res = response(&options);

    assert!(res.css("style").await.unwrap().is_empty());
    assert_eq!(
        res.css(".product a => @href").await.unwrap().get(),
        Some("https://shop.test/lamp.html")
    );
    let data = res.data().await.unwrap().unwrap_or_default();
    assert!(!data.contains("color: red"));
}

#[tokio::test]
async fn test_buffered_body_cannot_be_piped() {
    let res = response(&SpiderOptions::default());
    let mut sink = Vec::<u8>::new();
    let result = res.pipe_to(&mut sink, |_, _| {}).await;

    assert!(matches!(result, Err(SpiderError::InvalidArgument(_))));
    // the body is still readable afterwards
    assert_eq!(
        res.css("title => %text").await.unwrap().get(),
        Some("Catalog")
    );
}

#[tokio::test]
async fn test_absent_response_yields_empty_results() {
    let res = Response::absent("https://shop.test/gone", &SpiderOptions::default());

    assert_eq!(res.status(), 404);
    assert!(res.headers().is_none());
    assert_eq!(res.data().await.unwrap(), None);
    assert!(res.css("a").await.unwrap().is_empty());
    assert!(res.regex("x", 0).await.unwrap().is_empty());
    assert!(matches!(
        res.pipe_to(&mut Vec::<u8>::new(), |_, _| {}).await,
        Err(SpiderError::FetchFailed(_))
    ));
}

#[tokio::test]
async fn test_non_utf8_pages_are_decoded() {
    let (raw, _, _) =
        encoding_rs::GBK.encode(r#"<html><head><meta charset="gbk"><title>中文</title></head></html>"#);
    let res = Response::from_body(
        "https://news.test/",
        Body::Buffered(Bytes::from(raw.into_owned())),
        &SpiderOptions::default(),
    );
    assert_eq!(res.css("title => %text").await.unwrap().get(), Some("中文"));

    // 只有响应头声明字符集
    let (raw, _, _) = encoding_rs::GBK.encode("<p class=\"lead\">新闻标题</p>");
    let mut headers = HashMap::new();
    headers.insert(
        "content-type".to_string(),
        "text/html; charset=GBK".to_string(),
    );
    let res = Response::from_transport(
        "https://news.test/1",
        TransportResponse {
            status_code: 200,
            headers,
            body: Body::Buffered(Bytes::from(raw.into_owned())),
        },
        &SpiderOptions::default(),
    );
    assert_eq!(res.css(".lead => %text").await.unwrap().get(), Some("新闻标题"));
}
