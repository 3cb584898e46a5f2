// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use futures::stream;
use spiderkit::config::options::SpiderOptions;
use spiderkit::Spider;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// 分段下载夹具的大小
pub const BLOB_LEN: usize = 300_000;
/// 分页夹具的页数
pub const PAGE_COUNT: u32 = 3;
/// 慢速夹具的块数与块间隔
pub const SLOW_CHUNKS: usize = 15;
pub const SLOW_CHUNK_LEN: usize = 1000;
pub const SLOW_INTERVAL: Duration = Duration::from_millis(100);

struct FixtureState {
    blob: Bytes,
    page_hits: Mutex<HashMap<u32, usize>>,
    blob_heads: AtomicUsize,
    blob_ranges: Mutex<Vec<(usize, usize)>>,
    fail_hits: AtomicUsize,
}

/// 进程内HTTP夹具服务器
///
/// - `/page/{n}`：分页HTML，1..=3 页，前两页带下一页链接
/// - `/blob.zip`：支持范围请求的二进制文件
/// - `/plain.zip`：同样内容但不声明 `accept-ranges`
/// - `/slow.zip`：每隔100ms发送一块，共15块
/// - `/fail`：始终返回500
pub struct FixtureServer {
    base: String,
    state: Arc<FixtureState>,
}

impl FixtureServer {
    pub async fn spawn() -> Self {
        let state = Arc::new(FixtureState {
            blob: Bytes::from(blob_payload()),
            page_hits: Mutex::new(HashMap::new()),
            blob_heads: AtomicUsize::new(0),
            blob_ranges: Mutex::new(Vec::new()),
            fail_hits: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/page/{n}", get(page))
            .route("/blob.zip", get(blob).head(blob_head))
            .route("/plain.zip", get(plain))
            .route("/slow.zip", get(slow))
            .route("/fail", get(fail))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fixture server");
        let addr = listener.local_addr().expect("fixture server address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fixture server");
        });

        Self {
            base: format!("http://{}", addr),
            state,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn page_hits(&self, n: u32) -> usize {
        self.state
            .page_hits
            .lock()
            .map(|hits| hits.get(&n).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn blob(&self) -> &Bytes {
        &self.state.blob
    }

    pub fn blob_heads(&self) -> usize {
        self.state.blob_heads.load(Ordering::SeqCst)
    }

    pub fn blob_ranges(&self) -> Vec<(usize, usize)> {
        let mut ranges = self
            .state
            .blob_ranges
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default();
        ranges.sort_unstable();
        ranges
    }

    pub fn fail_hits(&self) -> usize {
        self.state.fail_hits.load(Ordering::SeqCst)
    }
}

/// 使用真实reqwest传输的爬虫
pub fn spider() -> Spider {
    Spider::new(SpiderOptions::default()).expect("reqwest transport")
}

pub fn page_html(n: u32) -> String {
    let next = if n < PAGE_COUNT {
        format!(r#"<a class="next" href="/page/{}">next</a>"#, n + 1)
    } else {
        String::new()
    };
    format!(
        r#"<html><head><title>Page {n}</title><script>track({n})</script></head>
<body>
  <ul class="list">
    <li class="item"><a href=" /a ">A</a></li>
    <li class="item"><a href="/b">B</a></li>
  </ul>
  {next}
</body></html>"#
    )
}

fn blob_payload() -> Vec<u8> {
    (0..BLOB_LEN).map(|i| (i * 31 % 253) as u8).collect()
}

fn parse_range(value: &str) -> Option<(usize, usize)> {
    let (start, end) = value.strip_prefix("bytes=")?.split_once('-')?;
    Some((start.trim().parse().ok()?, end.trim().parse().ok()?))
}

async fn page(State(state): State<Arc<FixtureState>>, Path(n): Path<u32>) -> Response {
    if let Ok(mut hits) = state.page_hits.lock() {
        *hits.entry(n).or_insert(0) += 1;
    }
    if n == 0 || n > PAGE_COUNT {
        return (StatusCode::NOT_FOUND, "no such page").into_response();
    }
    Html(page_html(n)).into_response()
}

async fn blob(State(state): State<Arc<FixtureState>>, headers: HeaderMap) -> Response {
    let total = state.blob.len();
    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_range);

    let Some((start, end)) = range else {
        return (
            [(header::ACCEPT_RANGES, "bytes".to_string())],
            state.blob.clone(),
        )
            .into_response();
    };

    let end = end.min(total - 1);
    if let Ok(mut ranges) = state.blob_ranges.lock() {
        ranges.push((start, end));
    }
    (
        StatusCode::PARTIAL_CONTENT,
        [
            (header::ACCEPT_RANGES, "bytes".to_string()),
            (
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{}", start, end, total),
            ),
        ],
        state.blob.slice(start..=end),
    )
        .into_response()
}

async fn blob_head(State(state): State<Arc<FixtureState>>) -> Response {
    state.blob_heads.fetch_add(1, Ordering::SeqCst);
    (
        [
            (header::ACCEPT_RANGES, "bytes".to_string()),
            (header::CONTENT_LENGTH, state.blob.len().to_string()),
        ],
        (),
    )
        .into_response()
}

async fn plain(State(state): State<Arc<FixtureState>>) -> Response {
    state.blob.clone().into_response()
}

async fn slow() -> Response {
    let chunks = stream::unfold(0usize, |i| async move {
        if i == SLOW_CHUNKS {
            return None;
        }
        tokio::time::sleep(SLOW_INTERVAL).await;
        let chunk = Bytes::from(vec![(i % 251) as u8; SLOW_CHUNK_LEN]);
        Some((Ok::<_, std::io::Error>(chunk), i + 1))
    });
    Body::from_stream(chunks).into_response()
}

async fn fail(State(state): State<Arc<FixtureState>>) -> Response {
    state.fail_hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
}
