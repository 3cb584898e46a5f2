// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 单元测试用的脚本化传输

use crate::engines::traits::{
    Body, EngineError, HttpTransport, TransportRequest, TransportResponse,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

const CHUNK: usize = 1024;

/// 按URL返回固定内容的传输，记录请求次数
#[derive(Default)]
pub struct ScriptedTransport {
    pages: HashMap<String, Bytes>,
    /// 前N次GET返回连接错误
    failures: AtomicUsize,
    /// 前N个流在发送 `break_after` 块后中断
    broken: AtomicUsize,
    break_after: usize,
    accept_ranges: bool,
    gets: AtomicUsize,
    heads: AtomicUsize,
    ranges: Mutex<Vec<(u64, u64)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            accept_ranges: true,
            ..Self::default()
        }
    }

    pub fn page(mut self, url: &str, body: impl Into<Bytes>) -> Self {
        self.pages.insert(url.to_string(), body.into());
        self
    }

    pub fn failing(self, times: usize) -> Self {
        self.failures.store(times, Ordering::SeqCst);
        self
    }

    /// 前 `times` 个流式响应只发送 `after_chunks` 块，随后以流错误结束
    pub fn broken_streams(mut self, times: usize, after_chunks: usize) -> Self {
        self.broken.store(times, Ordering::SeqCst);
        self.break_after = after_chunks;
        self
    }

    pub fn without_ranges(mut self) -> Self {
        self.accept_ranges = false;
        self
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn heads(&self) -> usize {
        self.heads.load(Ordering::SeqCst)
    }

    pub fn ranges(&self) -> Vec<(u64, u64)> {
        let mut ranges = self.ranges.lock().map(|r| r.clone()).unwrap_or_default();
        ranges.sort_unstable();
        ranges
    }

    fn headers(&self, len: u64) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("content-length".to_string(), len.to_string());
        if self.accept_ranges {
            headers.insert("accept-ranges".to_string(), "bytes".to_string());
        }
        headers
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, request: &TransportRequest) -> Result<TransportResponse, EngineError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let fail = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(EngineError::Stream("connection reset".to_string()));
        }

        let page = self
            .pages
            .get(&request.url)
            .cloned()
            .ok_or(EngineError::Status(404))?;

        let (status_code, body) = match request.range {
            Some((start, end)) if self.accept_ranges => {
                if let Ok(mut ranges) = self.ranges.lock() {
                    ranges.push((start, end));
                }
                (206, page.slice(start as usize..=end as usize))
            }
            _ => (200, page),
        };

        let headers = self.headers(body.len() as u64);
        let body = if request.stream {
            let mut chunks: Vec<Result<Bytes, EngineError>> = body
                .chunks(CHUNK)
                .map(|c| Ok(Bytes::copy_from_slice(c)))
                .collect();
            let broken = self
                .broken
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if broken {
                chunks.truncate(self.break_after);
                chunks.push(Err(EngineError::Stream("connection reset mid-body".to_string())));
            }
            Body::Stream(futures::stream::iter(chunks).boxed())
        } else {
            Body::Buffered(body)
        };

        Ok(TransportResponse {
            status_code,
            headers,
            body,
        })
    }

    async fn head(&self, request: &TransportRequest) -> Result<TransportResponse, EngineError> {
        self.heads.fetch_add(1, Ordering::SeqCst);
        let page = self
            .pages
            .get(&request.url)
            .ok_or(EngineError::Status(404))?;
        Ok(TransportResponse {
            status_code: 200,
            headers: self.headers(page.len() as u64),
            body: Body::Buffered(Bytes::new()),
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
