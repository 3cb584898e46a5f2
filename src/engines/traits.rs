// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 非2xx状态码
    #[error("Unexpected status: {0}")]
    Status(u16),
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 响应流中断
    #[error("Stream error: {0}")]
    Stream(String),
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

impl EngineError {
    /// 判断错误是否可重试
    ///
    /// # 返回值
    ///
    /// 如果错误是可重试的则返回true，否则返回false
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::RequestFailed(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.is_body()
                    || e.status().is_some()
            }
            EngineError::Status(_) | EngineError::Timeout | EngineError::Stream(_) => true,
            EngineError::Other(_) => false, // proxy or header setup errors
        }
    }
}

/// 响应体字节流
pub type ByteStream = BoxStream<'static, Result<Bytes, EngineError>>;

/// 响应体
///
/// 缓冲模式下为完整字节，流模式下为按块到达的字节流
pub enum Body {
    Buffered(Bytes),
    Stream(ByteStream),
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Buffered(bytes) => write!(f, "Body::Buffered({} bytes)", bytes.len()),
            Body::Stream(_) => f.write_str("Body::Stream"),
        }
    }
}

/// 传输请求
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// 目标URL
    pub url: String,
    /// 请求头（已合并User-Agent与自定义头）
    pub headers: HashMap<String, String>,
    /// 超时时间
    ///
    /// 缓冲请求是整体时限；流式请求只限制等待响应头，以及正文相邻两块之间的空闲时间
    pub timeout: Duration,
    /// 是否以流的方式读取响应体
    pub stream: bool,
    /// 字节范围（闭区间）
    pub range: Option<(u64, u64)>,
}

impl TransportRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            timeout: Duration::from_millis(crate::config::options::DEFAULT_TIMEOUT_MS),
            stream: false,
            range: None,
        }
    }
}

/// 传输响应
#[derive(Debug)]
pub struct TransportResponse {
    /// HTTP状态码
    pub status_code: u16,
    /// 响应头（小写键）
    pub headers: HashMap<String, String>,
    /// 响应体
    pub body: Body,
}

impl TransportResponse {
    /// 读取响应头
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// 读取 content-length
    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length")
            .and_then(|v| v.trim().parse::<u64>().ok())
    }
}

/// HTTP传输特质
///
/// 抓取器、分段下载器只通过该特质访问网络
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// 执行GET请求
    async fn get(&self, request: &TransportRequest) -> Result<TransportResponse, EngineError>;

    /// 执行HEAD请求
    async fn head(&self, request: &TransportRequest) -> Result<TransportResponse, EngineError>;

    /// 传输名称
    fn name(&self) -> &'static str;
}
