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

use crate::engines::traits::{
    Body, ByteStream, EngineError, HttpTransport, TransportRequest, TransportResponse,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RANGE};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// 基于reqwest实现的HTTP传输
///
/// 一个实例共享一个连接池；代理与TLS设置在构造时确定
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// 创建传输实例
    ///
    /// # 参数
    ///
    /// * `proxy` - 代理地址，`host:port` 形式按 socks5 处理
    /// * `skip_tls_verification` - 是否跳过证书校验
    ///
    /// # 返回值
    ///
    /// * `Ok(ReqwestTransport)` - 传输实例
    /// * `Err(EngineError)` - 代理地址非法或客户端构建失败
    pub fn new(proxy: Option<&str>, skip_tls_verification: bool) -> Result<Self, EngineError> {
        let mut builder = reqwest::Client::builder();

        if let Some(proxy_url) = proxy.map(str::trim).filter(|p| !p.is_empty()) {
            let proxy_url = if proxy_url.contains("://") {
                proxy_url.to_string()
            } else {
                format!("socks5://{}", proxy_url)
            };
            debug!("Using proxy: {}", proxy_url);
            let proxy = reqwest::Proxy::all(&proxy_url)
                .map_err(|e| EngineError::Other(format!("Invalid proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        if skip_tls_verification {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    fn build_headers(request: &TransportRequest) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (k, v) in &request.headers {
            if let (Ok(k), Ok(v)) = (
                HeaderName::from_bytes(k.as_bytes()),
                HeaderValue::from_str(v),
            ) {
                headers.insert(k, v);
            }
        }
        if let Some((start, end)) = request.range {
            if let Ok(v) = HeaderValue::from_str(&format!("bytes={}-{}", start, end)) {
                headers.insert(RANGE, v);
            }
        }
        headers
    }

    async fn execute(
        &self,
        builder: reqwest::RequestBuilder,
        request: &TransportRequest,
        read_body: bool,
    ) -> Result<TransportResponse, EngineError> {
        let start = Instant::now();
        let builder = builder.headers(Self::build_headers(request));
        // 流式请求的超时只覆盖等待响应头，读取正文改用空闲超时
        let sent = if request.stream {
            tokio::time::timeout(request.timeout, builder.send())
                .await
                .map_err(|_| EngineError::Timeout)?
        } else {
            builder.timeout(request.timeout).send().await
        };
        let response = sent.map_err(|e| {
            if e.is_timeout() {
                EngineError::Timeout
            } else {
                EngineError::RequestFailed(e)
            }
        })?;

        let status_code = response.status().as_u16();
        if !response.status().is_success() {
            return Err(EngineError::Status(status_code));
        }

        let mut headers = HashMap::new();
        for (k, v) in response.headers() {
            if let Ok(v_str) = v.to_str() {
                headers.insert(k.as_str().to_ascii_lowercase(), v_str.to_string());
            }
        }

        let body = if !read_body {
            Body::Buffered(Bytes::new())
        } else if request.stream {
            Body::Stream(idle_timeout(response.bytes_stream(), request.timeout))
        } else {
            Body::Buffered(response.bytes().await?)
        };

        debug!(
            "{} {} in {}ms",
            status_code,
            request.url,
            start.elapsed().as_millis()
        );

        Ok(TransportResponse {
            status_code,
            headers,
            body,
        })
    }
}

/// 把响应正文包装为字节流，相邻两块之间超过 `idle` 没有数据即以超时结束
fn idle_timeout<S>(body: S, idle: Duration) -> ByteStream
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    stream::unfold(Some(body.boxed()), move |state| async move {
        let mut inner = state?;
        match tokio::time::timeout(idle, inner.next()).await {
            Ok(Some(Ok(chunk))) => Some((Ok(chunk), Some(inner))),
            Ok(Some(Err(e))) => Some((Err(EngineError::Stream(e.to_string())), None)),
            Ok(None) => None,
            Err(_) => Some((Err(EngineError::Timeout), None)),
        }
    })
    .boxed()
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    /// 执行GET请求
    ///
    /// 非2xx状态码视为失败，交由抓取器的重试策略处理
    async fn get(&self, request: &TransportRequest) -> Result<TransportResponse, EngineError> {
        debug!("Get {}", request.url);
        self.execute(self.client.get(&request.url), request, true)
            .await
    }

    async fn head(&self, request: &TransportRequest) -> Result<TransportResponse, EngineError> {
        debug!("Head {}", request.url);
        self.execute(self.client.head(&request.url), request, false)
            .await
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
