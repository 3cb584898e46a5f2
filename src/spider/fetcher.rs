// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::options::{PartialOptions, SpiderOptions};
use crate::domain::models::response::Response;
use crate::engines::traits::{Body, TransportResponse};
use crate::infrastructure::cache::DiskCache;
use crate::spider::{ensure_url, Spider};
use crate::utils::errors::SpiderError;
use crate::utils::stream::collect_stream;
use std::path::Path;
use tracing::{debug, error, warn};

impl Spider {
    /// 抓取URL
    ///
    /// 传输失败按重试预算立即重试，预算耗尽后返回空结果而不是错误；
    /// 只有URL协议非法时返回 `MalformedUrl`。
    ///
    /// 缓存开启时：
    /// - 缓冲模式命中直接读文件，未命中则抓取后写入缓存
    /// - 流模式命中从文件流式读取，未命中则边下载边写入缓存
    ///
    /// # 参数
    ///
    /// * `url` - 绝对URL
    /// * `overrides` - 本次调用的覆盖选项
    pub async fn get(&self, url: &str, overrides: &PartialOptions) -> Result<Response, SpiderError> {
        ensure_url(url)?;
        let options = self.options(overrides);

        let Some(root) = options.cache.root(&self.cache_dir) else {
            return Ok(match self.fetch_with_retry(url, &options).await {
                Some(res) => Response::from_transport(url, res, &options),
                None => Response::absent(url, &options),
            });
        };

        let cache = DiskCache::new(root).with_format(self.cache_format);
        let path = cache.path_for(url);
        let valid = cache.is_valid(&path, options.expire).await;
        if valid {
            debug!("Cached: {}", path.display());
        }

        let response = match (options.stream, valid) {
            (true, true) => {
                let stream = cache.read_stream(&path).await?;
                Response::from_body(url, Body::Stream(stream), &options)
            }
            (false, true) => {
                let data = cache.read(&path).await?;
                Response::from_body(url, Body::Buffered(data), &options)
            }
            (_, false) => match self.fetch_with_retry(url, &options).await {
                Some(res) => {
                    let res = Self::store(&cache, &path, res).await?;
                    Response::from_transport(url, res, &options)
                }
                None => Response::absent(url, &options),
            },
        };
        Ok(response)
    }

    /// 按重试预算执行GET
    ///
    /// 不可重试的错误立即放弃
    async fn fetch_with_retry(&self, url: &str, options: &SpiderOptions) -> Option<TransportResponse> {
        let request = self.build_request(url, options);
        let attempts = options.retry.saturating_add(1);

        for attempt in 1..=attempts {
            match self.transport.get(&request).await {
                Ok(res) => return Some(res),
                Err(e) if attempt < attempts && e.is_retryable() => {
                    debug!("Retry {} ({}/{}): {}", url, attempt, options.retry, e);
                }
                Err(e) => {
                    error!("Fetch {} failed after {} attempt(s): {}", url, attempt, e);
                    break;
                }
            }
        }
        None
    }

    /// 写入缓存并返回可继续读取的响应
    ///
    /// 流内容经由 tee 边读边写；缓冲内容写缓存失败只记录日志
    async fn store(
        cache: &DiskCache,
        path: &Path,
        res: TransportResponse,
    ) -> Result<TransportResponse, SpiderError> {
        let TransportResponse {
            status_code,
            headers,
            body,
        } = res;

        let body = match body {
            Body::Stream(stream) => Body::Stream(cache.tee(path, stream).await?),
            Body::Buffered(data) => {
                if let Err(e) = cache.write(path, &data).await {
                    warn!("Cache write failed for {}: {}", path.display(), e);
                }
                Body::Buffered(data)
            }
        };

        Ok(TransportResponse {
            status_code,
            headers,
            body,
        })
    }

    /// 抓取并收集完整内容，忽略缓存与变换
    pub async fn get_bytes(
        &self,
        url: &str,
        overrides: &PartialOptions,
    ) -> Result<Option<bytes::Bytes>, SpiderError> {
        let res = self.get(url, overrides).await?;
        match res.take_body().await {
            Some(Body::Buffered(data)) => Ok(Some(data)),
            Some(Body::Stream(stream)) => Ok(Some(collect_stream(stream, |_, _| {}).await?)),
            None => Ok(None),
        }
    }
}
