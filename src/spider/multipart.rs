// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::options::{PartialOptions, SpiderOptions};
use crate::domain::models::download_plan::{ByteRange, DownloadPlan};
use crate::engines::traits::{Body, EngineError};
use crate::spider::{ensure_url, ProgressListener, Spider};
use crate::utils::errors::SpiderError;
use crate::utils::stream::collect_stream;
use bytes::{Bytes, BytesMut};
use futures::future::try_join_all;
use tracing::{debug, info};

impl Spider {
    /// 分段并发下载
    ///
    /// 先用HEAD探测长度与 `accept-ranges`，服务器不支持范围请求时返回
    /// `MultipartUnsupported`，由调用方决定是否回退到单流下载。
    /// 各段并发下载，按范围顺序拼接；任一段失败则整体失败。
    ///
    /// # 参数
    ///
    /// * `url` - 绝对URL
    /// * `parts` - 段数，大于总长度时按总长度处理
    /// * `overrides` - 本次调用的覆盖选项
    /// * `listener` - 进度监听
    pub async fn multipart_download(
        &self,
        url: &str,
        parts: u32,
        overrides: &PartialOptions,
        listener: &dyn ProgressListener,
    ) -> Result<Bytes, SpiderError> {
        ensure_url(url)?;
        let options = self.options(overrides);

        let head = self.transport.head(&self.build_request(url, &options)).await?;
        let total = head.content_length().unwrap_or(0);
        let ranged = head
            .header("accept-ranges")
            .is_some_and(|v| !v.trim().eq_ignore_ascii_case("none"));
        if total == 0 || !ranged {
            return Err(SpiderError::MultipartUnsupported(url.to_string()));
        }

        let plan = DownloadPlan::partition(total, parts)?;
        debug!("Multipart {} in {} part(s), {} bytes", url, plan.ranges.len(), total);
        listener.on_start(&plan.part_sizes());

        let bodies = try_join_all(
            plan.ranges
                .iter()
                .map(|range| self.fetch_part(url, &options, *range, listener)),
        )
        .await?;

        let mut data = BytesMut::with_capacity(total as usize);
        for body in &bodies {
            data.extend_from_slice(body);
        }
        listener.on_finish();
        info!("Downloaded {} ({} bytes)", url, data.len());
        Ok(data.freeze())
    }

    /// 下载单个范围，传输失败按重试预算重试
    ///
    /// 长度不符说明服务器忽略了范围请求，不重试
    async fn fetch_part(
        &self,
        url: &str,
        options: &SpiderOptions,
        range: ByteRange,
        listener: &dyn ProgressListener,
    ) -> Result<Bytes, SpiderError> {
        let mut request = self.build_request(url, options);
        request.stream = true;
        request.range = Some((range.start, range.end));
        let attempts = options.retry.saturating_add(1);

        // 重试时流从头开始，只上报超出已上报部分的增量
        let mut reported = 0u64;
        let mut attempt = 0;
        let data = loop {
            attempt += 1;
            let result = match self.transport.get(&request).await {
                Ok(res) => match res.body {
                    Body::Buffered(data) => Ok(data),
                    Body::Stream(stream) => {
                        collect_stream(stream, |downloaded, _| {
                            if downloaded > reported {
                                listener.on_part_progress(
                                    range.index,
                                    downloaded,
                                    downloaded - reported,
                                );
                                reported = downloaded;
                            }
                        })
                        .await
                    }
                },
                Err(e) => Err(e),
            };
            match result {
                Ok(data) => break data,
                Err(e) if attempt < attempts && e.is_retryable() => {
                    debug!(
                        "Retry part {} of {} ({}/{}): {}",
                        range.index, url, attempt, options.retry, e
                    );
                }
                Err(e) => return Err(part_error(range, e)),
            }
        };

        if data.len() as u64 != range.len() {
            return Err(SpiderError::PartLengthMismatch {
                index: range.index,
                expected: range.len(),
                actual: data.len() as u64,
            });
        }
        Ok(data)
    }
}

fn part_error(range: ByteRange, e: EngineError) -> SpiderError {
    debug!("Part {} ({}) failed: {}", range.index, range.header_value(), e);
    SpiderError::Transport(e)
}
