// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::options::{CacheDirective, PartialOptions};
use crate::infrastructure::storage;
use crate::spider::{ensure_url, ProgressListener, Spider};
use crate::utils::errors::SpiderError;
use std::path::Path;
use tokio::fs;
use tracing::{debug, error, info};

impl Spider {
    /// 下载URL并保存到文件
    ///
    /// 段数大于0时走分段下载，完成后一次性原子写入；否则以流模式抓取并
    /// 边下载边写入文件，不经过缓存。流中断时按重试预算重新下载，
    /// 预算耗尽或抓取失败只记录日志，不向调用方报错。
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 文件已完整写入
    /// * `Ok(false)` - 下载失败，已记录日志
    /// * `Err(SpiderError)` - URL非法、不支持分段下载或文件无法写入
    pub async fn save(
        &self,
        url: &str,
        file_path: &Path,
        overrides: &PartialOptions,
        listener: &dyn ProgressListener,
    ) -> Result<bool, SpiderError> {
        ensure_url(url)?;
        let options = self.options(overrides);

        if options.parts > 0 {
            let data = self
                .multipart_download(url, options.parts, overrides, listener)
                .await?;
            storage::write_atomic(file_path, &data).await?;
            info!("Saved {} to {}", url, file_path.display());
            return Ok(true);
        }

        let stream_overrides = overrides
            .clone()
            .stream(true)
            .cache(CacheDirective::Off);
        let attempts = options.retry.saturating_add(1);

        for attempt in 1..=attempts {
            let res = self.get(url, &stream_overrides).await?;
            if res.is_absent() {
                error!("Save {} failed: nothing fetched", url);
                return Ok(false);
            }

            let total = res.content_length();
            listener.on_start(&total.into_iter().collect::<Vec<_>>());

            let mut file = storage::create_file(file_path).await?;
            match res
                .pipe_to(&mut file, |downloaded, _| listener.on_progress(downloaded, total))
                .await
            {
                Ok(written) => {
                    listener.on_finish();
                    info!("Saved {} to {} ({} bytes)", url, file_path.display(), written);
                    return Ok(true);
                }
                Err(e @ SpiderError::Io(_)) => {
                    remove_partial(file_path).await;
                    return Err(e);
                }
                Err(e) if attempt < attempts => {
                    debug!("Retry save {} ({}/{}): {}", url, attempt, options.retry, e);
                }
                Err(e) => {
                    error!("Save {} failed after {} attempt(s): {}", url, attempt, e);
                }
            }
        }

        remove_partial(file_path).await;
        Ok(false)
    }
}

async fn remove_partial(file_path: &Path) {
    if let Err(e) = fs::remove_file(file_path).await {
        debug!("Remove partial file {}: {}", file_path.display(), e);
    }
}
