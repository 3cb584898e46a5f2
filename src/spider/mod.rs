// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 爬虫模块
///
/// 组合传输、缓存与领域层，提供抓取、分段下载、保存、翻页与批量运行
pub mod fetcher;
pub mod follow;
pub mod multipart;
pub mod save;
#[cfg(test)]
mod testing;

pub use follow::{FollowPager, PagePager};

use crate::config::options::{PartialOptions, SpiderOptions};
use crate::config::settings::Settings;
use crate::engines::reqwest_engine::ReqwestTransport;
use crate::engines::traits::{HttpTransport, TransportRequest};
use crate::engines::user_agents;
use crate::infrastructure::cache::CacheKeyFormat;
use crate::utils::errors::SpiderError;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 下载进度监听
///
/// 所有方法都有空实现，按需覆盖
pub trait ProgressListener: Send + Sync {
    /// 开始下载，参数为各段的字节数；单流下载且长度已知时只有一段
    fn on_start(&self, _part_sizes: &[u64]) {}

    /// 分段下载中某一段收到数据
    fn on_part_progress(&self, _part: usize, _downloaded: u64, _increment: u64) {}

    /// 单流下载收到数据
    fn on_progress(&self, _downloaded: u64, _total: Option<u64>) {}

    /// 下载结束
    fn on_finish(&self) {}
}

/// 不关心进度
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressListener for NoProgress {}

/// 检查URL协议
///
/// 只接受 `http:`、`https:`、`ftp:` 开头的绝对URL
pub fn ensure_url(url: &str) -> Result<(), SpiderError> {
    if ["http:", "https:", "ftp:"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
    {
        Ok(())
    } else {
        Err(SpiderError::MalformedUrl(url.to_string()))
    }
}

/// 爬虫
///
/// 持有传输实例与默认选项；每次调用的覆盖选项在默认选项之上合并
#[derive(Clone)]
pub struct Spider {
    transport: Arc<dyn HttpTransport>,
    defaults: SpiderOptions,
    cache_dir: PathBuf,
    cache_format: CacheKeyFormat,
}

impl std::fmt::Debug for Spider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spider")
            .field("transport", &self.transport.name())
            .field("defaults", &self.defaults)
            .field("cache_dir", &self.cache_dir)
            .field("cache_format", &self.cache_format)
            .finish()
    }
}

impl Spider {
    /// 使用reqwest传输创建爬虫
    pub fn new(defaults: SpiderOptions) -> Result<Self, SpiderError> {
        let transport = ReqwestTransport::new(None, false)?;
        Ok(Self::with_transport(Arc::new(transport), defaults))
    }

    /// 使用指定传输创建爬虫
    pub fn with_transport(transport: Arc<dyn HttpTransport>, defaults: SpiderOptions) -> Self {
        Self {
            transport,
            defaults,
            cache_dir: std::env::temp_dir(),
            cache_format: CacheKeyFormat::default(),
        }
    }

    /// 由配置创建爬虫
    ///
    /// 选项合并顺序：配置 → `overrides`；代理与TLS设置作用于传输
    pub fn from_settings(settings: &Settings, overrides: &PartialOptions) -> Result<Self, SpiderError> {
        let transport =
            ReqwestTransport::new(settings.proxy.as_deref(), settings.skip_tls_verification)?;
        let defaults = SpiderOptions::from_settings(settings).merged(overrides);
        Ok(Self::with_transport(Arc::new(transport), defaults).with_cache_dir(settings.cache_dir()))
    }

    /// 设置默认缓存目录
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_cache_format(mut self, format: CacheKeyFormat) -> Self {
        self.cache_format = format;
        self
    }

    pub fn defaults(&self) -> &SpiderOptions {
        &self.defaults
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    fn options(&self, overrides: &PartialOptions) -> SpiderOptions {
        self.defaults.merged(overrides)
    }

    /// 构造传输请求：User-Agent预设在前，自定义请求头覆盖同名键
    fn build_request(&self, url: &str, options: &SpiderOptions) -> TransportRequest {
        let mut request = TransportRequest::new(url);
        request.headers.insert(
            "User-Agent".to_string(),
            user_agents::resolve(options.user_agent.as_deref()).to_string(),
        );
        for (key, value) in &options.headers {
            request.headers.insert(key.clone(), value.clone());
        }
        request.timeout = options.timeout;
        request.stream = options.stream;
        request
    }
}
