// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::Settings;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 默认请求超时（毫秒）
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// 默认缓存过期时间（秒）
pub const DEFAULT_EXPIRE_SECS: u64 = 86_400;

/// 缓存指令
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CacheDirective {
    /// 不使用缓存
    #[default]
    Off,
    /// 使用默认缓存目录
    DefaultDir,
    /// 使用指定缓存目录
    Dir(PathBuf),
}

impl CacheDirective {
    /// 解析缓存根目录
    ///
    /// 关闭缓存时返回 `None`
    pub fn root(&self, default_dir: &Path) -> Option<PathBuf> {
        match self {
            CacheDirective::Off => None,
            CacheDirective::DefaultDir => Some(default_dir.to_path_buf()),
            CacheDirective::Dir(dir) => Some(dir.clone()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, CacheDirective::Off)
    }
}

/// 内容变换步骤，按执行顺序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformStep {
    RemoveScripts,
    RemoveHeads,
    RemoveStyles,
    RemoveComments,
    RemoveAttributes,
    NormalizeLinks,
    DecodeEntities,
    FormatHtml,
    RemoveEmptyLines,
}

impl TransformStep {
    /// 固定的执行顺序
    pub const ORDER: [TransformStep; 9] = [
        TransformStep::RemoveScripts,
        TransformStep::RemoveHeads,
        TransformStep::RemoveStyles,
        TransformStep::RemoveComments,
        TransformStep::RemoveAttributes,
        TransformStep::NormalizeLinks,
        TransformStep::DecodeEntities,
        TransformStep::FormatHtml,
        TransformStep::RemoveEmptyLines,
    ];
}

/// 内容变换开关
///
/// `pretty` 打开全部步骤
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformFlags {
    pub remove_scripts: bool,
    pub remove_heads: bool,
    pub remove_styles: bool,
    pub remove_comments: bool,
    pub remove_attributes: bool,
    pub normalize_links: bool,
    pub decode_entities: bool,
    pub format_html: bool,
    pub remove_empty_lines: bool,
    pub pretty: bool,
}

impl TransformFlags {
    /// 全部开启
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            ..Self::default()
        }
    }

    /// 判断步骤是否启用
    pub fn is_enabled(&self, step: TransformStep) -> bool {
        if self.pretty {
            return true;
        }
        match step {
            TransformStep::RemoveScripts => self.remove_scripts,
            TransformStep::RemoveHeads => self.remove_heads,
            TransformStep::RemoveStyles => self.remove_styles,
            TransformStep::RemoveComments => self.remove_comments,
            TransformStep::RemoveAttributes => self.remove_attributes,
            TransformStep::NormalizeLinks => self.normalize_links,
            TransformStep::DecodeEntities => self.decode_entities,
            TransformStep::FormatHtml => self.format_html,
            TransformStep::RemoveEmptyLines => self.remove_empty_lines,
        }
    }

    /// 按固定顺序列出启用的步骤
    pub fn enabled_steps(&self) -> Vec<TransformStep> {
        TransformStep::ORDER
            .iter()
            .copied()
            .filter(|step| self.is_enabled(*step))
            .collect()
    }
}

/// 爬虫请求选项
///
/// 由配置文件、爬虫默认值与单次调用覆盖逐层合并而来，合并后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiderOptions {
    /// 缓存指令
    pub cache: CacheDirective,
    /// 缓存过期时间
    pub expire: Duration,
    /// 是否流模式
    pub stream: bool,
    /// 重试预算
    pub retry: u32,
    /// 请求超时
    pub timeout: Duration,
    /// 自定义请求头
    pub headers: BTreeMap<String, String>,
    /// User-Agent预设名称
    pub user_agent: Option<String>,
    /// 内容变换开关
    pub transforms: TransformFlags,
    /// 选择器输出是否解码HTML实体
    pub unescape: bool,
    /// 分段下载的段数，0 表示不分段
    pub parts: u32,
}

impl Default for SpiderOptions {
    fn default() -> Self {
        Self {
            cache: CacheDirective::Off,
            expire: Duration::from_secs(DEFAULT_EXPIRE_SECS),
            stream: false,
            retry: 0,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            headers: BTreeMap::new(),
            user_agent: None,
            transforms: TransformFlags::default(),
            unescape: false,
            parts: 0,
        }
    }
}

impl SpiderOptions {
    /// 从配置设置构造基础选项
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            retry: settings.retry,
            timeout: Duration::from_millis(settings.timeout_ms),
            expire: Duration::from_secs(settings.expire_secs),
            user_agent: settings.user_agent.clone(),
            ..Self::default()
        }
    }

    /// 合并覆盖层，覆盖层中已设置的字段优先
    ///
    /// 请求头按键合并，同名键取覆盖层的值
    pub fn merged(&self, overrides: &PartialOptions) -> Self {
        let mut headers = self.headers.clone();
        if let Some(extra) = &overrides.headers {
            headers.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        Self {
            cache: overrides.cache.clone().unwrap_or_else(|| self.cache.clone()),
            expire: overrides.expire.unwrap_or(self.expire),
            stream: overrides.stream.unwrap_or(self.stream),
            retry: overrides.retry.unwrap_or(self.retry),
            timeout: overrides.timeout.unwrap_or(self.timeout),
            headers,
            user_agent: overrides
                .user_agent
                .clone()
                .or_else(|| self.user_agent.clone()),
            transforms: overrides.transforms.unwrap_or(self.transforms),
            unescape: overrides.unescape.unwrap_or(self.unescape),
            parts: overrides.parts.unwrap_or(self.parts),
        }
    }
}

/// 单层的部分选项
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialOptions {
    pub cache: Option<CacheDirective>,
    pub expire: Option<Duration>,
    pub stream: Option<bool>,
    pub retry: Option<u32>,
    pub timeout: Option<Duration>,
    pub headers: Option<BTreeMap<String, String>>,
    pub user_agent: Option<String>,
    pub transforms: Option<TransformFlags>,
    pub unescape: Option<bool>,
    pub parts: Option<u32>,
}

impl PartialOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(mut self, cache: CacheDirective) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn expire(mut self, expire: Duration) -> Self {
        self.expire = Some(expire);
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn user_agent(mut self, key: impl Into<String>) -> Self {
        self.user_agent = Some(key.into());
        self
    }

    pub fn transforms(mut self, transforms: TransformFlags) -> Self {
        self.transforms = Some(transforms);
        self
    }

    pub fn unescape(mut self, unescape: bool) -> Self {
        self.unescape = Some(unescape);
        self
    }

    pub fn parts(mut self, parts: u32) -> Self {
        self.parts = Some(parts);
        self
    }
}
