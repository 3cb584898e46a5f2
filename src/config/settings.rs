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

use crate::config::options::{DEFAULT_EXPIRE_SECS, DEFAULT_TIMEOUT_MS};
use crate::config::store::ConfigStore;
use crate::utils::errors::SpiderError;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// 应用程序配置设置
///
/// 包含缓存目录、代理、User-Agent、超时、重试与并发等配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 默认缓存目录，未设置时使用系统临时目录
    pub cache_path: Option<String>,
    /// 代理地址
    pub proxy: Option<String>,
    /// User-Agent预设名称
    pub user_agent: Option<String>,
    /// 请求超时（毫秒）
    pub timeout_ms: u64,
    /// 重试次数
    pub retry: u32,
    /// 并发任务数
    pub parallel: usize,
    /// 缓存过期时间（秒）
    pub expire_secs: u64,
    /// 日志级别
    pub log: String,
    /// 是否跳过TLS验证
    pub skip_tls_verification: bool,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从用户主目录下的配置文件与环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(SpiderError)` - 配置加载失败
    pub fn new() -> Result<Self, SpiderError> {
        Self::load(&ConfigStore::default_path())
    }

    /// 从指定配置文件加载
    ///
    /// 加载顺序：默认值 → JSON配置文件（可选）→ `SPIDER_` 前缀的环境变量。
    /// 在配置文件中被禁用的键视为未设置。
    pub fn load(path: &Path) -> Result<Self, SpiderError> {
        let builder = Config::builder()
            .set_default("timeout_ms", DEFAULT_TIMEOUT_MS)?
            .set_default("retry", 0)?
            .set_default("parallel", 1)?
            .set_default("expire_secs", DEFAULT_EXPIRE_SECS)?
            .set_default("log", "silent")?
            .set_default("skip_tls_verification", false)?
            .add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Json)
                    .required(false),
            )
            .add_source(Environment::with_prefix("SPIDER").separator("__"));

        let mut settings: Settings = builder.build()?.try_deserialize()?;

        let store = ConfigStore::open(path)?;
        if store.is_disabled("cache_path") {
            settings.cache_path = None;
        }
        if store.is_disabled("proxy") {
            settings.proxy = None;
        }
        if store.is_disabled("user_agent") {
            settings.user_agent = None;
        }

        Ok(settings)
    }

    /// 默认缓存目录
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_path: None,
            proxy: None,
            user_agent: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retry: 0,
            parallel: 1,
            expire_secs: DEFAULT_EXPIRE_SECS,
            log: "silent".to_string(),
            skip_tls_verification: false,
        }
    }
}
