// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::SpiderError;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 配置文件名
pub const CONFIG_FILE_NAME: &str = ".spider.cli.json";

const DISABLES_KEY: &str = "__disables";

/// 键值配置存储
///
/// 以 JSON 文件持久化，每次写操作立即落盘。被禁用的键保留原值，但读取时视为不存在。
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    data: Map<String, Value>,
}

impl ConfigStore {
    /// 默认配置文件路径（用户主目录下）
    pub fn default_path() -> PathBuf {
        home::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_FILE_NAME)
    }

    /// 打开配置文件，文件不存在或为空时得到空存储
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SpiderError> {
        let path = path.into();
        let data = match fs::read_to_string(&path) {
            Ok(content) if !content.trim().is_empty() => {
                match serde_json::from_str::<Value>(&content)? {
                    Value::Object(map) => map,
                    _ => Map::new(),
                }
            }
            Ok(_) => Map::new(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(e.into()),
        };
        debug!("Config loaded from {}", path.display());
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取配置项
    ///
    /// `*` 返回除内部禁用表外的所有键
    pub fn get(&self, key: &str) -> Option<Value> {
        if key == "*" {
            let all: Map<String, Value> = self
                .data
                .iter()
                .filter(|(k, _)| k.as_str() != DISABLES_KEY)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            return Some(Value::Object(all));
        }
        if self.is_disabled(key) {
            return None;
        }
        self.data.get(key).cloned()
    }

    /// 读取字符串配置项
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// 判断键是否被禁用
    pub fn is_disabled(&self, key: &str) -> bool {
        self.data
            .get(DISABLES_KEY)
            .and_then(Value::as_object)
            .is_some_and(|disables| disables.contains_key(key))
    }

    /// 写入配置项并落盘
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), SpiderError> {
        self.data.insert(key.to_string(), value);
        self.save()
    }

    /// 启用或禁用配置项并落盘
    pub fn toggle(&mut self, key: &str, enable: bool) -> Result<(), SpiderError> {
        let disables = self
            .data
            .entry(DISABLES_KEY.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !disables.is_object() {
            *disables = Value::Object(Map::new());
        }
        if let Value::Object(map) = disables {
            if enable {
                map.remove(key);
            } else {
                map.insert(key.to_string(), Value::from(1));
            }
        }
        self.save()
    }

    fn save(&mut self) -> Result<(), SpiderError> {
        self.data
            .entry(DISABLES_KEY.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&Value::Object(self.data.clone()))?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}
