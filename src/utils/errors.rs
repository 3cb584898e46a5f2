// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::EngineError;
use thiserror::Error;

/// 爬虫错误类型
///
/// 结构性错误（非法URL、不支持分段下载、非法参数）直接返回给调用方，
/// 瞬时网络错误由抓取器在重试预算内自行吸收。
#[derive(Error, Debug)]
pub enum SpiderError {
    #[error("Malform URL: {0}")]
    MalformedUrl(String),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("Multipart download not supported: {0}")]
    MultipartUnsupported(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid image level: {0}")]
    InvalidImageLevel(u8),

    #[error("Invalid capture group {group}, pattern has {available} groups")]
    InvalidGroup { group: usize, available: usize },

    #[error("Invalid selector `{0}`")]
    InvalidSelector(String),

    #[error("Invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),

    #[error("Part {index} expected {expected} bytes, got {actual}")]
    PartLengthMismatch {
        index: usize,
        expected: u64,
        actual: u64,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}
