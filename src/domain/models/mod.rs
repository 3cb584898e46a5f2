// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心数据结构，包括：
/// - 抓取结果（response）：带一次性变换缓存的响应
/// - 选择器模式（selector_pattern）：`选择器 => 格式化器` 小语言
/// - 提取结果（css_result）：`get`/`getall` 与可继续查询的片段
/// - 下载计划（download_plan）：分段下载的字节区间划分
pub mod css_result;
pub mod download_plan;
pub mod response;
pub mod selector_pattern;

pub use css_result::{CssResult, Selection};
pub use download_plan::{ByteRange, DownloadPlan};
pub use response::Response;
pub use selector_pattern::{Formatter, SelectorOptions, SelectorPattern};
