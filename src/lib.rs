// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理配置文件、环境变量与分层的请求选项
pub mod config;

/// 领域模块
///
/// 包含抓取结果、选择器模式、下载计划以及内容变换与提取服务
pub mod domain;

/// 引擎模块
///
/// HTTP传输抽象及其reqwest实现
pub mod engines;

/// 基础设施模块
///
/// 提供磁盘缓存与文件存储
pub mod infrastructure;

/// 队列模块
///
/// 实现URL模式展开和有界并发调度
pub mod queue;

/// 爬虫模块
///
/// 抓取、分段下载、保存与翻页的入口
pub mod spider;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

pub use spider::Spider;
