// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含抓取结果的核心处理逻辑，包括：
/// - 领域模型（models）：抓取结果、选择器模式、提取结果、下载计划
/// - 服务（services）：内容变换、选择器求值、链接规范化
///
/// 领域层不做任何网络或文件IO。
pub mod models;
pub mod services;
