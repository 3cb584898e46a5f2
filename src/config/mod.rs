// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置、请求选项的分层合并以及键值配置文件
pub mod options;
pub mod settings;
pub mod store;
