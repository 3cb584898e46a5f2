// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含与文件系统交互的技术实现细节。
///
/// 包含的子模块：
/// - 缓存（cache）：以URL推导路径的磁盘缓存
/// - 存储（storage）：下载结果的落盘
pub mod cache;
pub mod storage;
