// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 缓存模块
///
/// 提供基于文件系统的响应缓存
/// 包括缓存路径推导与有效期判断
pub mod cache_path;
pub mod disk_cache;

pub use cache_path::{to_file_path, CacheKeyFormat};
pub use disk_cache::DiskCache;
