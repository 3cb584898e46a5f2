// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 链接服务（link_service）：相对链接的规范化
/// - 选择器服务（selector_service）：选择器模式与正则的求值
/// - 变换服务（transform_service）：内容变换流水线
pub mod link_service;
pub mod selector_service;
pub mod transform_service;
