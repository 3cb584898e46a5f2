// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 提供URL模式展开与有界并发调度功能
/// 负责任务的产生、派发和结果交付
pub mod scheduler;
pub mod url_pattern;
