// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工具模块
///
/// 提供错误类型、日志初始化、字节流处理、文本解码、结果输出和请求头解析
pub mod errors;
pub mod headers;
pub mod output;
pub mod progress;
pub mod stream;
pub mod telemetry;
pub mod text_encoding;
