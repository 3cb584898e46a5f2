// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 将命令行日志级别转换为过滤指令
///
/// `silent` 与未知级别关闭全部日志
pub fn filter_directive(level: &str) -> String {
    let level = match level.trim().to_ascii_lowercase().as_str() {
        "silent" | "none" | "off" => "off",
        "error" => "error",
        "warn" | "warning" => "warn",
        "info" | "progress" => "info",
        "debug" => "debug",
        "trace" => "trace",
        _ => "off",
    };
    format!("{},spiderkit={}", level, level)
}

/// 初始化日志
///
/// `RUST_LOG` 优先；日志写入 stderr，stdout 只输出结果
pub fn init_telemetry(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter_directive(level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
