// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::BTreeMap;

/// 解析命令行传入的请求头描述
///
/// 多个头以字面量 `\n` 分隔，首个 `:` 之前为键，之后为值
pub fn parse_headers(desc: &str) -> BTreeMap<String, String> {
    desc.split("\\n")
        .flat_map(|line| line.split('\n'))
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// 根据保存路径模板生成文件路径
///
/// 模板中的 `%file` 替换为URL最后一段
pub fn to_save_path(url: &str, pattern: &str) -> String {
    if pattern.contains("%file") {
        let file = url
            .split(['?', '#'])
            .next()
            .unwrap_or(url)
            .rsplit('/')
            .next()
            .unwrap_or_default();
        pattern.replacen("%file", file, 1)
    } else {
        pattern.to_string()
    }
}
