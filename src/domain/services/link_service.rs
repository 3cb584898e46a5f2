// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::Url;

/// URL的站点与路径段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl<'a> {
    /// 协议与主机，例如 `https://x.test`
    pub domain: String,
    /// 路径段（已去掉空段）
    pub parts: Vec<&'a str>,
}

/// 拆分URL为站点与路径段
pub fn parse_url(url: &str) -> ParsedUrl<'_> {
    let pieces: Vec<&str> = url.split('/').collect();
    let domain = pieces
        .iter()
        .take(3)
        .copied()
        .collect::<Vec<_>>()
        .join("/");
    let parts = pieces
        .iter()
        .skip(3)
        .copied()
        .filter(|p| !p.is_empty())
        .collect();
    ParsedUrl { domain, parts }
}

/// URL的站点部分
pub fn domain_of(url: &str) -> String {
    parse_url(url).domain
}

fn has_scheme(link: &str) -> bool {
    Url::parse(link).is_ok()
}

/// 把页面中的链接规范化为绝对地址
///
/// 规则：
/// - 空链接原样返回
/// - 已带协议的链接原样返回
/// - `//` 开头的链接补 `https:`
/// - `/` 或 `..` 开头的链接按路径段解析：`..` 段被移除，`.` 段替换为页面URL同位置的路径段
/// - 最终拼接到页面URL的站点部分之后
///
/// 对同一页面URL重复规范化结果不变
pub fn normalize_link(url: &str, link: &str) -> String {
    if link.is_empty() || has_scheme(link) {
        return link.to_string();
    }
    if link.starts_with("//") {
        return format!("https:{}", link);
    }

    let ParsedUrl { domain, parts } = parse_url(url);
    let link = if link.starts_with('/') || link.starts_with("..") {
        let stripped = link.strip_prefix('/').unwrap_or(link);
        stripped
            .split('/')
            .enumerate()
            .filter_map(|(i, part)| match part {
                ".." => None,
                "." => parts.get(i).copied(),
                other => Some(other),
            })
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    } else {
        link.to_string()
    };

    format!("{}/{}", domain, link)
}
