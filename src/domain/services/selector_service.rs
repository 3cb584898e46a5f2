// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::selector_pattern::{
    Extractor, Formatter, SelectorOptions, SelectorPattern, TemplatePart,
};
use crate::domain::services::transform_service::format_html;
use crate::utils::errors::SpiderError;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use serde_json::Value;

/// 按选择器模式提取内容
///
/// 选择器为空时只处理文档根元素；没有匹配时返回空列表
pub fn select(
    content: &str,
    pattern: &SelectorPattern,
    options: SelectorOptions,
) -> Result<Vec<String>, SpiderError> {
    let document = Html::parse_document(content);

    let Some(selector) = &pattern.selector else {
        let root = document.root_element();
        return Ok(vec![format_all(root, &pattern.formatters, options)?]);
    };

    let css = Selector::parse(selector)
        .map_err(|_| SpiderError::InvalidSelector(selector.clone()))?;
    document
        .select(&css)
        .map(|el| format_all(el, &pattern.formatters, options))
        .collect()
}

/// 用正则表达式反复匹配，收集指定捕获组
///
/// 捕获组没有参与匹配时记为空串
pub fn regex_all(content: &str, re: &Regex, group: usize) -> Result<Vec<String>, SpiderError> {
    let available = re.captures_len() - 1;
    if group > available {
        return Err(SpiderError::InvalidGroup { group, available });
    }
    Ok(re
        .captures_iter(content)
        .map(|caps| {
            caps.get(group)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        })
        .collect())
}

fn format_all(
    el: ElementRef<'_>,
    formatters: &[Formatter],
    options: SelectorOptions,
) -> Result<String, SpiderError> {
    let mut res = String::new();
    for formatter in formatters {
        res = match formatter {
            Formatter::Trim => res.trim().to_string(),
            Formatter::TrimLines => res
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
            Formatter::Head(n) => res.chars().take(*n).collect(),
            Formatter::Tail(n) => {
                let count = res.chars().count();
                res.chars().skip(count.saturating_sub(*n)).collect()
            }
            Formatter::Extract(extractor) => extract(el, extractor, options)?,
            Formatter::Template(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Literal(text) => out.push_str(text),
                        TemplatePart::Value(extractor) => {
                            out.push_str(&extract(el, extractor, options)?)
                        }
                    }
                }
                out
            }
        };
    }
    Ok(res)
}

fn unescape_or_not(s: String, options: SelectorOptions) -> String {
    if options.unescape {
        html_escape::decode_html_entities(&s).into_owned()
    } else {
        s
    }
}

fn extract(
    el: ElementRef<'_>,
    extractor: &Extractor,
    options: SelectorOptions,
) -> Result<String, SpiderError> {
    let value = match extractor {
        Extractor::Attribute(name) => unescape_or_not(
            el.value().attr(name).unwrap_or_default().to_string(),
            options,
        ),
        Extractor::Html => {
            let html = el.html();
            let html = if options.pretty { format_html(&html) } else { html };
            unescape_or_not(html, options)
        }
        Extractor::Text => unescape_or_not(el.text().collect(), options),
        Extractor::Element => el.html(),
        Extractor::Json => {
            let mut chunks = Vec::new();
            for child in el.children() {
                let chunk = match child.value() {
                    Node::Text(text) if options.pretty => {
                        let value: Value = serde_json::from_str(&**text)?;
                        serde_json::to_string_pretty(&value)?
                    }
                    Node::Text(text) => String::from(&**text),
                    _ => String::new(),
                };
                chunks.push(chunk);
            }
            chunks.join("\n")
        }
    };
    Ok(value)
}
