// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;

static HEAD_TAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(head|tail)\((\d+)\)$").expect("static regex is valid"));
static ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@([A-Za-z0-9_\-|]+)$").expect("static regex is valid"));
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@([A-Za-z0-9_\-|]+)|%(html|text|json|el)").expect("static regex is valid")
});

/// 选择器模式分隔符
pub const PATTERN_SEPARATOR: &str = "=>";

/// 选择器输出选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectorOptions {
    /// 解码输出中的HTML实体
    pub unescape: bool,
    /// 格式化 `%html` 与 `%json` 的输出
    pub pretty: bool,
}

/// 从元素中取值的占位符
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extractor {
    /// `@name` 属性值，缺失时为空串
    Attribute(String),
    /// `%html` 元素的外部HTML
    Html,
    /// `%text` 元素的全部文本
    Text,
    /// `%json` 子文本节点，按行拼接
    Json,
    /// `%el` 元素本身
    Element,
}

/// 模板片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Literal(String),
    Value(Extractor),
}

/// 格式化器
///
/// 取值类格式化器从当前元素重新取值，文本类格式化器作用于上一步的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formatter {
    Extract(Extractor),
    Trim,
    TrimLines,
    Head(usize),
    Tail(usize),
    /// 其他记号：按占位符替换，其余原样输出
    Template(Vec<TemplatePart>),
}

impl Formatter {
    /// 解析单个格式化记号
    pub fn parse(token: &str) -> Self {
        match token {
            "trim" => return Formatter::Trim,
            "trimLines" => return Formatter::TrimLines,
            "%html" => return Formatter::Extract(Extractor::Html),
            "%text" => return Formatter::Extract(Extractor::Text),
            "%json" => return Formatter::Extract(Extractor::Json),
            "%el" => return Formatter::Extract(Extractor::Element),
            _ => {}
        }

        if let Some(caps) = HEAD_TAIL.captures(token) {
            if let Ok(n) = caps[2].parse::<usize>() {
                return match &caps[1] {
                    "head" => Formatter::Head(n),
                    _ => Formatter::Tail(n),
                };
            }
        }

        if let Some(caps) = ATTRIBUTE.captures(token) {
            return Formatter::Extract(Extractor::Attribute(caps[1].to_string()));
        }

        Formatter::Template(parse_template(token))
    }
}

fn parse_template(token: &str) -> Vec<TemplatePart> {
    let mut parts = Vec::new();
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(token) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last {
            parts.push(TemplatePart::Literal(token[last..whole.start()].to_string()));
        }
        let extractor = match (caps.get(1), caps.get(2).map(|m| m.as_str())) {
            (Some(name), _) => Extractor::Attribute(name.as_str().to_string()),
            (None, Some("html")) => Extractor::Html,
            (None, Some("text")) => Extractor::Text,
            (None, Some("json")) => Extractor::Json,
            _ => Extractor::Element,
        };
        parts.push(TemplatePart::Value(extractor));
        last = whole.end();
    }
    if last < token.len() {
        parts.push(TemplatePart::Literal(token[last..].to_string()));
    }
    parts
}

/// 根元素选择记号
fn is_root_selector(selector: &str) -> bool {
    matches!(selector, "" | "%" | "%el" | "%element")
}

/// 选择器模式：`css选择器 => 格式化器 => 格式化器 ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorPattern {
    /// CSS选择器，`None` 表示文档根元素
    pub selector: Option<String>,
    /// 按顺序应用的格式化器，至少一个
    pub formatters: Vec<Formatter>,
}

impl SelectorPattern {
    /// 解析选择器模式
    ///
    /// 未给出格式化器时默认为 `%html`
    pub fn parse(pattern: &str) -> Self {
        let mut tokens = pattern.split(PATTERN_SEPARATOR).map(str::trim);
        let selector = tokens.next().unwrap_or_default();
        let mut formatters: Vec<Formatter> = tokens.map(Formatter::parse).collect();
        if formatters.is_empty() {
            formatters.push(Formatter::Extract(Extractor::Html));
        }

        Self {
            selector: (!is_root_selector(selector)).then(|| selector.to_string()),
            formatters,
        }
    }
}
