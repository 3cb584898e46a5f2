// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 内容变换流水线
//!
//! 每个步骤都重新解析并序列化文档，上一步的输出作为下一步的输入。
//! 步骤顺序固定，见 [`TransformStep::ORDER`]。

use crate::config::options::TransformStep;
use crate::domain::services::link_service::normalize_link;
use ego_tree::NodeRef;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

/// 去除属性时保留的属性
pub const KEPT_ATTRIBUTES: [&str; 4] = ["href", "src", "title", "id"];

const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: [&str; 7] = [
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

const INLINE_ELEMENTS: [&str; 14] = [
    "a", "abbr", "b", "br", "code", "em", "i", "img", "label", "small", "span", "strong", "sub",
    "sup",
];

const MAX_INLINE_WIDTH: usize = 100;

static SCRIPT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script").expect("static selector is valid"));
static HEAD: Lazy<Selector> =
    Lazy::new(|| Selector::parse("head").expect("static selector is valid"));
static STYLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("style").expect("static selector is valid"));

static SRC_QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"src="(.+?)""#).expect("static regex is valid"));
static SRC_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"src=(/.+?) ").expect("static regex is valid"));
static HREF_QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href="(.+?)""#).expect("static regex is valid"));

/// 按顺序应用变换步骤
///
/// # 参数
///
/// * `raw` - 原始内容
/// * `url` - 内容来源URL，用于链接规范化
/// * `steps` - 启用的步骤，应按 [`TransformStep::ORDER`] 排列
pub fn apply_transforms(raw: &str, url: &str, steps: &[TransformStep]) -> String {
    let mut data = raw.to_string();
    for step in steps {
        debug!("Apply transform {:?} to {}", step, url);
        data = match step {
            TransformStep::RemoveScripts => remove_elements(&data, &SCRIPT),
            TransformStep::RemoveHeads => remove_elements(&data, &HEAD),
            TransformStep::RemoveStyles => remove_elements(&data, &STYLE),
            TransformStep::RemoveComments => remove_comments(&data),
            TransformStep::RemoveAttributes => strip_attributes(&data),
            TransformStep::NormalizeLinks => normalize_all_links(url, &data),
            TransformStep::DecodeEntities => decode_entities(&data),
            TransformStep::FormatHtml => format_html(&data),
            TransformStep::RemoveEmptyLines => remove_empty_lines(&data),
        };
    }
    data
}

/// 删除所有匹配的元素
pub fn remove_elements(html: &str, selector: &Selector) -> String {
    let mut document = Html::parse_document(html);
    let ids: Vec<_> = document.select(selector).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
    document.html()
}

/// 删除所有注释节点
pub fn remove_comments(html: &str) -> String {
    let mut document = Html::parse_document(html);
    let ids: Vec<_> = document
        .tree
        .root()
        .descendants()
        .filter(|node| node.value().is_comment())
        .map(|node| node.id())
        .collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
    document.html()
}

/// 去除白名单之外的所有属性
pub fn strip_attributes(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::with_capacity(html.len());
    for child in document.tree.root().children() {
        serialize_node(child, &mut out, &|name| KEPT_ATTRIBUTES.contains(&name));
    }
    out
}

/// 把 `src`、`href` 中的链接规范化为绝对地址
pub fn normalize_all_links(url: &str, html: &str) -> String {
    let html = SRC_QUOTED.replace_all(html, |caps: &Captures| {
        format!("src=\"{}\"", normalize_link(url, &caps[1]))
    });
    let html = SRC_BARE.replace_all(&html, |caps: &Captures| {
        format!("src=\"{}\" ", normalize_link(url, &caps[1]))
    });
    let html = HREF_QUOTED.replace_all(&html, |caps: &Captures| {
        format!("href=\"{}\"", normalize_link(url, &caps[1]))
    });
    html.into_owned()
}

/// 解码HTML实体
pub fn decode_entities(html: &str) -> String {
    html_escape::decode_html_entities(html).into_owned()
}

/// 删除空行
pub fn remove_empty_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// 缩进格式化HTML
///
/// 含 `<html>` 或 doctype 的内容按完整文档处理，其余按片段处理。
/// 文本节点按解析后的文本输出，不再转义。
pub fn format_html(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let mut lines = Vec::new();
    if lower.contains("<html") || lower.contains("<!doctype") {
        let document = Html::parse_document(html);
        for child in document.tree.root().children() {
            pretty_node(child, 0, &mut lines);
        }
    } else {
        let fragment = Html::parse_fragment(html);
        for child in fragment.root_element().children() {
            pretty_node(child, 0, &mut lines);
        }
    }
    lines.join("\n")
}

fn open_tag(el: &scraper::node::Element, keep: &dyn Fn(&str) -> bool) -> String {
    let mut tag = format!("<{}", el.name());
    for (name, value) in el.attrs().filter(|(name, _)| keep(name)) {
        tag.push(' ');
        tag.push_str(name);
        tag.push_str("=\"");
        tag.push_str(&html_escape::encode_double_quoted_attribute(value));
        tag.push('"');
    }
    tag.push('>');
    tag
}

/// 序列化节点，只输出 `keep` 接受的属性
pub fn serialize_node(node: NodeRef<'_, Node>, out: &mut String, keep: &dyn Fn(&str) -> bool) {
    write_node(node, out, keep, true);
}

fn write_node(node: NodeRef<'_, Node>, out: &mut String, keep: &dyn Fn(&str) -> bool, escape: bool) {
    match node.value() {
        Node::Document | Node::Fragment => {
            for child in node.children() {
                write_node(child, out, keep, escape);
            }
        }
        Node::Doctype(doctype) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(doctype.name());
            out.push('>');
        }
        Node::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        Node::Text(text) => {
            let raw_parent = node
                .parent()
                .and_then(ElementRef::wrap)
                .is_some_and(|p| RAW_TEXT_ELEMENTS.contains(&p.value().name()));
            if raw_parent || !escape {
                out.push_str(text);
            } else {
                out.push_str(&html_escape::encode_text(&**text));
            }
        }
        Node::Element(el) => {
            out.push_str(&open_tag(el, keep));
            if VOID_ELEMENTS.contains(&el.name()) {
                return;
            }
            for child in node.children() {
                write_node(child, out, keep, escape);
            }
            out.push_str("</");
            out.push_str(el.name());
            out.push('>');
        }
        _ => {}
    }
}

fn keep_all(_: &str) -> bool {
    true
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_blank_text(node: &NodeRef<'_, Node>) -> bool {
    matches!(node.value(), Node::Text(t) if t.trim().is_empty())
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

fn pretty_node(node: NodeRef<'_, Node>, depth: usize, lines: &mut Vec<String>) {
    let pad = indent(depth);
    match node.value() {
        Node::Document | Node::Fragment => {
            for child in node.children() {
                pretty_node(child, depth, lines);
            }
        }
        Node::Doctype(doctype) => lines.push(format!("{}<!DOCTYPE {}>", pad, doctype.name())),
        Node::Comment(comment) => lines.push(format!("{}<!--{}-->", pad, &**comment)),
        Node::Text(text) => {
            for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
                lines.push(format!("{}{}", pad, line));
            }
        }
        Node::Element(el) => {
            let name = el.name();
            let open = open_tag(el, &keep_all);
            if VOID_ELEMENTS.contains(&name) {
                lines.push(format!("{}{}", pad, open));
                return;
            }
            let close = format!("</{}>", name);

            if RAW_TEXT_ELEMENTS.contains(&name) || name == "pre" || name == "textarea" {
                let mut inner = String::new();
                for child in node.children() {
                    serialize_node(child, &mut inner, &keep_all);
                }
                lines.push(format!("{}{}{}{}", pad, open, inner.trim_end(), close));
                return;
            }

            let children: Vec<_> = node.children().filter(|c| !is_blank_text(c)).collect();
            if children.is_empty() {
                lines.push(format!("{}{}{}", pad, open, close));
                return;
            }

            let inline = children.iter().all(|child| match child.value() {
                Node::Text(_) => true,
                Node::Element(e) => INLINE_ELEMENTS.contains(&e.name()),
                _ => false,
            });
            if inline {
                let mut inner = String::new();
                for child in node.children() {
                    write_node(child, &mut inner, &keep_all, false);
                }
                let inner = collapse_whitespace(&inner);
                if inner.len() <= MAX_INLINE_WIDTH {
                    lines.push(format!("{}{}{}{}", pad, open, inner, close));
                    return;
                }
            }

            lines.push(format!("{}{}", pad, open));
            for child in children {
                pretty_node(child, depth + 1, lines);
            }
            lines.push(format!("{}{}", pad, close));
        }
        _ => {}
    }
}
