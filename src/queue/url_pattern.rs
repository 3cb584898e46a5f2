// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! URL模式展开
//!
//! 支持在URL任意位置嵌入整数区间：
//! `[start..end]`、`[start..step..end]`、`[start..]`、`[start..step..]`。
//! 有界区间展开为 [`FiniteUrls`]，可一次性收集；无界区间展开为
//! [`UnboundedUrls`]，只能逐个拉取。

use once_cell::sync::Lazy;
use regex::Regex;
use std::io::BufRead;

static RANGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(\d+)\.\.(?:(\d+)\.\.)?(\d+)?\]").expect("range pattern is valid")
});

/// URL模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlPattern {
    /// 不含区间语法的普通URL
    Literal(String),
    /// 含区间语法的URL
    Range {
        prefix: String,
        suffix: String,
        start: u64,
        step: u64,
        end: Option<u64>,
    },
}

impl UrlPattern {
    /// 解析URL模式
    ///
    /// 区间边界非数字或步长为0时按普通URL处理
    pub fn parse(input: &str) -> Self {
        let Some(caps) = RANGE_REGEX.captures(input) else {
            return UrlPattern::Literal(input.to_string());
        };
        let Some(token) = caps.get(0) else {
            return UrlPattern::Literal(input.to_string());
        };

        let start = caps.get(1).and_then(|m| m.as_str().parse::<u64>().ok());
        let step = match caps.get(2) {
            Some(m) => m.as_str().parse::<u64>().ok(),
            None => Some(1),
        };
        let end = match caps.get(3) {
            Some(m) => match m.as_str().parse::<u64>() {
                Ok(v) => Some(Some(v)),
                Err(_) => None,
            },
            None => Some(None),
        };

        match (start, step, end) {
            (Some(start), Some(step), Some(end)) if step > 0 => UrlPattern::Range {
                prefix: input[..token.start()].to_string(),
                suffix: input[token.end()..].to_string(),
                start,
                step,
                end,
            },
            _ => UrlPattern::Literal(input.to_string()),
        }
    }

    /// 是否无界
    pub fn is_unbounded(&self) -> bool {
        matches!(self, UrlPattern::Range { end: None, .. })
    }

    /// 展开为URL序列
    pub fn expand(&self) -> Expansion {
        match self {
            UrlPattern::Literal(url) => Expansion::Finite(FiniteUrls {
                template: Template::literal(url),
                next: 0,
                step: 1,
                end: 0,
                exhausted: false,
            }),
            UrlPattern::Range {
                prefix,
                suffix,
                start,
                step,
                end: Some(end),
            } => Expansion::Finite(FiniteUrls {
                template: Template::range(prefix, suffix),
                next: *start,
                step: *step,
                end: *end,
                exhausted: start > end,
            }),
            UrlPattern::Range {
                prefix,
                suffix,
                start,
                step,
                end: None,
            } => Expansion::Unbounded(UnboundedUrls {
                template: Template::range(prefix, suffix),
                next: Some(*start),
                step: *step,
            }),
        }
    }
}

#[derive(Debug, Clone)]
struct Template {
    prefix: String,
    suffix: String,
    literal: bool,
}

impl Template {
    fn literal(url: &str) -> Self {
        Self {
            prefix: url.to_string(),
            suffix: String::new(),
            literal: true,
        }
    }

    fn range(prefix: &str, suffix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            literal: false,
        }
    }

    fn render(&self, i: u64) -> String {
        if self.literal {
            self.prefix.clone()
        } else {
            format!("{}{}{}", self.prefix, i, self.suffix)
        }
    }
}

/// 有界URL序列
#[derive(Debug, Clone)]
pub struct FiniteUrls {
    template: Template,
    next: u64,
    step: u64,
    end: u64,
    exhausted: bool,
}

impl FiniteUrls {
    /// 剩余元素个数
    pub fn remaining(&self) -> usize {
        if self.exhausted {
            0
        } else if self.template.literal {
            1
        } else {
            ((self.end - self.next) / self.step + 1) as usize
        }
    }

    /// 一次性收集全部URL
    pub fn to_vec(self) -> Vec<String> {
        self.collect()
    }
}

impl Iterator for FiniteUrls {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.exhausted {
            return None;
        }
        let url = self.template.render(self.next);
        if self.template.literal {
            self.exhausted = true;
        } else {
            match self.next.checked_add(self.step) {
                Some(n) if n <= self.end => self.next = n,
                _ => self.exhausted = true,
            }
        }
        Some(url)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for FiniteUrls {}

/// 无界URL序列
///
/// 只提供逐个拉取，调用方负责给出终止条件
#[derive(Debug, Clone)]
pub struct UnboundedUrls {
    template: Template,
    next: Option<u64>,
    step: u64,
}

impl Iterator for UnboundedUrls {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let current = self.next?;
        self.next = current.checked_add(self.step);
        Some(self.template.render(current))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

/// URL模式展开结果
#[derive(Debug, Clone)]
pub enum Expansion {
    Finite(FiniteUrls),
    Unbounded(UnboundedUrls),
}

impl Expansion {
    pub fn is_finite(&self) -> bool {
        matches!(self, Expansion::Finite(_))
    }

    /// 有界时取出有界序列
    pub fn into_finite(self) -> Option<FiniteUrls> {
        match self {
            Expansion::Finite(urls) => Some(urls),
            Expansion::Unbounded(_) => None,
        }
    }
}

impl Iterator for Expansion {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        match self {
            Expansion::Finite(urls) => urls.next(),
            Expansion::Unbounded(urls) => urls.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Expansion::Finite(urls) => urls.size_hint(),
            Expansion::Unbounded(urls) => urls.size_hint(),
        }
    }
}

/// 展开单个URL模式
pub fn expand_url(pattern: &str) -> Expansion {
    UrlPattern::parse(pattern).expand()
}

/// 按行展开：忽略空行，逐行展开并按出现顺序拼接
///
/// 读取失败时序列在该处结束
pub fn expand_lines<R>(reader: R) -> impl Iterator<Item = String>
where
    R: BufRead,
{
    reader
        .lines()
        .map_while(Result::ok)
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .flat_map(|line| expand_url(&line))
}

/// 展开URL来源
///
/// 给出模式时展开该模式，否则从标准输入按行读取
pub fn expand(pattern: Option<&str>) -> Box<dyn Iterator<Item = String> + Send> {
    match pattern.map(str::trim).filter(|p| !p.is_empty()) {
        Some(pattern) => Box::new(expand_url(pattern)),
        None => Box::new(expand_lines(std::io::BufReader::new(std::io::stdin()))),
    }
}
