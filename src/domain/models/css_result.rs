// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::selector_pattern::{SelectorOptions, SelectorPattern};
use crate::domain::services::selector_service;
use crate::utils::errors::SpiderError;
use regex::Regex;

/// 提取结果
///
/// 选择器与正则提取共用的结果形态，保持文档顺序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssResult {
    items: Vec<String>,
    options: SelectorOptions,
}

impl CssResult {
    pub fn new(items: Vec<String>, options: SelectorOptions) -> Self {
        Self { items, options }
    }

    /// 第一个结果
    pub fn get(&self) -> Option<&str> {
        self.items.first().map(String::as_str)
    }

    /// 全部结果
    pub fn getall(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.items
    }

    /// 把每个结果重新包装为可继续查询的片段
    pub fn selections(&self) -> impl Iterator<Item = Selection> + '_ {
        self.items
            .iter()
            .map(|item| Selection::new(item.clone(), self.options))
    }

    pub fn map<T, F>(&self, f: F) -> Vec<T>
    where
        F: FnMut(Selection) -> T,
    {
        self.selections().map(f).collect()
    }

    pub fn each<F>(&self, f: F)
    where
        F: FnMut(Selection),
    {
        self.selections().for_each(f)
    }
}

impl IntoIterator for CssResult {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// 单个结果片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    content: String,
    options: SelectorOptions,
}

impl Selection {
    pub fn new(content: impl Into<String>, options: SelectorOptions) -> Self {
        Self {
            content: content.into(),
            options,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// 在片段内按选择器模式提取
    pub fn css(&self, pattern: &str) -> Result<CssResult, SpiderError> {
        let items = selector_service::select(
            &self.content,
            &SelectorPattern::parse(pattern),
            self.options,
        )?;
        Ok(CssResult::new(items, self.options))
    }

    /// 在片段内按正则提取
    pub fn regex(&self, re: &Regex, group: usize) -> Result<CssResult, SpiderError> {
        let items = selector_service::regex_all(&self.content, re, group)?;
        Ok(CssResult::new(items, self.options))
    }
}
