// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::options::{SpiderOptions, TransformStep};
use crate::domain::models::css_result::CssResult;
use crate::domain::models::selector_pattern::{SelectorOptions, SelectorPattern};
use crate::domain::services::link_service::{domain_of, normalize_link};
use crate::domain::services::{selector_service, transform_service};
use crate::engines::traits::{Body, TransportResponse};
use crate::utils::errors::SpiderError;
use crate::utils::stream::{collect_stream, pipe_stream};
use crate::utils::text_encoding::decode_text;
use regex::Regex;
use std::collections::HashMap;
use tokio::io::AsyncWrite;
use tokio::sync::{Mutex, OnceCell};

/// 抓取结果
///
/// 原始内容只被消费一次：第一次读取数据时应用变换流水线并缓存结果，
/// 之后的读取直接返回缓存值。抓取失败时得到状态码为404、没有响应头的空结果。
#[derive(Debug)]
pub struct Response {
    url: String,
    domain: String,
    status: u16,
    headers: Option<HashMap<String, String>>,
    present: bool,
    body: Mutex<Option<Body>>,
    data: OnceCell<Option<String>>,
    transforms: Vec<TransformStep>,
    selector_options: SelectorOptions,
}

impl Response {
    fn build(
        url: &str,
        body: Option<Body>,
        headers: Option<HashMap<String, String>>,
        status: Option<u16>,
        options: &SpiderOptions,
    ) -> Self {
        let present = body.is_some();
        Self {
            url: url.to_string(),
            domain: domain_of(url),
            status: status.unwrap_or(if present { 200 } else { 404 }),
            headers,
            present,
            body: Mutex::new(body),
            data: OnceCell::new(),
            transforms: options.transforms.enabled_steps(),
            selector_options: SelectorOptions {
                unescape: options.unescape,
                pretty: options.transforms.pretty,
            },
        }
    }

    /// 由网络响应构造
    pub fn from_transport(url: &str, res: TransportResponse, options: &SpiderOptions) -> Self {
        Self::build(
            url,
            Some(res.body),
            Some(res.headers),
            Some(res.status_code),
            options,
        )
    }

    /// 由缓存或其他本地内容构造，没有响应头
    pub fn from_body(url: &str, body: Body, options: &SpiderOptions) -> Self {
        Self::build(url, Some(body), None, None, options)
    }

    /// 抓取失败时的空结果
    pub fn absent(url: &str, options: &SpiderOptions) -> Self {
        Self::build(url, None, None, None, options)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 协议与主机部分
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// 是否为抓取失败的空结果
    pub fn is_absent(&self) -> bool {
        !self.present
    }

    pub fn headers(&self) -> Option<&HashMap<String, String>> {
        self.headers.as_ref()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()?
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length")
            .and_then(|v| v.trim().parse().ok())
    }

    /// 相对于本页URL规范化链接
    pub fn normalize_link(&self, link: &str) -> String {
        normalize_link(&self.url, link)
    }

    /// 取走原始内容
    ///
    /// 之后数据读取只能得到已缓存的变换结果
    pub async fn take_body(&self) -> Option<Body> {
        self.body.lock().await.take()
    }

    /// 变换后的内容，只计算一次
    ///
    /// 流内容先完整收集，再按响应头、`<meta>` 或检测得到的字符集解码
    pub async fn data(&self) -> Result<Option<&str>, SpiderError> {
        let data = self
            .data
            .get_or_try_init(|| async {
                let raw = match self.take_body().await {
                    None => return Ok::<_, SpiderError>(None),
                    Some(Body::Buffered(bytes)) => bytes,
                    Some(Body::Stream(stream)) => collect_stream(stream, |_, _| {}).await?,
                };
                let text = decode_text(&raw, self.header("content-type"));
                Ok(Some(transform_service::apply_transforms(
                    &text,
                    &self.url,
                    &self.transforms,
                )))
            })
            .await?;
        Ok(data.as_deref())
    }

    /// 按选择器模式提取
    ///
    /// 没有内容时返回空结果
    pub async fn css(&self, pattern: &str) -> Result<CssResult, SpiderError> {
        let Some(data) = self.data().await? else {
            return Ok(CssResult::new(Vec::new(), self.selector_options));
        };
        let items =
            selector_service::select(data, &SelectorPattern::parse(pattern), self.selector_options)?;
        Ok(CssResult::new(items, self.selector_options))
    }

    /// 按正则提取指定捕获组
    pub async fn regex(&self, pattern: &str, group: usize) -> Result<CssResult, SpiderError> {
        let re = Regex::new(pattern)?;
        let Some(data) = self.data().await? else {
            return Ok(CssResult::new(Vec::new(), self.selector_options));
        };
        let items = selector_service::regex_all(data, &re, group)?;
        Ok(CssResult::new(items, self.selector_options))
    }

    /// 页面中所有链接，已规范化
    pub async fn links(&self) -> Result<Vec<String>, SpiderError> {
        Ok(self
            .css("a => @href")
            .await?
            .into_iter()
            .map(|link| self.normalize_link(&link))
            .collect())
    }

    /// 页面中的图片
    ///
    /// `level` 为0时返回 `<img>` 标签，为1时返回规范化后的非空 `src`
    pub async fn images(&self, level: u8) -> Result<Vec<String>, SpiderError> {
        match level {
            0 => Ok(self.css("img => %html").await?.into_vec()),
            1 => Ok(self
                .css("img => @src")
                .await?
                .into_iter()
                .map(|src| self.normalize_link(&src))
                .filter(|src| !src.is_empty())
                .collect()),
            other => Err(SpiderError::InvalidImageLevel(other)),
        }
    }

    /// 把流内容写入目标
    ///
    /// 内容必须是流；抓取失败时返回 `FetchFailed`
    pub async fn pipe_to<W, F>(&self, writer: &mut W, on_progress: F) -> Result<u64, SpiderError>
    where
        W: AsyncWrite + Unpin,
        F: FnMut(u64, u64),
    {
        let mut guard = self.body.lock().await;
        match guard.take() {
            Some(Body::Stream(stream)) => {
                drop(guard);
                pipe_stream(stream, writer, on_progress).await
            }
            Some(buffered) => {
                *guard = Some(buffered);
                Err(SpiderError::InvalidArgument(
                    "Data is not a stream, can't be piped".into(),
                ))
            }
            None if !self.present => Err(SpiderError::FetchFailed(self.url.clone())),
            None => Err(SpiderError::InvalidArgument(
                "Data has already been consumed".into(),
            )),
        }
    }
}
