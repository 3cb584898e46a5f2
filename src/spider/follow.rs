// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::options::PartialOptions;
use crate::domain::models::response::Response;
use crate::queue::scheduler::JobScheduler;
use crate::queue::url_pattern::{expand_url, Expansion, UnboundedUrls};
use crate::spider::Spider;
use crate::utils::errors::SpiderError;
use std::collections::HashSet;
use std::future::Future;
use tracing::debug;

/// 跟随翻页器
///
/// 每次拉取一页；下一页链接取自当前页，取第一个有结果的模式。
/// 链接回到已访问过的页面时结束。
#[derive(Debug)]
pub struct FollowPager<'a> {
    spider: &'a Spider,
    patterns: Vec<String>,
    overrides: PartialOptions,
    next: Option<String>,
    visited: HashSet<String>,
}

impl FollowPager<'_> {
    /// 拉取下一页，没有更多页面时返回 `None`
    pub async fn next_page(&mut self) -> Result<Option<Response>, SpiderError> {
        let Some(url) = self.next.take() else {
            return Ok(None);
        };
        self.visited.insert(url.clone());

        let res = self.spider.get(&url, &self.overrides).await?;
        self.next = self
            .spider
            .next_link(&res, &self.patterns)
            .await?
            .filter(|link| {
                let fresh = !self.visited.contains(link);
                if !fresh {
                    debug!("Follow loop back to {}, stopping", link);
                }
                fresh
            });
        Ok(Some(res))
    }
}

/// 无界批量翻页器
///
/// 按 `[a..]` 模式逐页抓取，终止条件由调用方决定
#[derive(Debug)]
pub struct PagePager<'a> {
    spider: &'a Spider,
    urls: UnboundedUrls,
    overrides: PartialOptions,
}

impl PagePager<'_> {
    /// 抓取下一页
    pub async fn next_page(&mut self) -> Result<Option<Response>, SpiderError> {
        match self.urls.next() {
            Some(url) => Ok(Some(self.spider.get(&url, &self.overrides).await?)),
            None => Ok(None),
        }
    }
}

impl Spider {
    /// 从 `start` 开始跟随翻页
    ///
    /// # 参数
    ///
    /// * `start` - 第一页URL
    /// * `patterns` - 下一页链接的选择器模式，按顺序尝试
    /// * `overrides` - 每页抓取的覆盖选项
    pub fn follow<S: AsRef<str>>(
        &self,
        start: &str,
        patterns: &[S],
        overrides: PartialOptions,
    ) -> FollowPager<'_> {
        FollowPager {
            spider: self,
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
            overrides,
            next: Some(start.to_string()),
            visited: HashSet::new(),
        }
    }

    /// 按无界URL模式逐页抓取
    ///
    /// 有界模式返回 `InvalidArgument`
    pub fn pages(
        &self,
        pattern: &str,
        overrides: PartialOptions,
    ) -> Result<PagePager<'_>, SpiderError> {
        match expand_url(pattern) {
            Expansion::Unbounded(urls) => Ok(PagePager {
                spider: self,
                urls,
                overrides,
            }),
            Expansion::Finite(_) => Err(SpiderError::InvalidArgument(format!(
                "Pattern `{}` is not an unbounded page range",
                pattern
            ))),
        }
    }

    /// 从页面中取下一页链接
    ///
    /// 依次尝试各模式，取第一个非空结果并规范化
    pub async fn next_link<S: AsRef<str>>(
        &self,
        res: &Response,
        patterns: &[S],
    ) -> Result<Option<String>, SpiderError> {
        for pattern in patterns {
            let found = res.css(pattern.as_ref()).await?;
            if let Some(link) = found.getall().iter().find(|link| !link.trim().is_empty()) {
                return Ok(Some(res.normalize_link(link.trim())));
            }
        }
        Ok(None)
    }

    /// 批量抓取有界URL模式并处理每一页
    ///
    /// 最多 `parallel` 个页面同时抓取，结果按URL顺序返回；
    /// 单页失败不影响其余页面。
    pub async fn batch_run<F, Fut, T>(
        &self,
        pattern: &str,
        parallel: usize,
        overrides: PartialOptions,
        action: F,
    ) -> Result<Vec<Result<T, SpiderError>>, SpiderError>
    where
        F: Fn(Response) -> Fut,
        Fut: Future<Output = Result<T, SpiderError>>,
    {
        let Some(urls) = expand_url(pattern).into_finite() else {
            return Err(SpiderError::InvalidArgument(format!(
                "Pattern `{}` is unbounded, use pages() instead",
                pattern
            )));
        };

        let spider = self;
        let overrides = &overrides;
        let action = &action;
        Ok(JobScheduler::new(parallel, true)
            .collect(urls, move |url: String, _ctx| async move {
                let res = spider.get(&url, overrides).await?;
                action(res).await
            })
            .await)
    }
}
