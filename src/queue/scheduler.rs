// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

/// 任务上下文
///
/// 任务可以通过它向同一个调度器追加后续任务（例如跟随下一页链接）
#[derive(Debug)]
pub struct JobContext<T> {
    index: u64,
    sender: UnboundedSender<T>,
}

impl<T> Clone for JobContext<T> {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            sender: self.sender.clone(),
        }
    }
}

impl<T> JobContext<T> {
    /// 当前任务的派发序号
    pub fn index(&self) -> u64 {
        self.index
    }

    /// 追加后续任务
    ///
    /// 调度器排空后追加的任务会被丢弃
    pub fn enqueue(&self, item: T) {
        if self.sender.send(item).is_err() {
            debug!("Scheduler already drained, follow-up job dropped");
        }
    }
}

/// 单个任务的结果
#[derive(Debug)]
pub struct JobOutcome<R, E> {
    /// 派发序号（按派发顺序递增）
    pub index: u64,
    pub result: Result<R, E>,
}

/// 调度统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// 派发的任务数
    pub dispatched: u64,
    /// 成功的任务数
    pub succeeded: u64,
    /// 失败的任务数
    pub failed: u64,
    /// 其中由任务追加的后续任务数
    pub followed: u64,
}

/// 有界并发任务调度器
///
/// 在单个任务内协作式地驱动最多 `concurrency` 个并发任务，数据源按需拉取，
/// 可以是无界的。数据源耗尽、后续任务队列为空且没有在途任务时结束。
#[derive(Debug, Clone, Copy)]
pub struct JobScheduler {
    concurrency: usize,
    preserve_order: bool,
}

impl JobScheduler {
    /// 创建新的调度器实例
    ///
    /// # 参数
    ///
    /// * `concurrency` - 最大并发数，0 按 1 处理
    /// * `preserve_order` - 是否按派发顺序交付结果
    pub fn new(concurrency: usize, preserve_order: bool) -> Self {
        Self {
            concurrency: concurrency.max(1),
            preserve_order,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// 运行调度
    ///
    /// 单个任务失败不会中断调度，失败以 `JobOutcome` 的形式交给 `on_outcome`。
    /// 开启顺序保持时，结果按派发顺序交付；否则按完成顺序交付。
    ///
    /// # 参数
    ///
    /// * `source` - 任务来源
    /// * `worker` - 任务处理函数
    /// * `on_outcome` - 结果回调
    ///
    /// # 返回值
    ///
    /// 调度统计
    pub async fn run<I, T, F, Fut, R, E, S>(
        &self,
        source: I,
        mut worker: F,
        mut on_outcome: S,
    ) -> SchedulerStats
    where
        I: IntoIterator<Item = T>,
        F: FnMut(T, JobContext<T>) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: Display,
        S: FnMut(JobOutcome<R, E>),
    {
        let mut source = source.into_iter();
        let mut source_done = false;
        let (sender, mut follow_ups): (UnboundedSender<T>, UnboundedReceiver<T>) =
            mpsc::unbounded_channel();

        let mut in_flight = FuturesUnordered::new();
        let mut pending: BTreeMap<u64, Result<R, E>> = BTreeMap::new();
        let mut next_to_deliver = 0u64;
        let mut stats = SchedulerStats::default();

        loop {
            while in_flight.len() < self.concurrency {
                // follow-ups first so chained pages keep moving
                let item = match follow_ups.try_recv() {
                    Ok(item) => {
                        stats.followed += 1;
                        Some(item)
                    }
                    Err(_) if !source_done => {
                        let item = source.next();
                        if item.is_none() {
                            source_done = true;
                        }
                        item
                    }
                    Err(_) => None,
                };
                let Some(item) = item else {
                    break;
                };

                let index = stats.dispatched;
                stats.dispatched += 1;
                let ctx = JobContext {
                    index,
                    sender: sender.clone(),
                };
                let job = worker(item, ctx);
                in_flight.push(async move { (index, job.await) });
            }

            let Some((index, result)) = in_flight.next().await else {
                // nothing in flight and nothing left to dispatch
                break;
            };

            match &result {
                Ok(_) => stats.succeeded += 1,
                Err(e) => {
                    stats.failed += 1;
                    warn!("Job {} failed: {}", index, e);
                }
            }

            if self.preserve_order {
                pending.insert(index, result);
                while let Some(result) = pending.remove(&next_to_deliver) {
                    on_outcome(JobOutcome {
                        index: next_to_deliver,
                        result,
                    });
                    next_to_deliver += 1;
                }
            } else {
                on_outcome(JobOutcome { index, result });
            }
        }

        drop(sender);
        follow_ups.close();
        debug!(
            "Scheduler drained: {} dispatched, {} failed",
            stats.dispatched, stats.failed
        );
        stats
    }

    /// 运行有界任务并按派发顺序收集结果
    pub async fn collect<I, T, F, Fut, R, E>(&self, source: I, worker: F) -> Vec<Result<R, E>>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(T, JobContext<T>) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: Display,
    {
        let mut results = BTreeMap::new();
        Self::new(self.concurrency, true)
            .run(source, worker, |outcome| {
                results.insert(outcome.index, outcome.result);
            })
            .await;
        results.into_values().collect()
    }
}
