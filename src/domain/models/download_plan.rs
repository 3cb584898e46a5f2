// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::SpiderError;

/// 字节区间（闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// 区间序号（从0开始）
    pub index: usize,
    /// 起始字节
    pub start: u64,
    /// 结束字节（包含）
    pub end: u64,
}

impl ByteRange {
    /// 区间字节数
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// 闭区间至少包含一个字节
    pub fn is_empty(&self) -> bool {
        false
    }

    /// `Range` 请求头的值
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// 分段下载计划
///
/// 各区间连续、不重叠，并集恰好覆盖 `[0, total)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPlan {
    pub total: u64,
    pub ranges: Vec<ByteRange>,
}

impl DownloadPlan {
    /// 把 `total` 字节划分为 `parts` 段
    ///
    /// 除最后一段外每段长 `total / parts`，最后一段吸收余数。
    /// 段数多于字节数时按字节数划分。
    pub fn partition(total: u64, parts: u32) -> Result<Self, SpiderError> {
        if parts == 0 {
            return Err(SpiderError::InvalidArgument(
                "Number of parts must be greater than 0".into(),
            ));
        }
        if total == 0 {
            return Err(SpiderError::InvalidArgument(
                "Cannot partition an empty resource".into(),
            ));
        }

        let parts = (parts as u64).min(total);
        let size = total / parts;
        let ranges = (0..parts)
            .map(|i| {
                let start = i * size;
                let end = if i == parts - 1 {
                    total - 1
                } else {
                    start + size - 1
                };
                ByteRange {
                    index: i as usize,
                    start,
                    end,
                }
            })
            .collect();

        Ok(Self { total, ranges })
    }

    /// 各段字节数
    pub fn part_sizes(&self) -> Vec<u64> {
        self.ranges.iter().map(ByteRange::len).collect()
    }
}
