// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::spider::ProgressListener;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use once_cell::sync::Lazy;
use std::sync::Mutex;

const BAR_TEMPLATE: &str =
    "{msg:20!} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
const SPINNER_TEMPLATE: &str = "{msg:20!} {spinner:.blue} {bytes} ({bytes_per_sec})";
const PROGRESS_CHARS: &str = "█▓▒░  ";

static BAR_STYLE: Lazy<ProgressStyle> = Lazy::new(|| {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .map(|style| style.progress_chars(PROGRESS_CHARS))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
});

static SPINNER_STYLE: Lazy<ProgressStyle> = Lazy::new(|| {
    ProgressStyle::with_template(SPINNER_TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_spinner())
});

/// 终端下载进度
///
/// 每个下载一组进度条（分段下载每段一条），挂在共享的 `MultiProgress` 上，
/// 并发下载时各自独立刷新
pub struct DownloadProgress {
    multi: MultiProgress,
    label: String,
    bars: Mutex<Vec<ProgressBar>>,
}

impl DownloadProgress {
    pub fn new(multi: &MultiProgress, label: impl Into<String>) -> Self {
        Self {
            multi: multi.clone(),
            label: label.into(),
            bars: Mutex::new(Vec::new()),
        }
    }

    /// 不输出到终端，用于测试和非交互场景
    pub fn hidden(label: impl Into<String>) -> Self {
        Self::new(&MultiProgress::with_draw_target(ProgressDrawTarget::hidden()), label)
    }

    /// 当前各进度条的位置
    pub fn positions(&self) -> Vec<u64> {
        self.bars
            .lock()
            .map(|bars| bars.iter().map(ProgressBar::position).collect())
            .unwrap_or_default()
    }

    fn with_bar(&self, index: usize, f: impl FnOnce(&ProgressBar)) {
        if let Ok(bars) = self.bars.lock() {
            if let Some(bar) = bars.get(index) {
                f(bar);
            }
        }
    }
}

impl ProgressListener for DownloadProgress {
    fn on_start(&self, part_sizes: &[u64]) {
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        for bar in bars.drain(..) {
            bar.finish_and_clear();
        }

        if part_sizes.is_empty() {
            let bar = self.multi.add(ProgressBar::no_length());
            bar.set_style(SPINNER_STYLE.clone());
            bar.set_message(self.label.clone());
            bars.push(bar);
            return;
        }

        let single = part_sizes.len() == 1;
        for (index, size) in part_sizes.iter().enumerate() {
            let bar = self.multi.add(ProgressBar::new(*size));
            bar.set_style(BAR_STYLE.clone());
            if single {
                bar.set_message(self.label.clone());
            } else {
                bar.set_message(format!("{} #{}", self.label, index + 1));
            }
            bars.push(bar);
        }
    }

    fn on_part_progress(&self, part: usize, _downloaded: u64, increment: u64) {
        self.with_bar(part, |bar| bar.inc(increment));
    }

    fn on_progress(&self, downloaded: u64, _total: Option<u64>) {
        self.with_bar(0, |bar| bar.set_position(downloaded));
    }

    fn on_finish(&self) {
        if let Ok(bars) = self.bars.lock() {
            for bar in bars.iter() {
                bar.finish();
            }
        }
    }
}
