// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashSet;
use std::io::{self, Write};

/// 结果输出器
///
/// 开启去重时每个字符串至多输出一次
pub struct OutputSink<W: Write> {
    writer: W,
    unique: bool,
    seen: HashSet<String>,
}

impl OutputSink<io::Stdout> {
    /// 输出到标准输出
    pub fn stdout(unique: bool) -> Self {
        Self::new(io::stdout(), unique)
    }
}

impl<W: Write> OutputSink<W> {
    pub fn new(writer: W, unique: bool) -> Self {
        Self {
            writer,
            unique,
            seen: HashSet::new(),
        }
    }

    /// 输出一行
    ///
    /// # 返回值
    ///
    /// 实际写出返回 true，被去重丢弃返回 false
    pub fn emit(&mut self, line: &str) -> io::Result<bool> {
        if self.unique && !self.seen.insert(line.to_string()) {
            return Ok(false);
        }
        writeln!(self.writer, "{}", line)?;
        Ok(true)
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
