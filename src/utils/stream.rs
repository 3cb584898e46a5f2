// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{ByteStream, EngineError};
use crate::utils::errors::SpiderError;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// 主动拉取字节流直到结束，收集为完整字节
///
/// 每个数据块到达时以 `(累计字节数, 本块字节数)` 回调进度
pub async fn collect_stream<F>(mut stream: ByteStream, mut on_progress: F) -> Result<Bytes, EngineError>
where
    F: FnMut(u64, u64),
{
    let mut buffer = BytesMut::new();
    let mut progress = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        progress += chunk.len() as u64;
        on_progress(progress, chunk.len() as u64);
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}

/// 把字节流写入目标，同时回调累计进度
///
/// # 返回值
///
/// 写入的总字节数
pub async fn pipe_stream<W, F>(
    mut stream: ByteStream,
    writer: &mut W,
    mut on_progress: F,
) -> Result<u64, SpiderError>
where
    W: AsyncWrite + Unpin,
    F: FnMut(u64, u64),
{
    let mut progress = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        writer.write_all(&chunk).await?;
        progress += chunk.len() as u64;
        on_progress(progress, chunk.len() as u64);
    }
    writer.flush().await?;
    Ok(progress)
}
