// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{ByteStream, EngineError};
use crate::infrastructure::cache::cache_path::{to_file_path, CacheKeyFormat};
use crate::infrastructure::storage;
use crate::utils::errors::SpiderError;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// 磁盘缓存
///
/// 以URL推导出的路径为键的简单键值存储，同一键的并发写入以最后写入者为准
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
    format: CacheKeyFormat,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            format: CacheKeyFormat::default(),
        }
    }

    pub fn with_format(mut self, format: CacheKeyFormat) -> Self {
        self.format = format;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// URL对应的缓存文件路径
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.root.join(to_file_path(url, self.format))
    }

    /// 判断缓存文件是否有效
    ///
    /// 文件不存在、超过过期时间或大小为0时无效
    pub async fn is_valid(&self, path: &Path, expire: Duration) -> bool {
        let meta = match fs::metadata(path).await {
            Ok(meta) => meta,
            Err(_) => return false,
        };
        if meta.len() == 0 {
            return false;
        }
        let age = meta
            .modified()
            .ok()
            .and_then(|mtime| SystemTime::now().duration_since(mtime).ok())
            .unwrap_or_default();
        age <= expire
    }

    /// 读取完整缓存内容
    pub async fn read(&self, path: &Path) -> Result<Bytes, SpiderError> {
        Ok(Bytes::from(fs::read(path).await?))
    }

    /// 以字节流读取缓存内容
    pub async fn read_stream(&self, path: &Path) -> Result<ByteStream, SpiderError> {
        let file = fs::File::open(path).await?;
        let stream = futures::stream::unfold(Some(file), |state| async move {
            let mut file = state?;
            let mut buf = BytesMut::with_capacity(READ_CHUNK_SIZE);
            match file.read_buf(&mut buf).await {
                Ok(0) => None,
                Ok(_) => Some((Ok(buf.freeze()), Some(file))),
                Err(e) => Some((Err(EngineError::Stream(e.to_string())), None)),
            }
        });
        Ok(stream.boxed())
    }

    /// 写入完整缓存内容
    pub async fn write(&self, path: &Path, data: &[u8]) -> Result<(), SpiderError> {
        storage::ensure_parent(path).await?;
        fs::write(path, data).await?;
        debug!("Cache written: {}", path.display());
        Ok(())
    }

    /// 边读边写缓存
    ///
    /// 返回的字节流与源流内容一致，同时后台把数据写入缓存文件。
    /// 源流出错时删除不完整的缓存文件，并把错误传给调用方。
    /// 调用方中途丢弃返回的流时，后台仍会写完缓存。
    pub async fn tee(&self, path: &Path, mut source: ByteStream) -> Result<ByteStream, SpiderError> {
        storage::ensure_parent(path).await?;
        let mut file = fs::File::create(path).await?;
        let path = path.to_path_buf();
        let (tx, rx) = mpsc::unbounded_channel::<Result<Bytes, EngineError>>();

        tokio::spawn(async move {
            let mut file_ok = true;
            while let Some(item) = source.next().await {
                match item {
                    Ok(chunk) => {
                        if file_ok {
                            if let Err(e) = file.write_all(&chunk).await {
                                warn!("Cache write failed for {}: {}", path.display(), e);
                                file_ok = false;
                            }
                        }
                        let _ = tx.send(Ok(chunk));
                    }
                    Err(e) => {
                        drop(file);
                        if let Err(remove_err) = fs::remove_file(&path).await {
                            debug!("Remove partial cache {}: {}", path.display(), remove_err);
                        }
                        let _ = tx.send(Err(e));
                        return;
                    }
                }
            }
            if file_ok {
                if let Err(e) = file.flush().await {
                    warn!("Cache flush failed for {}: {}", path.display(), e);
                    file_ok = false;
                }
            }
            if !file_ok {
                let _ = fs::remove_file(&path).await;
            } else {
                debug!("Cache written: {}", path.display());
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            let item = rx.recv().await?;
            Some((item, rx))
        });
        Ok(stream.boxed())
    }
}
