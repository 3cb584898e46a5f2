// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// 确保父目录存在
pub async fn ensure_parent(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    Ok(())
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("download"));
    name.push(".part");
    path.with_file_name(name)
}

/// 以单次原子替换的方式写入文件
///
/// 先写入同目录下的 `.part` 临时文件，再重命名为目标文件
pub async fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    ensure_parent(path).await?;
    let tmp = part_path(path);

    let mut file = fs::File::create(&tmp).await?;
    file.write_all(data).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&tmp, path).await
}

/// 打开目标文件用于流式写入，必要时创建父目录
pub async fn create_file(path: &Path) -> std::io::Result<fs::File> {
    ensure_parent(path).await?;
    fs::File::create(path).await
}
