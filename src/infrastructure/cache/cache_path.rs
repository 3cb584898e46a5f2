// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use md5::{Digest, Md5};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;

/// 文件系统单个路径段的长度上限
pub const MAX_SEGMENT_LEN: usize = 255;

static KNOWN_EXTENSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\.(htm|html|json|xhtml|xml|pdf|asp|aspx|php|png|gif|jpg|jpeg|svg|txt|zip|mov|avi|psd|rtf)$",
    )
    .expect("extension pattern is valid")
});

/// 缓存键格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheKeyFormat {
    /// 按URL路径段分层
    #[default]
    Hierarchy,
    /// 整个URL的MD5十六进制摘要
    Md5,
}

fn md5_hex(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}

/// 由URL推导缓存文件的相对路径
///
/// 分层格式：按 `/` 切分并去掉空段，首段去掉协议冒号，只有主机时补 `index.html`，
/// 每段做百分号编码，`.` 与 `..` 段的点也被编码，超长段替换为MD5摘要，
/// 末段没有已知扩展名时补 `.html`。
pub fn to_file_path(url: &str, format: CacheKeyFormat) -> PathBuf {
    match format {
        CacheKeyFormat::Md5 => PathBuf::from(md5_hex(url)),
        CacheKeyFormat::Hierarchy => {
            let mut segments: Vec<String> = url
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if let Some(first) = segments.first_mut() {
                *first = first.replacen(':', "", 1);
            }
            if segments.len() == 2 {
                segments.push("index.html".to_string());
            }

            let mut path: PathBuf = segments
                .iter()
                .map(|s| {
                    let encoded = urlencoding::encode(s).into_owned();
                    if encoded == "." || encoded == ".." {
                        // 点段不能留在路径里，否则会跳出缓存根目录
                        encoded.replace('.', "%2E")
                    } else if encoded.len() > MAX_SEGMENT_LEN {
                        md5_hex(&encoded)
                    } else {
                        encoded
                    }
                })
                .collect();

            let has_known_extension = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| KNOWN_EXTENSION.is_match(name));
            if !has_known_extension {
                let mut name = path
                    .file_name()
                    .map(|n| n.to_os_string())
                    .unwrap_or_default();
                name.push(".html");
                path.set_file_name(name);
            }
            path
        }
    }
}
