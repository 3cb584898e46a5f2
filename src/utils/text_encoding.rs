// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use tracing::debug;

/// 只在文档开头查找 `<meta>` 声明的字符集
const META_PRESCAN_LEN: usize = 1024;

static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]*?charset\s*=\s*["']?\s*([a-z0-9_.:\-]+)"#)
        .expect("meta charset pattern is valid")
});

/// 从 `content-type` 取 `charset` 参数
fn header_charset(content_type: &str) -> Option<&'static Encoding> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        Encoding::for_label(value.trim().trim_matches(['"', '\'']).as_bytes())
    })
}

fn meta_charset(raw: &[u8]) -> Option<&'static Encoding> {
    let head = &raw[..raw.len().min(META_PRESCAN_LEN)];
    let label = META_CHARSET.captures(head)?.get(1)?;
    Encoding::for_label(label.as_bytes())
}

fn detect(raw: &[u8]) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(raw, true);
    detector.guess(None, true)
}

/// 把响应字节解码为UTF-8文本
///
/// 依次采用响应头声明的字符集、页面 `<meta>` 声明的字符集；都没有时，
/// 合法的UTF-8直接返回，否则交给chardetng检测。无法解码的字节替换为U+FFFD。
pub fn decode_text(raw: &[u8], content_type: Option<&str>) -> String {
    let declared = content_type
        .and_then(header_charset)
        .or_else(|| meta_charset(raw));

    let encoding = match declared {
        Some(encoding) => encoding,
        None => match std::str::from_utf8(raw) {
            Ok(text) => return text.to_string(),
            Err(_) => detect(raw),
        },
    };
    if encoding != UTF_8 {
        debug!("Decoding {} bytes as {}", raw.len(), encoding.name());
    }

    let (text, _, had_errors) = encoding.decode(raw);
    if had_errors {
        debug!("Malformed {} input replaced", encoding.name());
    }
    text.into_owned()
}
