// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use clap::{Args, Parser, Subcommand};
use indicatif::MultiProgress;
use serde_json::Value;
use spiderkit::config::options::{CacheDirective, PartialOptions, TransformFlags};
use spiderkit::config::settings::Settings;
use spiderkit::config::store::ConfigStore;
use spiderkit::domain::models::response::Response;
use spiderkit::queue::scheduler::JobScheduler;
use spiderkit::queue::url_pattern;
use spiderkit::utils::errors::SpiderError;
use spiderkit::utils::headers::{parse_headers, to_save_path};
use spiderkit::utils::output::OutputSink;
use spiderkit::utils::progress::DownloadProgress;
use spiderkit::utils::telemetry;
use spiderkit::Spider;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "spider",
    version = env!("CARGO_PKG_VERSION"),
    about,
    long_about = None,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Cache responses on disk, optionally under the given directory
    #[arg(long, global = true, num_args = 0..=1, value_name = "DIR")]
    cache: Option<Option<PathBuf>>,

    /// Cache expiry in seconds
    #[arg(long, global = true, value_name = "SECS")]
    expire: Option<u64>,

    /// Drop repeated output lines
    #[arg(long, global = true)]
    unique: bool,

    /// Retry budget for failed requests
    #[arg(long, global = true)]
    retry: Option<u32>,

    /// Download in N concurrent byte-range parts
    #[arg(long, global = true)]
    parts: Option<u32>,

    /// Selector pattern of the next page link, may be repeated
    #[arg(long, global = true, value_name = "PATTERN")]
    follow: Vec<String>,

    /// Request timeout in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    timeout: Option<u64>,

    /// Extra request headers, `Key: value` lines separated by `\n`
    #[arg(long, global = true)]
    headers: Option<String>,

    /// User-Agent preset: default, chrome, firefox, safari, mobile
    #[arg(long, global = true, value_name = "KEY")]
    user_agent: Option<String>,

    /// Log level: silent, error, warn, info, debug
    #[arg(long, global = true)]
    log: Option<String>,

    /// Decode HTML entities in extracted values
    #[arg(long, global = true)]
    unescape: bool,

    /// Number of pages processed at once
    #[arg(long, global = true)]
    parallel: Option<usize>,

    #[arg(long, global = true)]
    normalize_links: bool,

    #[arg(long, global = true)]
    remove_scripts: bool,

    #[arg(long, global = true)]
    remove_empty_lines: bool,

    #[arg(long, global = true)]
    format_html: bool,

    /// Enable every content transform
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the URLs a pattern expands to
    Expand { pattern: Option<String> },
    /// Print page content
    Get { url: Option<String> },
    /// Print response headers as JSON
    Headers { url: Option<String> },
    /// Extract with a selector pattern, e.g. `a => @href => trim`
    Css { pattern: String, url: Option<String> },
    /// Extract regex capture groups
    Regex {
        pattern: String,
        url: Option<String>,
        #[arg(short, long, default_value_t = 0)]
        group: usize,
    },
    /// Print normalized links
    Link { url: Option<String> },
    /// Print images: level 0 prints tags, level 1 prints sources
    Image {
        url: Option<String>,
        #[arg(short, long, default_value_t = 1)]
        level: u8,
    },
    /// Download to a file, `%file` in the output is the URL's file name
    Save {
        url: Option<String>,
        #[arg(short, long, default_value = "%file")]
        output: String,
    },
    /// Read or change the config file
    #[command(alias = "cfg")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print a key, `*` prints everything
    Get { key: String },
    /// Set a key; JSON values are stored as JSON, anything else as a string
    Set { key: String, value: String },
    /// Enable or disable a key without losing its value
    Toggle {
        key: String,
        #[arg(value_enum)]
        state: ToggleState,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ToggleState {
    On,
    Off,
}

/// 页面提取命令
#[derive(Debug, Clone)]
enum Extraction {
    Content,
    Headers,
    Css(String),
    Regex(String, usize),
    Links,
    Images(u8),
}

impl GlobalArgs {
    fn overrides(&self) -> PartialOptions {
        let mut options = PartialOptions::new();
        options.cache = self.cache.as_ref().map(|dir| match dir {
            Some(dir) => CacheDirective::Dir(dir.clone()),
            None => CacheDirective::DefaultDir,
        });
        options.expire = self.expire.map(Duration::from_secs);
        options.retry = self.retry;
        options.timeout = self.timeout.map(Duration::from_millis);
        options.headers = self.headers.as_deref().map(parse_headers);
        options.user_agent = self.user_agent.clone();
        options.parts = self.parts;
        if self.unescape {
            options.unescape = Some(true);
        }

        let transforms = TransformFlags {
            normalize_links: self.normalize_links,
            remove_scripts: self.remove_scripts,
            remove_empty_lines: self.remove_empty_lines,
            format_html: self.format_html,
            pretty: self.pretty,
            ..TransformFlags::default()
        };
        if transforms != TransformFlags::default() {
            options.transforms = Some(transforms);
        }
        options
    }
}

/// 主函数
///
/// 解析命令行，加载配置并分派子命令
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::new()?;
    telemetry::init_telemetry(cli.global.log.as_deref().unwrap_or(&settings.log));
    debug!("Settings loaded: {:?}", settings);

    let (url, extraction) = match cli.cmd {
        Commands::Config { action } => return run_config(action),
        Commands::Expand { pattern } => {
            let mut sink = OutputSink::stdout(cli.global.unique);
            for url in url_pattern::expand(pattern.as_deref()) {
                sink.emit(&url)?;
            }
            return Ok(());
        }
        Commands::Get { url } => (url, Extraction::Content),
        Commands::Headers { url } => (url, Extraction::Headers),
        Commands::Css { pattern, url } => (url, Extraction::Css(pattern)),
        Commands::Regex {
            pattern,
            url,
            group,
        } => (url, Extraction::Regex(pattern, group)),
        Commands::Link { url } => (url, Extraction::Links),
        Commands::Image { url, level } => (url, Extraction::Images(level)),
        Commands::Save { url, output } => {
            let spider = Spider::from_settings(&settings, &cli.global.overrides())?;
            let parallel = cli.global.parallel.unwrap_or(settings.parallel);
            return run_saves(&spider, url, &output, parallel).await;
        }
    };

    let spider = Spider::from_settings(&settings, &cli.global.overrides())?;
    let parallel = cli.global.parallel.unwrap_or(settings.parallel);
    run_pages(
        &spider,
        url,
        extraction,
        &cli.global.follow,
        parallel,
        cli.global.unique,
    )
    .await
}

/// 抓取每个URL并输出提取结果
///
/// 指定 `--follow` 时，每页的下一页链接追加到同一个调度器
async fn run_pages(
    spider: &Spider,
    url: Option<String>,
    extraction: Extraction,
    follow: &[String],
    parallel: usize,
    unique: bool,
) -> anyhow::Result<()> {
    let source = url_pattern::expand(url.as_deref());
    let visited = Mutex::new(HashSet::new());
    let mut sink = OutputSink::stdout(unique);
    let mut write_error = None;

    let no_overrides = PartialOptions::new();
    let extraction = &extraction;
    let visited = &visited;
    let no_overrides = &no_overrides;

    let stats = JobScheduler::new(parallel, true)
        .run(
            source,
            move |url: String, ctx| async move {
                if let Ok(mut visited) = visited.lock() {
                    visited.insert(url.clone());
                }
                let res = spider.get(&url, no_overrides).await?;
                let lines = extract(&res, extraction).await?;

                if !follow.is_empty() {
                    if let Some(next) = spider.next_link(&res, follow).await? {
                        let fresh = visited
                            .lock()
                            .map(|mut visited| visited.insert(next.clone()))
                            .unwrap_or(false);
                        if fresh {
                            debug!("Follow {}", next);
                            ctx.enqueue(next);
                        }
                    }
                }
                Ok::<_, SpiderError>(lines)
            },
            |outcome| {
                let Ok(lines) = outcome.result else {
                    return;
                };
                for line in lines {
                    if write_error.is_some() {
                        return;
                    }
                    if let Err(e) = sink.emit(&line) {
                        write_error = Some(e);
                    }
                }
            },
        )
        .await;

    info!(
        "Processed {} page(s), {} failed, {} followed",
        stats.dispatched, stats.failed, stats.followed
    );
    match write_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

async fn extract(res: &Response, extraction: &Extraction) -> Result<Vec<String>, SpiderError> {
    if res.is_absent() {
        warn!("No content for {}", res.url());
        return Ok(Vec::new());
    }
    match extraction {
        Extraction::Content => Ok(res.data().await?.map(str::to_string).into_iter().collect()),
        Extraction::Headers => {
            let headers: BTreeMap<&str, &str> = res
                .headers()
                .map(|h| h.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect())
                .unwrap_or_default();
            Ok(vec![serde_json::to_string_pretty(&headers)?])
        }
        Extraction::Css(pattern) => Ok(res.css(pattern).await?.into_vec()),
        Extraction::Regex(pattern, group) => Ok(res.regex(pattern, *group).await?.into_vec()),
        Extraction::Links => res.links().await,
        Extraction::Images(level) => res.images(*level).await,
    }
}

/// 下载每个URL
///
/// 分段下载不被服务器支持时回退到单流下载
async fn run_saves(
    spider: &Spider,
    url: Option<String>,
    output: &str,
    parallel: usize,
) -> anyhow::Result<()> {
    let source = url_pattern::expand(url.as_deref());
    let multi = MultiProgress::new();
    let multi = &multi;

    let results = JobScheduler::new(parallel, false)
        .collect(source, move |url: String, _ctx| async move {
            let path = PathBuf::from(to_save_path(&url, output));
            save_one(spider, &url, &path, multi).await
        })
        .await;

    let failed = results.iter().filter(|r| !matches!(r, Ok(true))).count();
    info!("Saved {} of {} file(s)", results.len() - failed, results.len());
    Ok(())
}

async fn save_one(
    spider: &Spider,
    url: &str,
    path: &Path,
    multi: &MultiProgress,
) -> Result<bool, SpiderError> {
    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| url.to_string());
    let progress = DownloadProgress::new(multi, label);

    match spider.save(url, path, &PartialOptions::new(), &progress).await {
        Err(SpiderError::MultipartUnsupported(_)) => {
            warn!("{} does not support ranged download, using a single stream", url);
            spider
                .save(url, path, &PartialOptions::new().parts(0), &progress)
                .await
        }
        other => other,
    }
}

fn run_config(action: ConfigAction) -> anyhow::Result<()> {
    let mut store = ConfigStore::open(ConfigStore::default_path())?;
    match action {
        ConfigAction::Get { key } => match store.get(&key) {
            Some(Value::String(s)) => println!("{}", s),
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => debug!("{} is not set", key),
        },
        ConfigAction::Set { key, value } => {
            let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            store.set(&key, value)?;
            info!("{} updated in {}", key, store.path().display());
        }
        ConfigAction::Toggle { key, state } => {
            store.toggle(&key, matches!(state, ToggleState::On))?;
        }
    }
    Ok(())
}
