// src/fetcher.rs
//! Video catalog retrieval.
//!
//! The job controller only knows the [`VideoFetcher`] trait. [`YtDlpFetcher`]
//! is the production implementation: it runs the `yt-dlp` CLI against the
//! channel's videos tab and reads one JSON document per line from stdout.

use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::job::ProgressReporter;
use crate::models::{lenient_u64, parse_published, Video};

pub const DEFAULT_YTDLP_BIN: &str = "yt-dlp";
pub const DEFAULT_PLAYLIST_END: u32 = 20;
const DESCRIPTION_MAX_CHARS: usize = 200;

#[async_trait]
pub trait VideoFetcher: Send + Sync {
    /// Retrieve the catalog of `channel_url`, reporting progress as it goes.
    async fn fetch_videos(&self, channel_url: &str, progress: &ProgressReporter) -> Result<Vec<Video>>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    program: String,
    leading_args: Vec<String>,
    playlist_end: u32,
}

impl YtDlpFetcher {
    pub fn new(bin: impl Into<String>, playlist_end: u32) -> Self {
        Self {
            program: bin.into(),
            leading_args: Vec::new(),
            playlist_end: playlist_end.max(1),
        }
    }

    /// Run `program leading_args... <yt-dlp args>`; lets a wrapper (e.g. `sh -c`) stand in for yt-dlp.
    pub fn with_command(program: impl Into<String>, leading_args: Vec<String>, playlist_end: u32) -> Self {
        Self {
            program: program.into(),
            leading_args,
            playlist_end: playlist_end.max(1),
        }
    }

    fn build_command(&self, videos_url: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .args([
                "--dump-json",
                "--skip-download",
                "--ignore-errors",
                "--no-warnings",
                "--playlist-end",
            ])
            .arg(self.playlist_end.to_string())
            .arg(videos_url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl VideoFetcher for YtDlpFetcher {
    async fn fetch_videos(&self, channel_url: &str, progress: &ProgressReporter) -> Result<Vec<Video>> {
        let videos_url = videos_tab_url(channel_url);
        let total = self.playlist_end as usize;

        let mut child = self
            .build_command(&videos_url)
            .spawn()
            .map_err(|e| AppError::FetchFailure(format!("could not start {}: {e}", self.program)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::FetchFailure("no stdout from fetch process".into()))?;
        // Drain stderr concurrently so a chatty child cannot block on a full pipe.
        let stderr_task = child.stderr.take().map(|mut err| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let _ = err.read_to_string(&mut buf).await;
                buf
            })
        });

        let mut videos = Vec::new();
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| AppError::FetchFailure(e.to_string()))?
        {
            if line.trim().is_empty() {
                continue;
            }
            match parse_entry(&line) {
                Some(v) => {
                    videos.push(v);
                    let n = videos.len();
                    progress.report_step(n, total, format!("Scraped {n}/{total} videos"));
                }
                None => debug!(len = line.len(), "skipping unparseable fetch output line"),
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| AppError::FetchFailure(e.to_string()))?;
        let stderr = match stderr_task {
            Some(t) => t.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            let reason = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("no output")
                .trim()
                .to_string();
            // --ignore-errors makes partial catalogs exit non-zero; keep what we got.
            if videos.is_empty() {
                return Err(AppError::FetchFailure(format!("{status}: {reason}")));
            }
            warn!(channel = channel_url, videos = videos.len(), %reason, "fetch finished with errors");
        }
        Ok(videos)
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

/// Point a channel URL at its videos tab (`.../@name` -> `.../@name/videos`).
pub fn videos_tab_url(channel_url: &str) -> String {
    let trimmed = channel_url.trim().trim_end_matches('/');
    if trimmed.ends_with("/videos") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/videos")
    }
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    id: Option<String>,
    title: Option<String>,
    webpage_url: Option<String>,
    thumbnail: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    view_count: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    like_count: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    duration: u64,
    upload_date: Option<String>,
    timestamp: Option<i64>,
    description: Option<String>,
    uploader: Option<String>,
    channel_id: Option<String>,
}

/// One line of `--dump-json` output. `None` for anything without an id.
fn parse_entry(line: &str) -> Option<Video> {
    let raw: RawEntry = serde_json::from_str(line).ok()?;
    let id = raw.id.filter(|s| !s.is_empty())?;

    let published = raw
        .timestamp
        .and_then(|t| chrono::DateTime::<chrono::Utc>::from_timestamp(t, 0))
        .or_else(|| raw.upload_date.as_deref().and_then(parse_published));

    Some(Video {
        url: raw
            .webpage_url
            .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={id}")),
        title: raw.title.unwrap_or_default(),
        thumbnail: raw.thumbnail,
        views: raw.view_count,
        like_count: raw.like_count,
        duration: raw.duration,
        published,
        description: raw
            .description
            .map(|d| d.chars().take(DESCRIPTION_MAX_CHARS).collect()),
        channel: raw.uploader,
        channel_id: raw.channel_id,
        id,
    })
}
