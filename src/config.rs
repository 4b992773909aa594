// src/config.rs
//! Runtime configuration from the environment (`.env` is loaded by the binary).
//!
//! Every key is optional; unparsable numbers fall back to the default.

use std::path::PathBuf;
use std::time::Duration;

use crate::channels::DEFAULT_CHANNELS_PATH;
use crate::fetcher::{DEFAULT_PLAYLIST_END, DEFAULT_YTDLP_BIN};
use crate::job::DEFAULT_VIDEO_CACHE_TTL;
use crate::keywords::DEFAULT_KEYWORDS_CONFIG_PATH;
use crate::store::DEFAULT_ANALYTICS_PATH;

pub const ENV_ANALYTICS_PATH: &str = "ANALYTICS_PATH";
pub const ENV_CHANNELS_PATH: &str = "CHANNELS_PATH";
pub const ENV_KEYWORDS_CONFIG_PATH: &str = "KEYWORDS_CONFIG_PATH";
pub const ENV_VIDEO_CACHE_TTL_SECS: &str = "VIDEO_CACHE_TTL_SECS";
pub const ENV_FETCH_PLAYLIST_END: &str = "FETCH_PLAYLIST_END";
pub const ENV_YTDLP_BIN: &str = "YTDLP_BIN";
pub const ENV_STATIC_DIR: &str = "STATIC_DIR";
pub const DEFAULT_STATIC_DIR: &str = "static";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub analytics_path: PathBuf,
    pub channels_path: PathBuf,
    pub keywords_config_path: PathBuf,
    pub video_cache_ttl: Duration,
    pub playlist_end: u32,
    pub ytdlp_bin: String,
    /// `None` when `STATIC_DIR` is set to an empty string.
    pub static_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            analytics_path: PathBuf::from(DEFAULT_ANALYTICS_PATH),
            channels_path: PathBuf::from(DEFAULT_CHANNELS_PATH),
            keywords_config_path: PathBuf::from(DEFAULT_KEYWORDS_CONFIG_PATH),
            video_cache_ttl: DEFAULT_VIDEO_CACHE_TTL,
            playlist_end: DEFAULT_PLAYLIST_END,
            ytdlp_bin: DEFAULT_YTDLP_BIN.to_string(),
            static_dir: Some(PathBuf::from(DEFAULT_STATIC_DIR)),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            analytics_path: env_path(ENV_ANALYTICS_PATH).unwrap_or(d.analytics_path),
            channels_path: env_path(ENV_CHANNELS_PATH).unwrap_or(d.channels_path),
            keywords_config_path: env_path(ENV_KEYWORDS_CONFIG_PATH)
                .unwrap_or(d.keywords_config_path),
            video_cache_ttl: env_parse::<u64>(ENV_VIDEO_CACHE_TTL_SECS)
                .map(Duration::from_secs)
                .unwrap_or(d.video_cache_ttl),
            playlist_end: env_parse::<u32>(ENV_FETCH_PLAYLIST_END)
                .filter(|n| *n > 0)
                .unwrap_or(d.playlist_end),
            ytdlp_bin: std::env::var(ENV_YTDLP_BIN)
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(d.ytdlp_bin),
            static_dir: match std::env::var(ENV_STATIC_DIR) {
                Ok(s) if s.trim().is_empty() => None,
                Ok(s) => Some(PathBuf::from(s)),
                Err(_) => d.static_dir,
            },
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
