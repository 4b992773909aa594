// src/channels.rs
//! Registered channels, persisted as a JSON array.

use std::path::PathBuf;

use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::Channel;

pub const DEFAULT_CHANNELS_PATH: &str = "channels.json";

#[derive(Debug)]
pub struct ChannelStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ChannelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub async fn list(&self) -> Result<Vec<Channel>> {
        let _g = self.lock.lock().await;
        self.read().await
    }

    /// Register `url`; a URL already present is left alone.
    pub async fn add(&self, url: &str) -> Result<Vec<Channel>> {
        let _g = self.lock.lock().await;
        let mut channels = self.read().await?;
        if !channels.iter().any(|c| c.url == url) {
            channels.push(Channel::from_url(url));
            self.write(&channels).await?;
            tracing::info!(channel = url, "channel registered");
        }
        Ok(channels)
    }

    pub async fn remove(&self, url: &str) -> Result<Vec<Channel>> {
        let _g = self.lock.lock().await;
        let mut channels = self.read().await?;
        let before = channels.len();
        channels.retain(|c| c.url != url);
        if channels.len() != before {
            self.write(&channels).await?;
            tracing::info!(channel = url, "channel removed");
        }
        Ok(channels)
    }

    async fn read(&self) -> Result<Vec<Channel>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(s) if s.trim().is_empty() => Ok(Vec::new()),
            Ok(s) => Ok(serde_json::from_str(&s)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, channels: &[Channel]) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(channels)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
