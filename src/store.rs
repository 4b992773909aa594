// src/store.rs
//! Analytics Store: computed summaries keyed by exact channel URL.
//!
//! `save` overwrites; `load` of an unknown key is [`AppError::NotFound`], never a
//! store failure.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::AnalyticsSummary;

pub const DEFAULT_ANALYTICS_PATH: &str = "analytics.json";

#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    async fn save(&self, channel_key: &str, summary: &AnalyticsSummary) -> Result<()>;
    async fn load(&self, channel_key: &str) -> Result<AnalyticsSummary>;
}

/// Process-local store; contents die with the process.
#[derive(Debug, Default)]
pub struct MemoryAnalyticsStore {
    inner: RwLock<HashMap<String, AnalyticsSummary>>,
}

impl MemoryAnalyticsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnalyticsStore for MemoryAnalyticsStore {
    async fn save(&self, channel_key: &str, summary: &AnalyticsSummary) -> Result<()> {
        self.inner
            .write()
            .insert(channel_key.to_string(), summary.clone());
        Ok(())
    }

    async fn load(&self, channel_key: &str) -> Result<AnalyticsSummary> {
        self.inner
            .read()
            .get(channel_key)
            .cloned()
            .ok_or_else(|| AppError::NotFound(channel_key.to_string()))
    }
}

/// One JSON object `{channel_url: summary}` on disk.
///
/// Writes go to `<path>.tmp` and are renamed over the original, so a failed
/// write leaves the previous file intact.
#[derive(Debug)]
pub struct JsonFileAnalyticsStore {
    path: PathBuf,
    // serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl JsonFileAnalyticsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<HashMap<String, AnalyticsSummary>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(s) if s.trim().is_empty() => Ok(HashMap::new()),
            Ok(s) => Ok(serde_json::from_str(&s)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, all: &HashMap<String, AnalyticsSummary>) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(all)?;
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl AnalyticsStore for JsonFileAnalyticsStore {
    async fn save(&self, channel_key: &str, summary: &AnalyticsSummary) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut all = self.read_all().await?;
        all.insert(channel_key.to_string(), summary.clone());
        self.write_all(&all).await?;
        tracing::debug!(channel = channel_key, path = %self.path.display(), "analytics saved");
        Ok(())
    }

    async fn load(&self, channel_key: &str) -> Result<AnalyticsSummary> {
        let mut all = self.read_all().await?;
        all.remove(channel_key)
            .ok_or_else(|| AppError::NotFound(channel_key.to_string()))
    }
}
