// src/analytics.rs
//! # Aggregator
//! Reduces a list of videos into an [`AnalyticsSummary`].
//!
//! Averages are arithmetic means with full precision; rounding is left to
//! whoever renders them.

use crate::error::{AppError, Result};
use crate::keywords::{self, KeywordConfig};
use crate::models::{AnalyticsSummary, Video};

pub const DEFAULT_TOP_KEYWORDS: usize = 10;
const SECS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone)]
pub struct Aggregator {
    keywords: KeywordConfig,
    top_n: usize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(KeywordConfig::default())
    }
}

impl Aggregator {
    pub fn new(keywords: KeywordConfig) -> Self {
        Self {
            keywords,
            top_n: DEFAULT_TOP_KEYWORDS,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Summarize `videos`. Fails with [`AppError::EmptyInput`] on an empty slice.
    pub fn aggregate(&self, videos: &[Video]) -> Result<AnalyticsSummary> {
        if videos.is_empty() {
            return Err(AppError::EmptyInput);
        }
        let n = videos.len() as f64;

        // f64 sums: u64 totals overflow on large counters.
        let mean =
            |field: fn(&Video) -> u64| videos.iter().map(|v| field(v) as f64).sum::<f64>() / n;

        let titles: Vec<&str> = videos.iter().map(|v| v.title.as_str()).collect();

        Ok(AnalyticsSummary {
            average_views: mean(|v| v.views),
            average_likes: mean(|v| v.like_count),
            average_duration_seconds: mean(|v| v.duration),
            average_engagement_ratio: engagement_ratio(videos),
            average_upload_frequency_days: upload_frequency_days(videos),
            top_keywords: keywords::extract(&titles, self.top_n, &self.keywords),
        })
    }
}

/// Mean of likes/views over videos that have views; zero-view videos do not count.
fn engagement_ratio(videos: &[Video]) -> f64 {
    let (sum, n) = videos
        .iter()
        .filter(|v| v.views > 0)
        .fold((0.0f64, 0usize), |(s, n), v| {
            (s + v.like_count as f64 / v.views as f64, n + 1)
        });
    if n > 0 {
        sum / n as f64
    } else {
        0.0
    }
}

/// Mean gap in days between consecutive publish timestamps.
/// `None` unless at least two distinct timestamps exist.
fn upload_frequency_days(videos: &[Video]) -> Option<f64> {
    let mut ts: Vec<i64> = videos
        .iter()
        .filter_map(|v| v.published.map(|d| d.timestamp()))
        .collect();
    ts.sort_unstable();

    let (first, last) = (*ts.first()?, *ts.last()?);
    if first == last {
        return None;
    }

    let gaps: Vec<f64> = ts
        .windows(2)
        .map(|w| (w[1] - w[0]) as f64 / SECS_PER_DAY)
        .collect();
    Some(gaps.iter().sum::<f64>() / gaps.len() as f64)
}
