// src/models.rs
//! Wire/data types: videos, computed summaries, channels.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One video of a channel catalog. Numeric fields default to 0 when absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Video {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub views: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub like_count: u64,
    /// Seconds.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub duration: u64,
    /// `None` when the platform gave no usable date.
    #[serde(default, deserialize_with = "lenient_published")]
    pub published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

/// Aggregate statistics over one catalog. Floats are full precision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsSummary {
    pub average_views: f64,
    pub average_likes: f64,
    pub average_duration_seconds: f64,
    pub average_engagement_ratio: f64,
    pub average_upload_frequency_days: Option<f64>,
    /// Serialized as `[[word, count], ...]`.
    pub top_keywords: Vec<(String, u64)>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Channel {
    pub url: String,
    pub name: String,
}

impl Channel {
    /// Name defaults to the last non-empty path segment (`.../@handle` -> `@handle`).
    pub fn from_url(url: &str) -> Self {
        let name = url
            .trim_end_matches('/')
            .rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or(url)
            .to_string();
        Self {
            url: url.to_string(),
            name,
        }
    }
}

/// Parse a publish date: RFC 3339, or `YYYYMMDD` as the platform reports upload dates.
pub fn parse_published(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn lenient_published<'de, D>(de: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(de)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => parse_published(&s),
        // unix seconds
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
        _ => None,
    })
}

// The platform sends `null` for hidden counters and occasionally floats.
pub(crate) fn lenient_u64<'de, D>(de: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(de)?;
    Ok(match raw {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}
