// src/keywords.rs
//! # Keyword Extractor
//! Counts significant words across video titles.
//!
//! Titles are lower-cased, stripped of punctuation and split on whitespace.
//! Short tokens and stopwords are dropped; the rest are counted across all
//! titles combined. Ordering is by count descending, ties by first occurrence.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

pub const DEFAULT_KEYWORDS_CONFIG_PATH: &str = "config/keywords.toml";
pub const DEFAULT_MIN_LEN: usize = 3;

const DEFAULT_STOPWORDS: &[&str] = &[
    "the", "and", "a", "to", "of", "in", "for", "on", "with", "is", "at", "by", "an", "be",
    "this", "that", "it", "from", "as", "are", "was", "but", "or", "if", "you", "i", "we",
    "your", "our", "my", "they", "their", "how", "what", "why", "not", "all", "can", "has",
    "have", "will",
];

// Anything that is neither a word character nor whitespace.
static RE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]|_").unwrap());

/// Stopwords and minimum token length. Loadable from TOML:
///
/// ```toml
/// min_len = 3
/// stopwords = ["the", "and"]
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct KeywordConfig {
    #[serde(default = "default_min_len")]
    pub min_len: usize,
    #[serde(default = "default_stopwords")]
    pub stopwords: HashSet<String>,
}

fn default_min_len() -> usize {
    DEFAULT_MIN_LEN
}

fn default_stopwords() -> HashSet<String> {
    DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect()
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            min_len: DEFAULT_MIN_LEN,
            stopwords: default_stopwords(),
        }
    }
}

impl KeywordConfig {
    /// Build a config from an explicit stopword list (handy in tests).
    pub fn with_stopwords<I, S>(min_len: usize, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            min_len,
            stopwords: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let mut cfg: KeywordConfig = toml::from_str(s)?;
        cfg.stopwords = cfg
            .stopwords
            .into_iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn is_significant(&self, token: &str) -> bool {
        token.chars().count() >= self.min_len && !self.stopwords.contains(token)
    }
}

/// Lower-case, strip punctuation, split on whitespace.
pub fn tokenize(title: &str) -> Vec<String> {
    let lowered = title.to_lowercase();
    RE_PUNCT
        .replace_all(&lowered, "")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Top `top_n` significant words across `titles` as `(word, count)`.
pub fn extract<S: AsRef<str>>(titles: &[S], top_n: usize, cfg: &KeywordConfig) -> Vec<(String, u64)> {
    // word -> (count, first-seen index)
    let mut counts: HashMap<String, (u64, usize)> = HashMap::new();
    let mut seen = 0usize;

    for title in titles {
        for tok in tokenize(title.as_ref()) {
            if !cfg.is_significant(&tok) {
                continue;
            }
            let entry = counts.entry(tok).or_insert((0, seen));
            entry.0 += 1;
            seen += 1;
        }
    }

    let mut ranked: Vec<(String, u64, usize)> = counts
        .into_iter()
        .map(|(w, (c, first))| (w, c, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(top_n);
    ranked.into_iter().map(|(w, c, _)| (w, c)).collect()
}
