//! Optional outside vocabulary. One lookup per request at most, bounded by a
//! timeout; every failure means "no bonus pool" and generation carries on.

use futures_util::future::{BoxFuture, FutureExt};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use crate::token::WordToken;
use crate::vocab::Pool;

pub const DATAMUSE_URL: &str = "https://api.datamuse.com/words";
pub const TOPICS: &[&str] = &["movies", "gaming", "internet", "mythology", "science", "music", "sports", "slang"];

const MAX_FRESH_LEN: usize = 14;
const MAX_FRESH_TOKENS: usize = 60;
const MIN_FRESH_TOKENS: usize = 10;
const REQUEST_MAX: &str = "80";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("freshness lookups are disabled")]
    Disabled,
    #[error("freshness lookup timed out after {0:?}")]
    Timeout(Duration),
    #[error("freshness request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("freshness source answered HTTP {0}")]
    Status(u16),
    #[error("freshness payload was malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("freshness source returned only {0} usable tokens")]
    TooFew(usize),
}

pub trait FreshnessSource: Send + Sync {
    /// Raw, unsanitized words for `topic`.
    fn fetch<'a>(&'a self, topic: &'a str) -> BoxFuture<'a, Result<Vec<String>, FetchError>>;
}

#[derive(Debug, Deserialize)]
struct DatamuseWord {
    #[serde(default)]
    word: String,
}

#[derive(Debug, Clone)]
pub struct DatamuseSource {
    client: reqwest::Client,
    base_url: String,
}

impl DatamuseSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        DatamuseSource {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for DatamuseSource {
    fn default() -> Self {
        Self::new(DATAMUSE_URL)
    }
}

impl FreshnessSource for DatamuseSource {
    fn fetch<'a>(&'a self, topic: &'a str) -> BoxFuture<'a, Result<Vec<String>, FetchError>> {
        async move {
            let response = self
                .client
                .get(&self.base_url)
                .query(&[("topics", topic), ("max", REQUEST_MAX)])
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(FetchError::Status(response.status().as_u16()));
            }
            let body = response.text().await?;
            let entries: Vec<DatamuseWord> = serde_json::from_str(&body)?;
            Ok::<_, FetchError>(entries.into_iter().map(|e| e.word).collect())
        }
        .boxed()
    }
}

/// Canned words, optionally after a delay. Handy for tests and offline runs.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub words: Vec<String>,
    pub delay: Option<Duration>,
}

impl FreshnessSource for StaticSource {
    fn fetch<'a>(&'a self, _topic: &'a str) -> BoxFuture<'a, Result<Vec<String>, FetchError>> {
        async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok::<_, FetchError>(self.words.clone())
        }
        .boxed()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSource;

impl FreshnessSource for DisabledSource {
    fn fetch<'a>(&'a self, _topic: &'a str) -> BoxFuture<'a, Result<Vec<String>, FetchError>> {
        async { Err::<Vec<String>, _>(FetchError::Disabled) }.boxed()
    }
}

/// Rolls whether this request consults the source and, if so, on which topic.
pub fn plan_lookup<R: Rng + ?Sized>(probability: f64, rng: &mut R) -> Option<&'static str> {
    if !rng.gen_bool(probability.clamp(0.0, 1.0)) {
        return None;
    }
    TOPICS.choose(rng).copied()
}

/// One bounded lookup, sanitized into a pool labelled with the topic.
pub async fn lookup<S: FreshnessSource + ?Sized>(
    source: &S,
    topic: &str,
    timeout: Duration,
) -> Result<Pool, FetchError> {
    let raw = tokio::time::timeout(timeout, source.fetch(topic))
        .await
        .map_err(|_| FetchError::Timeout(timeout))??;
    let tokens = sanitize(raw);
    if tokens.len() < MIN_FRESH_TOKENS {
        return Err(FetchError::TooFew(tokens.len()));
    }
    Ok(Pool::from_tokens("fresh", &topic.to_uppercase(), "fresh", tokens))
}

/// Keeps short, mostly-alphanumeric, tile-safe tokens, de-duplicated.
pub fn sanitize(raw: Vec<String>) -> Vec<WordToken> {
    let mut seen = HashSet::new();
    raw.iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty() && w.chars().count() <= MAX_FRESH_LEN)
        .filter(|w| alphanumeric_dominant(w))
        .filter_map(|w| WordToken::parse(w).ok())
        .filter(|t| seen.insert(t.clone()))
        .take(MAX_FRESH_TOKENS)
        .collect()
}

fn alphanumeric_dominant(word: &str) -> bool {
    let total = word.chars().count();
    let alnum = word.chars().filter(|c| c.is_alphanumeric()).count();
    alnum * 2 >= total
}
