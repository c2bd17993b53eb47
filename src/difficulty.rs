use serde::Serialize;

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 5;
pub const DEFAULT_LEVEL: u8 = 4;

/// Per-request generation knobs, fixed by the difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyConfig {
    pub level: u8,
    pub candidate_volume: usize,
    pub overlap_probability: f64,
    pub max_overlap_words: usize,
    pub freshness_probability: f64,
    pub retry_budget: usize,
    pub allow_domain_repeats: bool,
}

impl DifficultyConfig {
    /// Out-of-range levels are clamped, never rejected.
    pub fn for_level(level: i64) -> Self {
        let level = level.clamp(MIN_LEVEL as i64, MAX_LEVEL as i64) as u8;
        let (candidate_volume, overlap_probability, max_overlap_words, freshness_probability, retry_budget) =
            match level {
                1 => (700, 0.0, 0, 0.05, 3),
                2 => (850, 0.0, 0, 0.08, 4),
                3 => (1000, 0.35, 1, 0.12, 6),
                4 => (1200, 0.5, 1, 0.18, 8),
                _ => (1500, 0.75, 2, 0.25, 12),
            };
        DifficultyConfig {
            level,
            candidate_volume,
            overlap_probability,
            max_overlap_words,
            freshness_probability,
            retry_budget,
            allow_domain_repeats: level >= MAX_LEVEL,
        }
    }

    /// Lenient parse of a caller-supplied difficulty: integers and numeric
    /// strings are truncated then clamped; anything else is the default.
    pub fn from_json(value: Option<&serde_json::Value>) -> Self {
        let parsed = match value {
            Some(serde_json::Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
            Some(serde_json::Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64),
            _ => None,
        };
        Self::for_level(parsed.unwrap_or(DEFAULT_LEVEL as i64))
    }
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self::for_level(DEFAULT_LEVEL as i64)
    }
}
