//! The JSON face of the engine: lenient request parsing, the response
//! document, guess evaluation against a served puzzle, and a shape audit.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use crate::difficulty::DifficultyConfig;
use crate::puzzle::{Color, Puzzle};
use crate::recency::{RecencySet, MAX_AVOID_TOKENS};
use crate::token::WordToken;

const GROUP_COUNT: usize = 4;
const GROUP_SIZE: usize = 4;
const TILE_COUNT: usize = GROUP_COUNT * GROUP_SIZE;

/// A parsed request. Never fails: anything unreadable becomes the default.
#[derive(Debug, Clone, Default)]
pub struct PuzzleRequest {
    pub difficulty: DifficultyConfig,
    pub recency: RecencySet,
}

impl PuzzleRequest {
    pub fn new(level: i64) -> Self {
        PuzzleRequest {
            difficulty: DifficultyConfig::for_level(level),
            recency: RecencySet::new(),
        }
    }

    pub fn with_recency(mut self, recency: RecencySet) -> Self {
        self.recency = recency;
        self
    }

    pub fn from_json(value: &Value) -> Self {
        let difficulty = DifficultyConfig::from_json(value.get("difficulty"));
        let mut recency = RecencySet::new();
        for field in ["avoid", "recentWords"] {
            if let Some(Value::Array(items)) = value.get(field) {
                recency.extend(items.iter().take(MAX_AVOID_TOKENS).filter_map(Value::as_str));
            }
        }
        PuzzleRequest { difficulty, recency }
    }

    /// Empty or malformed bodies are treated as `{}`.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from_json(&value),
            Err(_) => Self::from_json(&Value::Object(Default::default())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
    pub color: Color,
    pub category: String,
    pub words: Vec<String>,
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileView {
    pub word: String,
    pub group_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleResponse {
    #[serde(default)]
    pub generated_at: i64,
    #[serde(default)]
    pub difficulty: u8,
    #[serde(default)]
    pub fallback: bool,
    pub groups: Vec<GroupView>,
    pub tiles: Vec<TileView>,
    #[serde(default)]
    pub seen: Vec<String>,
}

impl PuzzleResponse {
    pub fn new(puzzle: &Puzzle, difficulty: &DifficultyConfig, fallback: bool) -> Self {
        PuzzleResponse {
            generated_at: chrono::Utc::now().timestamp_millis(),
            difficulty: difficulty.level,
            fallback,
            groups: puzzle
                .groups
                .iter()
                .map(|g| GroupView {
                    color: g.color,
                    category: g.group.label().to_string(),
                    words: g.group.words().iter().map(|w| w.to_string()).collect(),
                    key: g.group.key().to_string(),
                })
                .collect(),
            tiles: puzzle
                .tiles
                .iter()
                .map(|t| TileView {
                    word: t.word.to_string(),
                    group_index: t.group_index,
                })
                .collect(),
            seen: puzzle.seen_tokens(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum GuessOutcome {
    Correct {
        #[serde(rename = "groupIndex")]
        group_index: usize,
    },
    /// Three of the four picks belong to this group.
    OneAway {
        #[serde(rename = "groupIndex")]
        group_index: usize,
    },
    Miss,
    /// Not four distinct words from this puzzle.
    Invalid,
}

pub fn evaluate_guess<S: AsRef<str>>(response: &PuzzleResponse, picks: &[S]) -> GuessOutcome {
    if picks.len() != GROUP_SIZE {
        return GuessOutcome::Invalid;
    }
    let board: HashMap<&str, usize> = response
        .tiles
        .iter()
        .map(|t| (t.word.as_str(), t.group_index))
        .collect();

    let mut distinct = HashSet::new();
    let mut per_group: HashMap<usize, usize> = HashMap::new();
    for pick in picks {
        let Ok(word) = WordToken::parse(pick.as_ref()) else {
            return GuessOutcome::Invalid;
        };
        let Some(&group) = board.get(word.as_str()) else {
            return GuessOutcome::Invalid;
        };
        if !distinct.insert(word) {
            return GuessOutcome::Invalid;
        }
        *per_group.entry(group).or_insert(0) += 1;
    }

    match per_group.into_iter().max_by_key(|(_, n)| *n) {
        Some((group_index, 4)) => GuessOutcome::Correct { group_index },
        Some((group_index, 3)) => GuessOutcome::OneAway { group_index },
        _ => GuessOutcome::Miss,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuditError {
    #[error("expected 4 groups, found {0}")]
    GroupCount(usize),
    #[error("group {index} has {size} words")]
    GroupSize { index: usize, size: usize },
    #[error("group {0} has an empty category")]
    EmptyCategory(usize),
    #[error("colour {0:?} is used twice")]
    RepeatedColor(Color),
    #[error("expected 16 tiles, found {0}")]
    TileCount(usize),
    #[error("tile {0:?} appears more than once")]
    DuplicateTile(String),
    #[error("tile {word:?} points at group {index}")]
    BadGroupIndex { word: String, index: usize },
    #[error("group {0} words disagree with its tiles")]
    Mismatch(usize),
}

/// Re-checks the shape guarantees of a served puzzle.
pub fn audit(response: &PuzzleResponse) -> Result<(), AuditError> {
    if response.groups.len() != GROUP_COUNT {
        return Err(AuditError::GroupCount(response.groups.len()));
    }
    let mut colors = HashSet::new();
    for (index, g) in response.groups.iter().enumerate() {
        if g.words.len() != GROUP_SIZE {
            return Err(AuditError::GroupSize {
                index,
                size: g.words.len(),
            });
        }
        if g.category.trim().is_empty() {
            return Err(AuditError::EmptyCategory(index));
        }
        if !colors.insert(g.color) {
            return Err(AuditError::RepeatedColor(g.color));
        }
    }

    if response.tiles.len() != TILE_COUNT {
        return Err(AuditError::TileCount(response.tiles.len()));
    }
    let mut words = HashSet::new();
    let mut dealt: Vec<Vec<&str>> = vec![Vec::new(); GROUP_COUNT];
    for t in &response.tiles {
        if !words.insert(t.word.as_str()) {
            return Err(AuditError::DuplicateTile(t.word.clone()));
        }
        let Some(bucket) = dealt.get_mut(t.group_index) else {
            return Err(AuditError::BadGroupIndex {
                word: t.word.clone(),
                index: t.group_index,
            });
        };
        bucket.push(&t.word);
    }

    for (index, (g, bucket)) in response.groups.iter().zip(dealt.iter_mut()).enumerate() {
        let mut own: Vec<&str> = g.words.iter().map(String::as_str).collect();
        own.sort_unstable();
        bucket.sort_unstable();
        if own != *bucket {
            return Err(AuditError::Mismatch(index));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::fallback_groups;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn served() -> PuzzleResponse {
        let mut rng = StdRng::seed_from_u64(21);
        let puzzle = Puzzle::from_groups(fallback_groups(), &mut rng);
        PuzzleResponse::new(&puzzle, &DifficultyConfig::default(), true)
    }

    #[test]
    fn request_parsing_is_lenient() {
        let r = PuzzleRequest::from_json(&json!({
            "difficulty": "9",
            "avoid": ["g_0123456789abcdef", 7, "rizz"],
            "recentWords": ["yeet"]
        }));
        assert_eq!(r.difficulty.level, 5);
        assert_eq!(r.recency.len(), 3);

        let junk = PuzzleRequest::from_body("{not json");
        assert_eq!(junk.difficulty.level, 4);
        assert!(junk.recency.is_empty());
    }

    #[test]
    fn response_serializes_in_camel_case() {
        let value = serde_json::to_value(served()).unwrap();
        assert!(value.get("generatedAt").is_some());
        assert_eq!(value["fallback"], json!(true));
        assert!(value["tiles"][0].get("groupIndex").is_some());
        let color = value["groups"][0]["color"].as_str().unwrap();
        assert!(["YELLOW", "GREEN", "BLUE", "PURPLE"].contains(&color));
    }

    #[test]
    fn served_puzzles_pass_the_audit() {
        assert_eq!(audit(&served()), Ok(()));
    }

    #[test]
    fn audit_catches_tampering() {
        let mut r = served();
        r.tiles[0].word = r.tiles[1].word.clone();
        assert!(matches!(audit(&r), Err(AuditError::DuplicateTile(_))));

        let mut r = served();
        r.groups[1].color = r.groups[0].color;
        assert!(matches!(audit(&r), Err(AuditError::RepeatedColor(_))));

        let mut r = served();
        r.tiles[3].group_index = 9;
        assert!(matches!(audit(&r), Err(AuditError::BadGroupIndex { .. })));
    }

    #[test]
    fn guesses_are_graded() {
        let r = served();
        let first = &r.groups[0].words;
        assert_eq!(evaluate_guess(&r, &first[..]), GuessOutcome::Correct { group_index: 0 });

        let mut near = first.clone();
        near[3] = r.groups[1].words[0].clone();
        assert_eq!(evaluate_guess(&r, &near[..]), GuessOutcome::OneAway { group_index: 0 });

        let spread = [&r.groups[0].words[0], &r.groups[1].words[0], &r.groups[2].words[0], &r.groups[3].words[0]];
        assert_eq!(evaluate_guess(&r, &spread), GuessOutcome::Miss);

        let twice = [&first[0], &first[0], &first[1], &first[2]];
        assert_eq!(evaluate_guess(&r, &twice), GuessOutcome::Invalid);
        assert_eq!(evaluate_guess(&r, &["ZZZZ", "A", "B", "C"]), GuessOutcome::Invalid);
    }
}
