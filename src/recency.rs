use std::collections::HashSet;

use crate::candidate::CandidateGroup;
use crate::token::WordToken;

/// Tokens accepted from one request; anything past this is ignored.
pub const MAX_AVOID_TOKENS: usize = 2500;
const KEY_HEX_LEN: usize = 16;

/// How much of the recency record a filter pass honours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecencyFilter {
    /// Group keys, category labels, and individual words.
    Full,
    /// Group keys and category labels; word repeats are fine.
    KeysAndLabels,
    Off,
}

/// Caller-owned record of what was shown recently. Read-only for the
/// generator: it is consulted as an exclusion filter and never written.
#[derive(Debug, Clone, Default)]
pub struct RecencySet {
    keys: HashSet<String>,
    labels: HashSet<String>,
    words: HashSet<WordToken>,
}

impl RecencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the set from raw request tokens. `g_…` and `c_…` tokens are
    /// group and label keys; everything else is read as a word.
    pub fn from_tokens<'a, I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut set = RecencySet::new();
        for token in tokens.into_iter().take(MAX_AVOID_TOKENS) {
            set.insert(token);
        }
        set
    }

    /// Keys are matched case-insensitively and stored lowercase, the way
    /// they are minted.
    pub fn insert(&mut self, token: &str) {
        let token = token.trim();
        let folded = token.to_ascii_lowercase();
        if is_key(&folded, "g_") {
            self.keys.insert(folded);
        } else if is_key(&folded, "c_") {
            self.labels.insert(folded);
        } else if let Ok(word) = WordToken::parse(token) {
            self.words.insert(word);
        }
    }

    pub fn extend<'a, I>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for token in tokens {
            self.insert(token);
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len() + self.labels.len() + self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn words(&self) -> &HashSet<WordToken> {
        &self.words
    }

    pub fn excludes(&self, group: &CandidateGroup, filter: RecencyFilter) -> bool {
        match filter {
            RecencyFilter::Off => false,
            RecencyFilter::KeysAndLabels => {
                self.keys.contains(group.key()) || self.labels.contains(group.label_key())
            }
            RecencyFilter::Full => {
                self.excludes(group, RecencyFilter::KeysAndLabels)
                    || group.words().iter().any(|w| self.words.contains(w))
            }
        }
    }
}

fn is_key(token: &str, prefix: &str) -> bool {
    token
        .strip_prefix(prefix)
        .is_some_and(|hex| hex.len() == KEY_HEX_LEN && hex.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')))
}
