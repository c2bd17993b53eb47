use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_TOKEN_LEN: usize = 2;
pub const MAX_TOKEN_LEN: usize = 18;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is empty after normalization")]
    Empty,
    #[error("token \"{0}\" is outside the 2..=18 length window")]
    Length(String),
    #[error("token \"{0}\" has no alphanumeric character")]
    NoAlphanumeric(String),
}

/// A tile-safe word or short phrase: uppercased, inner whitespace collapsed
/// to single spaces, 2..=18 characters, at least one alphanumeric.
///
/// Equality and ordering are on the normalized form, so `" no  cap"` and
/// `"NO CAP"` are the same token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WordToken(String);

impl WordToken {
    pub fn parse(raw: &str) -> Result<Self, TokenError> {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return Err(TokenError::Empty);
        }
        let len = normalized.chars().count();
        if !(MIN_TOKEN_LEN..=MAX_TOKEN_LEN).contains(&len) {
            return Err(TokenError::Length(normalized));
        }
        if !normalized.chars().any(char::is_alphanumeric) {
            return Err(TokenError::NoAlphanumeric(normalized));
        }
        Ok(WordToken(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn starts_with(&self, affix: &str) -> bool {
        self.0.starts_with(affix)
    }

    pub fn ends_with(&self, affix: &str) -> bool {
        self.0.ends_with(affix)
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.0.contains(needle)
    }
}

fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

impl fmt::Display for WordToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for WordToken {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        WordToken::parse(&value)
    }
}

impl From<WordToken> for String {
    fn from(token: WordToken) -> Self {
        token.0
    }
}

impl AsRef<str> for WordToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parses a whole list, dropping anything that is not tile-safe.
pub fn parse_all<'a, I>(raw: I) -> Vec<WordToken>
where
    I: IntoIterator<Item = &'a str>,
{
    raw.into_iter().filter_map(|w| WordToken::parse(w).ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let t = WordToken::parse("  no \t cap ").unwrap();
        assert_eq!(t.as_str(), "NO CAP");
        assert_eq!(t, WordToken::parse("NO CAP").unwrap());
    }

    #[test]
    fn rejects_out_of_window_lengths() {
        assert!(matches!(WordToken::parse("w"), Err(TokenError::Length(_))));
        assert!(matches!(
            WordToken::parse("ABCDEFGHIJKLMNOPQRS"),
            Err(TokenError::Length(_))
        ));
        assert!(WordToken::parse("ABCDEFGHIJKLMNOPQR").is_ok());
    }

    #[test]
    fn rejects_empty_and_symbol_only() {
        assert_eq!(WordToken::parse("   "), Err(TokenError::Empty));
        assert!(matches!(
            WordToken::parse("?!"),
            Err(TokenError::NoAlphanumeric(_))
        ));
        assert!(WordToken::parse("K/D").is_ok());
    }

    #[test]
    fn deserialization_goes_through_parse() {
        let t: WordToken = serde_json::from_str("\"glow  up\"").unwrap();
        assert_eq!(t.as_str(), "GLOW UP");
        assert!(serde_json::from_str::<WordToken>("\"x\"").is_err());
    }

    proptest! {
        #[test]
        fn parse_is_idempotent(raw in "[a-zA-Z0-9 ]{0,24}") {
            if let Ok(first) = WordToken::parse(&raw) {
                let second = WordToken::parse(first.as_str()).unwrap();
                prop_assert_eq!(first, second);
            }
        }
    }
}
