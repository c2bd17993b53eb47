//! Mechanical category rules. A rule proves a whole group (`check`) and can
//! also say whether a single stray word would plausibly fit it (`admits`),
//! which is what decoy overlap and solution uniqueness are measured with.

use std::collections::HashSet;
use std::sync::Arc;

use crate::token::WordToken;
use crate::vocab::{PairRelation, PairTable, Pool};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProofError {
    #[error("affix rule has an empty pattern")]
    EmptyPattern,
    #[error("mixer rule covers {have} pools but the group has {needed} words")]
    MixerArity { needed: usize, have: usize },
    #[error("letter rule uses non-alphabetic {0:?}")]
    BadLetter(char),
}

#[derive(Debug, Clone)]
pub enum Proof {
    Membership(Arc<Pool>),
    Prefix(String),
    Suffix(String),
    Contains(String),
    Pairs(Arc<PairTable>),
    /// Every word is a distinct base from `bases` with `letter` inserted once.
    LetterInsert { letter: char, bases: Arc<Pool> },
    /// Every word is `base` with exactly one letter substituted.
    LetterSwap { base: WordToken },
    /// Every word comes from a different pool.
    Mixer(Vec<Arc<Pool>>),
}

impl Proof {
    pub fn kind(&self) -> &'static str {
        match self {
            Proof::Membership(_) => "membership",
            Proof::Prefix(_) => "prefix",
            Proof::Suffix(_) => "suffix",
            Proof::Contains(_) => "contains",
            Proof::Pairs(_) => "pairs",
            Proof::LetterInsert { .. } => "letter-insert",
            Proof::LetterSwap { .. } => "letter-swap",
            Proof::Mixer(_) => "mixer",
        }
    }

    pub fn check(&self, words: &[WordToken]) -> Result<bool, ProofError> {
        match self {
            Proof::Membership(pool) => Ok(words.iter().all(|w| pool.contains(w))),
            Proof::Prefix(p) | Proof::Suffix(p) | Proof::Contains(p) if p.is_empty() => {
                Err(ProofError::EmptyPattern)
            }
            Proof::Prefix(_) | Proof::Suffix(_) | Proof::Contains(_) | Proof::LetterSwap { .. } => {
                Ok(words.iter().all(|w| self.admits(w)))
            }
            Proof::Pairs(table) => Ok(two_complete_pairs(table, words)),
            Proof::LetterInsert { letter, bases } => {
                if !letter.is_ascii_alphabetic() {
                    return Err(ProofError::BadLetter(*letter));
                }
                let options: Vec<Vec<usize>> = words
                    .iter()
                    .map(|w| {
                        bases
                            .words()
                            .iter()
                            .enumerate()
                            .filter(|(_, b)| is_insertion_of(w, b, *letter))
                            .map(|(i, _)| i)
                            .collect()
                    })
                    .collect();
                Ok(distinct_assignment(&options))
            }
            Proof::Mixer(pools) => {
                if pools.len() < words.len() {
                    return Err(ProofError::MixerArity {
                        needed: words.len(),
                        have: pools.len(),
                    });
                }
                let options: Vec<Vec<usize>> = words
                    .iter()
                    .map(|w| {
                        pools
                            .iter()
                            .enumerate()
                            .filter(|(_, p)| p.contains(w))
                            .map(|(i, _)| i)
                            .collect()
                    })
                    .collect();
                Ok(distinct_assignment(&options))
            }
        }
    }

    pub fn admits(&self, word: &WordToken) -> bool {
        match self {
            Proof::Membership(pool) => pool.contains(word),
            Proof::Prefix(p) => !p.is_empty() && word.len() > p.chars().count() && word.starts_with(p),
            Proof::Suffix(p) => !p.is_empty() && word.len() > p.chars().count() && word.ends_with(p),
            Proof::Contains(p) => !p.is_empty() && word.len() > p.chars().count() && word.contains(p),
            Proof::Pairs(table) => table.contains(word),
            Proof::LetterInsert { letter, bases } => {
                bases.words().iter().any(|b| is_insertion_of(word, b, *letter))
            }
            Proof::LetterSwap { base } => substitution_distance(word, base) == Some(1),
            Proof::Mixer(pools) => pools.iter().any(|p| p.contains(word)),
        }
    }
}

fn two_complete_pairs(table: &PairTable, words: &[WordToken]) -> bool {
    let present: HashSet<&WordToken> = words.iter().collect();
    let complete: Vec<&(WordToken, WordToken)> = table
        .pairs()
        .iter()
        .filter(|(a, b)| present.contains(a) && present.contains(b))
        .collect();
    if complete.len() != 2 || words.len() != 4 {
        return false;
    }
    if table.relation() == PairRelation::Anagram && !complete.iter().all(|(a, b)| same_letters(a, b)) {
        return false;
    }
    words
        .iter()
        .all(|w| complete.iter().any(|(a, b)| a == w || b == w))
}

fn same_letters(a: &WordToken, b: &WordToken) -> bool {
    let mut x: Vec<char> = a.as_str().chars().collect();
    let mut y: Vec<char> = b.as_str().chars().collect();
    x.sort_unstable();
    y.sort_unstable();
    x == y
}

fn is_insertion_of(word: &WordToken, base: &WordToken, letter: char) -> bool {
    let chars: Vec<char> = word.as_str().chars().collect();
    if chars.len() != base.len() + 1 {
        return false;
    }
    chars.iter().enumerate().any(|(i, c)| {
        *c == letter && {
            let removed: String = chars[..i].iter().chain(&chars[i + 1..]).collect();
            removed == base.as_str()
        }
    })
}

/// Hamming distance, or `None` for different lengths.
fn substitution_distance(a: &WordToken, b: &WordToken) -> Option<usize> {
    if a.len() != b.len() {
        return None;
    }
    Some(a.as_str().chars().zip(b.as_str().chars()).filter(|(x, y)| x != y).count())
}

/// True when every slot can take a different option.
pub(crate) fn distinct_assignment(options: &[Vec<usize>]) -> bool {
    fn place(i: usize, options: &[Vec<usize>], used: &mut Vec<usize>) -> bool {
        if i == options.len() {
            return true;
        }
        for &o in &options[i] {
            if used.contains(&o) {
                continue;
            }
            used.push(o);
            if place(i + 1, options, used) {
                return true;
            }
            used.pop();
        }
        false
    }
    place(0, options, &mut Vec::with_capacity(options.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::parse_all;

    fn words(raw: &[&str]) -> Vec<WordToken> {
        parse_all(raw.iter().copied())
    }

    fn homophones() -> Arc<PairTable> {
        Arc::new(PairTable::new(
            "HOMOPHONE PAIRS",
            PairRelation::Homophone,
            &[("WEEK", "WEAK"), ("PAIR", "PEAR"), ("SEA", "SEE")],
        ))
    }

    #[test]
    fn pairs_need_exactly_two_complete_pairs() {
        let proof = Proof::Pairs(homophones());
        assert_eq!(proof.check(&words(&["WEEK", "WEAK", "PAIR", "PEAR"])), Ok(true));
        assert_eq!(proof.check(&words(&["WEEK", "PAIR", "SEA", "WEAK"])), Ok(false));
        assert_eq!(proof.check(&words(&["WEEK", "PEAR", "SEA", "SEE"])), Ok(false));
        assert_eq!(proof.check(&words(&["WEEK", "WEAK", "PAIR", "BOOK"])), Ok(false));
    }

    #[test]
    fn letter_insert_requires_distinct_bases() {
        let bases = Arc::new(Pool::new("body", "BODY PARTS", "body", &["TOE", "HEEL", "KNEE", "PALM"]));
        let proof = Proof::LetterInsert { letter: 'X', bases };
        assert_eq!(proof.check(&words(&["TXOE", "HEXEL", "KNEXE", "PAXLM"])), Ok(true));
        assert_eq!(proof.check(&words(&["TXOE", "TOXE", "KNEXE", "PAXLM"])), Ok(false));
        assert_eq!(proof.check(&words(&["TYOE", "HEXEL", "KNEXE", "PAXLM"])), Ok(false));
    }

    #[test]
    fn letter_swap_is_exactly_one_substitution() {
        let proof = Proof::LetterSwap { base: WordToken::parse("BOOK").unwrap() };
        assert_eq!(proof.check(&words(&["LOOK", "COOK", "BOOT", "BOOM"])), Ok(true));
        assert_eq!(proof.check(&words(&["LOOK", "BOOK", "BOOT", "BOOM"])), Ok(false));
        assert_eq!(proof.check(&words(&["LOOK", "LOOT", "BOOT", "BOOM"])), Ok(false));
    }

    #[test]
    fn affix_rules_reject_bare_pattern_and_empty_pattern() {
        let proof = Proof::Prefix("MEGA".into());
        assert!(proof.admits(&WordToken::parse("MEGATON").unwrap()));
        assert!(!proof.admits(&WordToken::parse("MEGA").unwrap()));
        assert_eq!(Proof::Suffix(String::new()).check(&words(&["AB"])), Err(ProofError::EmptyPattern));
    }

    #[test]
    fn mixer_needs_one_word_per_pool() {
        let a = Arc::new(Pool::new("a", "A", "a", &["AA", "AB"]));
        let b = Arc::new(Pool::new("b", "B", "b", &["BA", "BB"]));
        let proof = Proof::Mixer(vec![a.clone(), b.clone()]);
        assert_eq!(proof.check(&words(&["AA", "BB"])), Ok(true));
        assert_eq!(proof.check(&words(&["AA", "AB"])), Ok(false));
        assert!(matches!(
            Proof::Mixer(vec![a]).check(&words(&["AA", "BB"])),
            Err(ProofError::MixerArity { .. })
        ));
    }
}
