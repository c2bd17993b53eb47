use sha2::{Digest, Sha256};

use crate::proof::Proof;
use crate::token::WordToken;

/// Which correctness mechanism produced a group. Used for scoring only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    PoolMembership,
    SharedAffix,
    PairedRelation,
    LetterEdit,
    Mixer,
    Template,
    Curated,
}

impl Family {
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::PoolMembership => "pool-membership",
            Family::SharedAffix => "shared-affix",
            Family::PairedRelation => "paired-relation",
            Family::LetterEdit => "letter-edit",
            Family::Mixer => "mixer",
            Family::Template => "template",
            Family::Curated => "curated",
        }
    }
}

/// A generated group of words claiming a category. Immutable once built:
/// a decoy swap produces a new group rather than editing this one.
#[derive(Debug, Clone)]
pub struct CandidateGroup {
    label: String,
    domain: String,
    family: Family,
    words: Vec<WordToken>,
    proof: Option<Proof>,
    spares: Vec<WordToken>,
    key: String,
    label_key: String,
}

impl CandidateGroup {
    pub fn new(
        label: impl Into<String>,
        domain: impl Into<String>,
        family: Family,
        words: Vec<WordToken>,
        proof: Option<Proof>,
    ) -> Self {
        let label = label.into();
        let key = identity_key(&label, &words);
        let label_key = label_key(&label);
        CandidateGroup {
            label,
            domain: domain.into(),
            family,
            words,
            proof,
            spares: Vec::new(),
            key,
            label_key,
        }
    }

    /// Extra words the factory knows satisfy the same rule; the pool decoy
    /// swaps draw from.
    pub fn with_spares(mut self, spares: Vec<WordToken>) -> Self {
        self.spares = spares.into_iter().filter(|s| !self.words.contains(s)).collect();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn words(&self) -> &[WordToken] {
        &self.words
    }

    pub fn proof(&self) -> Option<&Proof> {
        self.proof.as_ref()
    }

    pub fn spares(&self) -> &[WordToken] {
        &self.spares
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label_key(&self) -> &str {
        &self.label_key
    }

    pub fn is_verifiable(&self) -> bool {
        self.proof.is_some()
    }

    /// Whether this group's rule would accept `word`. Unverifiable groups
    /// vouch for their own words and their spares.
    pub fn admits(&self, word: &WordToken) -> bool {
        match &self.proof {
            Some(proof) => proof.admits(word),
            None => self.words.contains(word) || self.spares.contains(word),
        }
    }

    /// A copy with `out` replaced by `replacement`; `out` moves into the
    /// spares. Returns `None` if `out` is not one of the words.
    pub fn swapped(&self, out: &WordToken, replacement: WordToken) -> Option<CandidateGroup> {
        let pos = self.words.iter().position(|w| w == out)?;
        let mut words = self.words.clone();
        words[pos] = replacement.clone();
        let mut spares: Vec<WordToken> = self.spares.iter().filter(|s| **s != replacement).cloned().collect();
        spares.push(out.clone());
        Some(
            CandidateGroup::new(self.label.clone(), self.domain.clone(), self.family, words, self.proof.clone())
                .with_spares(spares),
        )
    }
}

/// Stable fingerprint of a label plus its words, independent of word order.
pub fn identity_key(label: &str, words: &[WordToken]) -> String {
    let mut sorted: Vec<&str> = words.iter().map(WordToken::as_str).collect();
    sorted.sort_unstable();
    let mut hasher = Sha256::new();
    hasher.update(label.trim().to_uppercase().as_bytes());
    hasher.update(b"::");
    hasher.update(sorted.join("|").as_bytes());
    format!("g_{}", &hex::encode(hasher.finalize())[..16])
}

/// Fingerprint of a category label alone, so callers can avoid a repeated
/// category even when its words differ.
pub fn label_key(label: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(label.trim().to_uppercase().as_bytes());
    format!("c_{}", &hex::encode(hasher.finalize())[..16])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::parse_all;
    use proptest::prelude::*;

    #[test]
    fn identity_key_ignores_word_order() {
        let a = parse_all(["RIZZ", "YEET", "MID", "SUS"]);
        let b = parse_all(["SUS", "MID", "RIZZ", "YEET"]);
        assert_eq!(identity_key("INTERNET SLANG", &a), identity_key("INTERNET SLANG", &b));
        assert_ne!(identity_key("INTERNET SLANG", &a), identity_key("GAMING TERMS", &a));
        assert!(identity_key("X", &a).starts_with("g_"));
        assert_eq!(identity_key("X", &a).len(), 18);
    }

    #[test]
    fn swap_builds_a_new_group_and_keeps_the_old_one() {
        let group = CandidateGroup::new(
            "INTERNET SLANG",
            "slang",
            Family::PoolMembership,
            parse_all(["RIZZ", "YEET", "MID", "SUS"]),
            None,
        )
        .with_spares(parse_all(["DRIP", "RIZZ"]));
        assert_eq!(group.spares().len(), 1);

        let out = WordToken::parse("MID").unwrap();
        let swapped = group.swapped(&out, WordToken::parse("DRIP").unwrap()).unwrap();
        assert!(group.words().contains(&out));
        assert!(!swapped.words().contains(&out));
        assert!(swapped.spares().contains(&out));
        assert_ne!(group.key(), swapped.key());
        assert_eq!(group.label_key(), swapped.label_key());
    }

    #[test]
    fn unverifiable_groups_admit_their_spares() {
        let scales = CandidateGroup::new(
            "THINGS WITH SCALES",
            "trivia",
            Family::Curated,
            parse_all(["FISH", "PIANO", "MAP", "SNAKE"]),
            None,
        )
        .with_spares(parse_all(["DRAGON", "THERMOMETER"]));
        assert!(scales.admits(&WordToken::parse("PIANO").unwrap()));
        assert!(scales.admits(&WordToken::parse("DRAGON").unwrap()));
        assert!(!scales.admits(&WordToken::parse("WYVERN").unwrap()));
    }

    proptest! {
        #[test]
        fn identity_key_is_permutation_invariant(
            words in proptest::collection::hash_set("[A-Z]{2,10}", 4),
            label in "[A-Z ]{4,20}",
            rotate in 0usize..4,
        ) {
            let tokens = parse_all(words.iter().map(String::as_str));
            let mut permuted = tokens.clone();
            permuted.rotate_left(rotate);
            permuted.reverse();
            prop_assert_eq!(identity_key(&label, &tokens), identity_key(&label, &permuted));
        }
    }
}
