//! Structural and proof checks for candidate groups. Rejections are routine;
//! the reason tag exists for tallies in the logs and nothing else.

use std::collections::HashSet;

use crate::candidate::CandidateGroup;
use crate::token::WordToken;

pub const MIN_LABEL_LEN: usize = 4;
const GROUP_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    LabelTooShort,
    MissingDomain,
    WrongWordCount,
    MalformedWord,
    DuplicateWord,
    ProofFailed,
    ProofError,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::LabelTooShort => "label-too-short",
            RejectReason::MissingDomain => "missing-domain",
            RejectReason::WrongWordCount => "wrong-word-count",
            RejectReason::MalformedWord => "malformed-word",
            RejectReason::DuplicateWord => "duplicate-word",
            RejectReason::ProofFailed => "proof-failed",
            RejectReason::ProofError => "proof-error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(RejectReason),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

pub fn validate(group: &CandidateGroup) -> Verdict {
    match check(group) {
        Ok(()) => Verdict::Accept,
        Err(reason) => Verdict::Reject(reason),
    }
}

fn check(group: &CandidateGroup) -> Result<(), RejectReason> {
    if group.label().trim().chars().count() < MIN_LABEL_LEN {
        return Err(RejectReason::LabelTooShort);
    }
    if group.domain().trim().is_empty() {
        return Err(RejectReason::MissingDomain);
    }
    let words = group.words();
    if words.len() != GROUP_SIZE {
        return Err(RejectReason::WrongWordCount);
    }
    // tokens are normalized on construction; re-deriving guards against a
    // factory that built one from unnormalized text
    let normalized: Vec<WordToken> = words
        .iter()
        .map(|w| WordToken::parse(w.as_str()).map_err(|_| RejectReason::MalformedWord))
        .collect::<Result<_, _>>()?;
    if normalized.iter().zip(words).any(|(n, w)| n != w) {
        return Err(RejectReason::MalformedWord);
    }
    let distinct: HashSet<&WordToken> = normalized.iter().collect();
    if distinct.len() != GROUP_SIZE {
        return Err(RejectReason::DuplicateWord);
    }
    if let Some(proof) = group.proof() {
        match proof.check(&normalized) {
            Ok(true) => {}
            Ok(false) => return Err(RejectReason::ProofFailed),
            Err(_) => return Err(RejectReason::ProofError),
        }
    }
    Ok(())
}
