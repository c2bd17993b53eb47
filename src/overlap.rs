//! Cross-group measurements. Tiles are always distinct, so "shared" words
//! are decoys: words one group owns that another group's rule would also
//! accept.

use std::collections::HashSet;

use crate::candidate::CandidateGroup;
use crate::token::WordToken;

const GROUP_SIZE: usize = 4;

/// Words of `a` ∪ `b` that both rules accept.
pub fn shared_words(a: &CandidateGroup, b: &CandidateGroup) -> usize {
    a.words()
        .iter()
        .chain(b.words())
        .collect::<HashSet<&WordToken>>()
        .into_iter()
        .filter(|w| a.admits(w) && b.admits(w))
        .count()
}

/// Largest pairwise `shared_words` across `groups`.
pub fn max_shared(groups: &[CandidateGroup]) -> usize {
    let mut worst = 0;
    for (i, a) in groups.iter().enumerate() {
        for b in &groups[i + 1..] {
            worst = worst.max(shared_words(a, b));
        }
    }
    worst
}

/// Whether any literal word appears in two groups.
pub fn has_duplicate_words(groups: &[CandidateGroup]) -> bool {
    let mut seen = HashSet::new();
    groups.iter().flat_map(|g| g.words()).any(|w| !seen.insert(w))
}

/// Number of ways (capped at `limit`) to deal the groups' words back into
/// the groups, four apiece, so that every group's rule still proves. A fair
/// puzzle has exactly one.
pub fn solution_count(groups: &[CandidateGroup], limit: usize) -> usize {
    if has_duplicate_words(groups) {
        return 0;
    }
    let words: Vec<&WordToken> = groups.iter().flat_map(|g| g.words()).collect();
    let options: Vec<Vec<usize>> = words
        .iter()
        .map(|w| (0..groups.len()).filter(|&g| groups[g].admits(w)).collect())
        .collect();
    let mut search = Search {
        groups,
        words: &words,
        options: &options,
        buckets: vec![Vec::with_capacity(GROUP_SIZE); groups.len()],
        found: 0,
        limit,
    };
    search.place(0);
    search.found
}

struct Search<'a> {
    groups: &'a [CandidateGroup],
    words: &'a [&'a WordToken],
    options: &'a [Vec<usize>],
    buckets: Vec<Vec<WordToken>>,
    found: usize,
    limit: usize,
}

impl Search<'_> {
    fn place(&mut self, i: usize) {
        if self.found >= self.limit {
            return;
        }
        if i == self.words.len() {
            if self.groups.iter().zip(&self.buckets).all(|(g, b)| proves(g, b)) {
                self.found += 1;
            }
            return;
        }
        for &g in &self.options[i] {
            if self.buckets[g].len() == GROUP_SIZE {
                continue;
            }
            self.buckets[g].push(self.words[i].clone());
            self.place(i + 1);
            self.buckets[g].pop();
        }
    }
}

fn proves(group: &CandidateGroup, words: &[WordToken]) -> bool {
    match group.proof() {
        Some(proof) => proof.check(words).unwrap_or(false),
        None => words.iter().all(|w| group.admits(w)),
    }
}
