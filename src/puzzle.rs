use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::candidate::{CandidateGroup, Family};
use crate::proof::Proof;
use crate::token::{parse_all, WordToken};
use crate::vocab::{PairRelation, PairTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Color {
    Yellow,
    Green,
    Blue,
    Purple,
}

pub const PALETTE: [Color; 4] = [Color::Yellow, Color::Green, Color::Blue, Color::Purple];

#[derive(Debug, Clone)]
pub struct SolvedGroup {
    pub color: Color,
    pub group: CandidateGroup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub word: WordToken,
    pub group_index: usize,
}

#[derive(Debug, Clone)]
pub struct Puzzle {
    pub groups: Vec<SolvedGroup>,
    pub tiles: Vec<Tile>,
}

impl Puzzle {
    /// Shuffles group order, deals the palette as a derangement of that
    /// order, and deals the 16 tiles in an independent random order.
    pub fn from_groups<R: Rng + ?Sized>(mut groups: Vec<CandidateGroup>, rng: &mut R) -> Self {
        groups.shuffle(rng);
        let colors = derangement(&PALETTE, rng);
        let groups: Vec<SolvedGroup> = groups
            .into_iter()
            .zip(colors)
            .map(|(group, color)| SolvedGroup { color, group })
            .collect();

        let mut tiles: Vec<Tile> = groups
            .iter()
            .enumerate()
            .flat_map(|(i, g)| {
                g.group.words().iter().map(move |w| Tile {
                    word: w.clone(),
                    group_index: i,
                })
            })
            .collect();
        tiles.shuffle(rng);
        Puzzle { groups, tiles }
    }

    /// Group keys, label keys, then every word.
    pub fn seen_tokens(&self) -> Vec<String> {
        let keys = self.groups.iter().map(|g| g.group.key().to_string());
        let labels = self.groups.iter().map(|g| g.group.label_key().to_string());
        let words = self
            .groups
            .iter()
            .flat_map(|g| g.group.words().iter().map(|w| w.to_string()));
        keys.chain(labels).chain(words).collect()
    }
}

/// Sattolo's shuffle: a uniformly random cyclic permutation, so no colour
/// keeps its palette slot.
fn derangement<T: Copy, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    for i in (1..out.len()).rev() {
        let j = rng.gen_range(0..i);
        out.swap(i, j);
    }
    out
}

/// The static puzzle served when assembly runs out of attempts. Every group
/// carries a real rule so the same validator that screens candidates can
/// screen this too.
pub fn fallback_groups() -> Vec<CandidateGroup> {
    let homophones = Arc::new(PairTable::new(
        "HOMOPHONE PAIRS",
        PairRelation::Homophone,
        &[("KNIGHT", "NIGHT"), ("PAIR", "PEAR")],
    ));
    vec![
        CandidateGroup::new(
            "WORDS THAT START WITH \"SUN\"",
            "wordplay",
            Family::SharedAffix,
            parse_all(["SUNDAY", "SUNSET", "SUNBURN", "SUNFLOWER"]),
            Some(Proof::Prefix("SUN".to_string())),
        ),
        CandidateGroup::new(
            "WORDS THAT END WITH \"FISH\"",
            "wordplay",
            Family::SharedAffix,
            parse_all(["CATFISH", "SWORDFISH", "GOLDFISH", "STARFISH"]),
            Some(Proof::Suffix("FISH".to_string())),
        ),
        CandidateGroup::new(
            "HOMOPHONE PAIRS",
            "linguistics",
            Family::PairedRelation,
            parse_all(["KNIGHT", "NIGHT", "PAIR", "PEAR"]),
            Some(Proof::Pairs(homophones)),
        ),
        CandidateGroup::new(
            "HIDDEN \"ART\"",
            "wordplay",
            Family::Template,
            parse_all(["HEART", "PARTY", "CARTON", "MARTIAN"]),
            Some(Proof::Contains("ART".to_string())),
        ),
    ]
}
