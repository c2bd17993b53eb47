//! Category factories. Each one is a stateless recipe that turns registry
//! pools (and optionally the bonus pool) into at most one candidate group.
//! Running out of words is never an error: the factory just yields `None`.

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

use crate::candidate::{CandidateGroup, Family};
use crate::proof::Proof;
use crate::token::WordToken;
use crate::vocab::{PairTable, Pool, Vocabulary};

pub type FactoryResult = Option<CandidateGroup>;

/// Internal redraws a factory may take before giving up.
const MAX_INTERNAL_ATTEMPTS: usize = 4;
/// Themed pools smaller than this make for guessable groups.
const MIN_THEME_POOL: usize = 8;
const MIN_FRESH_POOL: usize = 10;
const GROUP_SIZE: usize = 4;

#[derive(Debug, Clone)]
pub enum Factory {
    Theme(Arc<Pool>),
    Fresh,
    Pairs(Arc<PairTable>),
    StartsWith,
    EndsWith,
    LetterInsert,
    LetterSwap,
    Mixer,
    Hidden,
    MorphemeMash,
    Curated,
}

impl Factory {
    pub fn name(&self) -> String {
        match self {
            Factory::Theme(pool) => format!("theme:{}", pool.key()),
            Factory::Fresh => "fresh".into(),
            Factory::Pairs(table) => format!("pairs:{}", table.label()),
            Factory::StartsWith => "starts-with".into(),
            Factory::EndsWith => "ends-with".into(),
            Factory::LetterInsert => "letter-insert".into(),
            Factory::LetterSwap => "letter-swap".into(),
            Factory::Mixer => "mixer".into(),
            Factory::Hidden => "hidden".into(),
            Factory::MorphemeMash => "morpheme-mash".into(),
            Factory::Curated => "curated".into(),
        }
    }

    pub fn build<R: Rng + ?Sized>(
        &self,
        vocab: &Vocabulary,
        bonus: Option<&Arc<Pool>>,
        rng: &mut R,
    ) -> FactoryResult {
        match self {
            Factory::Theme(pool) => from_pool(pool, pool.label(), MIN_THEME_POOL, rng),
            Factory::Fresh => {
                let pool = bonus?;
                from_pool(pool, &format!("FRESH PULLS: {}", pool.label()), MIN_FRESH_POOL, rng)
            }
            Factory::Pairs(table) => pairs(table, rng),
            Factory::StartsWith => retry(rng, |rng| starts_with(vocab, rng)),
            Factory::EndsWith => retry(rng, |rng| ends_with(vocab, rng)),
            Factory::LetterInsert => retry(rng, |rng| letter_insert(vocab, rng)),
            Factory::LetterSwap => letter_swap(vocab, rng),
            Factory::Mixer => retry(rng, |rng| mixer(vocab, rng)),
            Factory::Hidden => retry(rng, |rng| hidden(vocab, bonus, rng)),
            Factory::MorphemeMash => retry(rng, |rng| morpheme_mash(vocab, rng)),
            Factory::Curated => curated(vocab, rng),
        }
    }
}

fn retry<R: Rng + ?Sized>(rng: &mut R, mut attempt: impl FnMut(&mut R) -> FactoryResult) -> FactoryResult {
    (0..MAX_INTERNAL_ATTEMPTS).find_map(|_| attempt(rng))
}

fn from_pool<R: Rng + ?Sized>(pool: &Arc<Pool>, label: &str, min: usize, rng: &mut R) -> FactoryResult {
    if pool.size() < min {
        return None;
    }
    let words = pool.sample(GROUP_SIZE, &HashSet::new(), rng);
    if words.len() < GROUP_SIZE {
        return None;
    }
    Some(
        CandidateGroup::new(label, pool.domain(), Family::PoolMembership, words, Some(Proof::Membership(pool.clone())))
            .with_spares(pool.words().to_vec()),
    )
}

fn pairs<R: Rng + ?Sized>(table: &Arc<PairTable>, rng: &mut R) -> FactoryResult {
    if table.size() < GROUP_SIZE {
        return None;
    }
    let chosen = table.sample(2, &HashSet::new(), rng);
    if chosen.len() < 2 {
        return None;
    }
    let mut words: Vec<WordToken> = chosen.into_iter().flat_map(|(a, b)| [a, b]).collect();
    words.shuffle(rng);
    Some(CandidateGroup::new(
        table.label(),
        "wordplay",
        Family::PairedRelation,
        words,
        Some(Proof::Pairs(table.clone())),
    ))
}

/// Glues `head` onto each stem, dropping combinations that are not tile-safe.
fn compose<'a>(stems: impl Iterator<Item = &'a WordToken>, head: &str, tail: &str) -> Vec<WordToken> {
    stems
        .filter_map(|s| WordToken::parse(&format!("{head}{s}{tail}")).ok())
        .collect()
}

fn affix_group<R: Rng + ?Sized>(
    mut combos: Vec<WordToken>,
    label: String,
    proof: Proof,
    family: Family,
    rng: &mut R,
) -> FactoryResult {
    if combos.len() < GROUP_SIZE {
        return None;
    }
    combos.shuffle(rng);
    let spares = combos.split_off(GROUP_SIZE);
    Some(CandidateGroup::new(label, "wordplay", family, combos, Some(proof)).with_spares(spares))
}

fn starts_with<R: Rng + ?Sized>(vocab: &Vocabulary, rng: &mut R) -> FactoryResult {
    let prefix = vocab.prefixes.choose(rng)?;
    let stems = vocab.prefix_stems.iter().filter(|s| *s != prefix);
    let combos = compose(stems, prefix.as_str(), "");
    affix_group(
        combos,
        format!("WORDS THAT START WITH \"{prefix}\""),
        Proof::Prefix(prefix.to_string()),
        Family::SharedAffix,
        rng,
    )
}

fn ends_with<R: Rng + ?Sized>(vocab: &Vocabulary, rng: &mut R) -> FactoryResult {
    let suffix = vocab.suffixes.choose(rng)?;
    let stems = vocab.suffix_stems.iter().filter(|s| *s != suffix);
    let combos = compose(stems, "", suffix.as_str());
    affix_group(
        combos,
        format!("WORDS THAT END WITH \"{suffix}\""),
        Proof::Suffix(suffix.to_string()),
        Family::SharedAffix,
        rng,
    )
}

fn letter_insert<R: Rng + ?Sized>(vocab: &Vocabulary, rng: &mut R) -> FactoryResult {
    let bases = vocab.body_parts.sample(GROUP_SIZE, &HashSet::new(), rng);
    if bases.len() < GROUP_SIZE {
        return None;
    }
    let letter = rng.gen_range(b'A'..=b'Z') as char;
    let words: Vec<WordToken> = bases
        .iter()
        .filter_map(|base| {
            let chars: Vec<char> = base.as_str().chars().collect();
            // interior positions only, so the base stays recognisable
            let pos = if chars.len() > 1 { rng.gen_range(1..chars.len()) } else { 1 };
            let spliced: String = chars[..pos].iter().chain(std::iter::once(&letter)).chain(&chars[pos..]).collect();
            WordToken::parse(&spliced).ok()
        })
        .collect();
    let proof = Proof::LetterInsert {
        letter,
        bases: vocab.body_parts.clone(),
    };
    let distinct: HashSet<&WordToken> = words.iter().collect();
    if words.len() < GROUP_SIZE || distinct.len() < GROUP_SIZE || proof.check(&words) != Ok(true) {
        return None;
    }
    Some(CandidateGroup::new(
        format!("ADD \"{letter}\" SOMEWHERE IN A BODY PART"),
        "wordplay",
        Family::LetterEdit,
        words,
        Some(proof),
    ))
}

fn letter_swap<R: Rng + ?Sized>(vocab: &Vocabulary, rng: &mut R) -> FactoryResult {
    let ladders: Vec<_> = vocab.ladders.iter().filter(|l| l.neighbors.len() >= GROUP_SIZE).collect();
    let ladder = ladders.choose(rng)?;
    let mut neighbors = ladder.neighbors.clone();
    neighbors.shuffle(rng);
    let spares = neighbors.split_off(GROUP_SIZE);
    Some(
        CandidateGroup::new(
            format!("ONE LETTER CHANGED FROM \"{}\"", ladder.base),
            "wordplay",
            Family::LetterEdit,
            neighbors,
            Some(Proof::LetterSwap { base: ladder.base.clone() }),
        )
        .with_spares(spares),
    )
}

fn mixer<R: Rng + ?Sized>(vocab: &Vocabulary, rng: &mut R) -> FactoryResult {
    let mut pools: Vec<Arc<Pool>> = vocab.themes.choose_multiple(rng, GROUP_SIZE).cloned().collect();
    if pools.len() < GROUP_SIZE {
        return None;
    }
    pools.sort_by(|a, b| a.key().cmp(b.key()));
    let mut taken = HashSet::new();
    let mut words = Vec::with_capacity(GROUP_SIZE);
    for pool in &pools {
        let word = pool.sample(1, &taken, rng).pop()?;
        taken.insert(word.clone());
        words.push(word);
    }
    words.shuffle(rng);
    let names: Vec<String> = pools.iter().map(|p| p.key().replace('_', " ").to_uppercase()).collect();
    Some(CandidateGroup::new(
        format!("ONE EACH FROM {}", names.join(" / ")),
        "mixer",
        Family::Mixer,
        words,
        Some(Proof::Mixer(pools)),
    ))
}

fn hidden<R: Rng + ?Sized>(vocab: &Vocabulary, bonus: Option<&Arc<Pool>>, rng: &mut R) -> FactoryResult {
    let needle = vocab.needles.choose(rng)?;
    let proof = Proof::Contains(needle.clone());
    let extra = bonus.map(|p| p.words()).unwrap_or(&[]);
    let mut seen = HashSet::new();
    let matches: Vec<WordToken> = vocab
        .lexicon
        .iter()
        .chain(extra)
        .filter(|w| proof.admits(w) && seen.insert((*w).clone()))
        .cloned()
        .collect();
    affix_group(matches, format!("HIDDEN \"{needle}\""), proof, Family::Template, rng)
}

fn morpheme_mash<R: Rng + ?Sized>(vocab: &Vocabulary, rng: &mut R) -> FactoryResult {
    let picked: Vec<&WordToken> = vocab.prefixes.choose_multiple(rng, 2).collect();
    let (a, b) = match picked.as_slice() {
        [a, b] => (*a, *b),
        _ => return None,
    };
    let head: String = b.as_str().chars().take(2).collect();
    let core = format!("{a}{head}");
    let combos = compose(vocab.mash_tails.iter(), &core, "");
    affix_group(
        combos,
        format!("MORPHEME MASHUPS (BUILT FROM \"{a}\" + \"{b}\")"),
        Proof::Contains(core),
        Family::Template,
        rng,
    )
}

fn curated<R: Rng + ?Sized>(vocab: &Vocabulary, rng: &mut R) -> FactoryResult {
    let set = vocab.curated.iter().filter(|c| c.words.len() >= GROUP_SIZE).choose(rng)?;
    let mut words = set.words.clone();
    words.shuffle(rng);
    let spares = words.split_off(GROUP_SIZE);
    // no mechanical rule exists for these, so no proof is attached
    Some(CandidateGroup::new(set.label.clone(), "trivia", Family::Curated, words, None).with_spares(spares))
}

#[derive(Debug, Clone)]
pub struct WeightedFactory {
    pub factory: Factory,
    pub weight: u32,
}

/// The factories a generator draws from, with relative draw weights.
#[derive(Debug, Clone)]
pub struct FactorySet {
    entries: Vec<WeightedFactory>,
    index: Option<WeightedIndex<u32>>,
}

impl FactorySet {
    pub fn new(entries: Vec<WeightedFactory>) -> Self {
        let index = WeightedIndex::new(entries.iter().map(|e| e.weight)).ok();
        FactorySet { entries, index }
    }

    /// No factories at all; every draw fails. Generation then falls back.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn standard(vocab: &Vocabulary) -> Self {
        let mut entries: Vec<WeightedFactory> = vocab
            .themes
            .iter()
            .map(|p| WeightedFactory {
                factory: Factory::Theme(p.clone()),
                weight: 3,
            })
            .collect();
        entries.extend(vocab.pair_tables.iter().map(|t| WeightedFactory {
            factory: Factory::Pairs(t.clone()),
            weight: 3,
        }));
        let procedural = [
            (Factory::Fresh, 4),
            (Factory::StartsWith, 4),
            (Factory::EndsWith, 4),
            (Factory::LetterInsert, 3),
            (Factory::LetterSwap, 3),
            (Factory::Mixer, 3),
            (Factory::Hidden, 3),
            (Factory::MorphemeMash, 2),
            (Factory::Curated, 2),
        ];
        entries.extend(
            procedural
                .into_iter()
                .map(|(factory, weight)| WeightedFactory { factory, weight }),
        );
        Self::new(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Factory> {
        let index = self.index.as_ref()?;
        self.entries.get(index.sample(rng)).map(|e| &e.factory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    fn run(factory: &Factory, bonus: Option<&Arc<Pool>>, seed: u64) -> Vec<CandidateGroup> {
        let vocab = Vocabulary::standard();
        let mut rng = StdRng::seed_from_u64(seed);
        (0..200).filter_map(|_| factory.build(&vocab, bonus, &mut rng)).collect()
    }

    fn assert_proven(groups: &[CandidateGroup]) {
        assert!(!groups.is_empty());
        for g in groups {
            assert_eq!(g.words().len(), 4, "{}", g.label());
            if let Some(proof) = g.proof() {
                assert_eq!(proof.check(g.words()), Ok(true), "{} {:?}", g.label(), g.words());
            }
        }
    }

    #[test]
    fn every_standard_factory_builds_proven_groups() {
        let vocab = Vocabulary::standard();
        let bonus = Arc::new(Pool::new(
            "fresh",
            "MUSIC",
            "fresh",
            &["GUITAR", "DRUMS", "BASS", "PIANO", "VIOLIN", "CELLO", "FLUTE", "HARP", "TUBA", "OBOE"],
        ));
        for entry in &FactorySet::standard(&vocab).entries {
            let groups = run(&entry.factory, Some(&bonus), 11);
            assert_proven(&groups);
        }
    }

    #[test]
    fn paired_groups_are_exactly_two_whole_pairs() {
        let vocab = Vocabulary::standard();
        for table in &vocab.pair_tables {
            for g in run(&Factory::Pairs(table.clone()), None, 3) {
                let whole = table
                    .pairs()
                    .iter()
                    .filter(|(a, b)| g.words().contains(a) && g.words().contains(b))
                    .count();
                assert_eq!(whole, 2);
            }
        }
    }

    #[test]
    fn short_pools_yield_nothing() {
        let tiny = Arc::new(Pool::new("tiny", "TINY", "tiny", &["AA", "BB", "CC", "DD", "EE"]));
        assert!(run(&Factory::Theme(tiny.clone()), None, 1).is_empty());
        assert!(run(&Factory::Fresh, Some(&tiny), 1).is_empty());
        assert!(run(&Factory::Fresh, None, 1).is_empty());
    }

    #[test]
    fn curated_groups_carry_no_proof() {
        for g in run(&Factory::Curated, None, 5) {
            assert!(!g.is_verifiable());
        }
    }

    #[test]
    fn empty_set_never_draws() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(FactorySet::empty().draw(&mut rng).is_none());
    }
}
