//! Bulk properties of generated puzzles across every difficulty level.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use connected_engine::overlap::{max_shared, solution_count};
use connected_engine::{
    audit, fallback_groups, validate, DifficultyConfig, Engine, Factory, FactorySet, Family, GeneratorSettings, Puzzle,
    PuzzleRequest, PuzzleResponse, RecencySet, Selector, Vocabulary, WordToken,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn selector() -> Selector {
    let vocab = Arc::new(Vocabulary::standard());
    let factories = FactorySet::standard(&vocab);
    Selector::new(vocab, factories, GeneratorSettings::default())
}

// ============================================================================
// Structure, proofs and overlap over 1000 puzzles
// ============================================================================

#[test]
fn thousand_puzzles_hold_every_invariant() {
    let selector = selector();
    let mut rng = StdRng::seed_from_u64(2024);
    let empty = RecencySet::new();

    for level in 1..=5i64 {
        let config = DifficultyConfig::for_level(level);
        for round in 0..200 {
            let assembly = selector.assemble(&config, &empty, None, &mut rng);
            let groups = &assembly.groups;
            assert_eq!(groups.len(), 4, "level {level} round {round}");

            for g in groups {
                assert_eq!(g.words().len(), 4);
                assert!(validate(g).is_accept(), "{} no longer validates", g.label());
                if let Some(proof) = g.proof() {
                    assert_eq!(proof.check(g.words()), Ok(true), "{} fails its own rule", g.label());
                }
            }

            let words: HashSet<&WordToken> = groups.iter().flat_map(|g| g.words()).collect();
            assert_eq!(words.len(), 16, "level {level} round {round} repeats a tile");
            assert!(
                max_shared(groups) <= config.max_overlap_words,
                "level {level} round {round} exceeds its overlap budget"
            );
            assert_eq!(solution_count(groups, 2), 1, "level {level} round {round} is ambiguous");

            let puzzle = Puzzle::from_groups(assembly.groups, &mut rng);
            let response = PuzzleResponse::new(&puzzle, &config, assembly.fallback);
            assert_eq!(audit(&response), Ok(()));
            assert_eq!(response.difficulty as i64, level);
        }
    }
}

#[test]
fn easiest_level_never_overlaps() {
    let engine = Engine::default();
    let selector = selector();
    let config = DifficultyConfig::for_level(1);
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..50 {
        let assembly = selector.assemble(&config, &RecencySet::new(), None, &mut rng);
        assert_eq!(max_shared(&assembly.groups), 0);
    }

    let response = engine.generate_offline(&PuzzleRequest::new(1), None, &mut rng);
    assert_eq!(response.difficulty, 1);
    assert_eq!(audit(&response), Ok(()));
}

#[test]
fn decoy_rate_follows_the_overlap_probability() {
    let selector = selector();
    let mut rng = StdRng::seed_from_u64(55);
    let rounds = 200;
    let mut rates = Vec::new();
    for level in 1..=5i64 {
        let config = DifficultyConfig::for_level(level);
        let heated = (0..rounds)
            .map(|_| selector.assemble(&config, &RecencySet::new(), None, &mut rng))
            .filter(|a| max_shared(&a.groups) > 0)
            .count();
        let rate = heated as f64 / rounds as f64;
        assert!(
            rate <= config.overlap_probability + 0.1,
            "level {level} carried decoys in {heated}/{rounds} puzzles"
        );
        rates.push(rate);
    }
    assert_eq!(rates[0], 0.0);
    assert_eq!(rates[1], 0.0);
    assert!(rates[4] >= 0.3, "level 5 decoy rate {}", rates[4]);
    assert!(rates[4] > rates[2], "decoys do not grow with level: {rates:?}");
}

// ============================================================================
// Variety at easy levels
// ============================================================================

#[test]
fn easy_levels_vary_their_categories() {
    let engine = Engine::default();
    let mut rng = StdRng::seed_from_u64(12);
    for level in [1, 2] {
        let mut sets: HashMap<Vec<String>, usize> = HashMap::new();
        let mut labels = HashSet::new();
        for _ in 0..200 {
            let response = engine.generate_offline(&PuzzleRequest::new(level), None, &mut rng);
            let mut set: Vec<String> = response.groups.iter().map(|g| g.category.clone()).collect();
            set.sort();
            labels.extend(set.iter().cloned());
            *sets.entry(set).or_insert(0) += 1;
        }
        assert!(labels.len() > 20, "level {level} used only {} labels", labels.len());
        let busiest = sets.values().copied().max().unwrap_or(0);
        assert!(busiest <= 20, "level {level} served one category set {busiest}/200 times");
    }
}

#[test]
fn easy_levels_still_see_some_wordplay() {
    let selector = selector();
    let config = DifficultyConfig::for_level(1);
    let mut rng = StdRng::seed_from_u64(13);
    let mut families: HashMap<Family, usize> = HashMap::new();
    for _ in 0..100 {
        let assembly = selector.assemble(&config, &RecencySet::new(), None, &mut rng);
        for g in &assembly.groups {
            *families.entry(g.family()).or_insert(0) += 1;
        }
    }
    let themed = families.get(&Family::PoolMembership).copied().unwrap_or(0);
    assert!(themed > 160, "{families:?}");
    assert!(themed < 380, "{families:?}");
}

// ============================================================================
// Fallback
// ============================================================================

#[test]
fn forced_factory_failure_serves_a_valid_fallback() {
    let vocab = Arc::new(Vocabulary::standard());
    let engine = Engine::with_factories(vocab, FactorySet::empty(), GeneratorSettings::default());
    let mut rng = StdRng::seed_from_u64(3);
    for level in 1..=5 {
        let response = engine.generate_offline(&PuzzleRequest::new(level), None, &mut rng);
        assert!(response.fallback);
        assert_eq!(audit(&response), Ok(()));
        let tiles: HashSet<&str> = response.tiles.iter().map(|t| t.word.as_str()).collect();
        assert_eq!(tiles.len(), 16);
    }
    for g in fallback_groups() {
        assert!(validate(&g).is_accept());
    }
}

// ============================================================================
// Paired relations
// ============================================================================

#[test]
fn paired_groups_are_exactly_two_whole_pairs() {
    let vocab = Vocabulary::standard();
    let mut rng = StdRng::seed_from_u64(17);
    for table in &vocab.pair_tables {
        let factory = Factory::Pairs(table.clone());
        for _ in 0..200 {
            let group = factory.build(&vocab, None, &mut rng).expect("pair tables hold more than two pairs");
            let present: HashSet<&WordToken> = group.words().iter().collect();
            let whole = table
                .pairs()
                .iter()
                .filter(|(a, b)| present.contains(a) && present.contains(b))
                .count();
            let touched = table
                .pairs()
                .iter()
                .filter(|(a, b)| present.contains(a) || present.contains(b))
                .count();
            assert_eq!(whole, 2, "{:?}", group.words());
            assert_eq!(touched, 2, "{:?}", group.words());
        }
    }
}
