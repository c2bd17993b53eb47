//! Candidate generation, recency filtering, greedy assembly, decoy heat and
//! the relaxation ladder. Nothing in here fails: the worst case is the
//! static fallback puzzle.

use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::candidate::{CandidateGroup, Family};
use crate::difficulty::DifficultyConfig;
use crate::factory::FactorySet;
use crate::overlap::{max_shared, shared_words, solution_count};
use crate::puzzle::fallback_groups;
use crate::recency::{RecencyFilter, RecencySet};
use crate::token::WordToken;
use crate::validate::{validate, RejectReason, Verdict};
use crate::vocab::{Pool, Vocabulary};

const GROUPS_PER_PUZZLE: usize = 4;
/// Larger than any key spread, so stale candidates sort after fresh ones.
const STALE_PENALTY: f64 = 1000.0;
/// Domain of pools built from a freshness lookup; they are favoured when present.
const FRESH_DOMAIN: &str = "fresh";
const FRESH_BOOST: f64 = 3.0;

/// Library-side knobs that do not depend on difficulty.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    /// Candidate generation stops early once this many distinct groups exist.
    pub target_pool_size: usize,
    /// Below this, a recency filter is loosened rather than starving assembly.
    pub min_pool_floor: usize,
    pub freshness_timeout: Duration,
    /// Swap trials per puzzle when adding decoy heat.
    pub decoy_attempts: usize,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        GeneratorSettings {
            target_pool_size: 400,
            min_pool_floor: 60,
            freshness_timeout: Duration::from_millis(1500),
            decoy_attempts: 48,
        }
    }
}

/// One rung of the relaxation ladder, loosest last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Relaxation {
    Strict,
    AllowDomainRepeats,
    AllowRecencyRepeats,
    RawPool,
}

impl Relaxation {
    pub const LADDER: [Relaxation; 4] = [
        Relaxation::Strict,
        Relaxation::AllowDomainRepeats,
        Relaxation::AllowRecencyRepeats,
        Relaxation::RawPool,
    ];

    fn recency_filter(self) -> RecencyFilter {
        match self {
            Relaxation::Strict | Relaxation::AllowDomainRepeats => RecencyFilter::Full,
            Relaxation::AllowRecencyRepeats => RecencyFilter::KeysAndLabels,
            Relaxation::RawPool => RecencyFilter::Off,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub relaxation_steps: Vec<Relaxation>,
}

impl RetryPolicy {
    pub fn for_config(config: &DifficultyConfig) -> Self {
        RetryPolicy {
            max_attempts: config.retry_budget,
            relaxation_steps: Relaxation::LADDER.to_vec(),
        }
    }

    /// The rung used by attempt `n` (zero-based); the last rung repeats.
    pub fn step(&self, attempt: usize) -> Relaxation {
        self.relaxation_steps
            .get(attempt)
            .or_else(|| self.relaxation_steps.last())
            .copied()
            .unwrap_or(Relaxation::RawPool)
    }

    pub fn schedule(&self) -> impl Iterator<Item = Relaxation> + '_ {
        (0..self.max_attempts).map(|n| self.step(n))
    }
}

/// Four groups ready to become a puzzle.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub groups: Vec<CandidateGroup>,
    pub fallback: bool,
    pub attempts: usize,
}

/// A candidate that survived recency filtering, possibly only because the
/// filter starved.
#[derive(Debug, Clone, Copy)]
struct Ranked<'c> {
    group: &'c CandidateGroup,
    stale: bool,
}

#[derive(Debug, Clone)]
pub struct Selector {
    vocab: Arc<Vocabulary>,
    factories: FactorySet,
    settings: GeneratorSettings,
}

impl Selector {
    pub fn new(vocab: Arc<Vocabulary>, factories: FactorySet, settings: GeneratorSettings) -> Self {
        Selector { vocab, factories, settings }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    pub fn assemble<R: Rng + ?Sized>(
        &self,
        config: &DifficultyConfig,
        recency: &RecencySet,
        bonus: Option<&Arc<Pool>>,
        rng: &mut R,
    ) -> Assembly {
        let policy = RetryPolicy::for_config(config);
        let heat = config.max_overlap_words > 0 && rng.gen_bool(config.overlap_probability.clamp(0.0, 1.0));
        for (attempt, step) in policy.schedule().enumerate() {
            let candidates = self.generate_candidates(config, bonus, rng);
            let pool = self.filter_recency(&candidates, recency, step.recency_filter());
            match self.pick_four(&pool, config, step, heat, rng) {
                Some(groups) => {
                    let groups = self.add_decoy_heat(groups, config, heat, rng);
                    info!(
                        "assembled level {} puzzle on attempt {} ({:?}): {}",
                        config.level,
                        attempt + 1,
                        step,
                        groups
                            .iter()
                            .map(|g| format!("{} [{}]", g.label(), g.family().as_str()))
                            .collect::<Vec<_>>()
                            .join(" | ")
                    );
                    return Assembly {
                        groups,
                        fallback: false,
                        attempts: attempt + 1,
                    };
                }
                None => debug!(
                    "attempt {} ({:?}) could not assemble from {} of {} candidates",
                    attempt + 1,
                    step,
                    pool.len(),
                    candidates.len()
                ),
            }
        }
        warn!(
            "no level {} puzzle after {} attempts; serving the fallback puzzle",
            config.level, policy.max_attempts
        );
        Assembly {
            groups: fallback_groups(),
            fallback: true,
            attempts: policy.max_attempts,
        }
    }

    /// Draws weighted factories until the volume is spent or the target pool
    /// size is reached; keeps validated, de-duplicated candidates.
    pub fn generate_candidates<R: Rng + ?Sized>(
        &self,
        config: &DifficultyConfig,
        bonus: Option<&Arc<Pool>>,
        rng: &mut R,
    ) -> Vec<CandidateGroup> {
        let mut kept = Vec::new();
        let mut keys = HashSet::new();
        let mut empty_draws: HashMap<String, usize> = HashMap::new();
        let mut rejections: HashMap<RejectReason, usize> = HashMap::new();

        for _ in 0..config.candidate_volume {
            if kept.len() >= self.settings.target_pool_size {
                break;
            }
            let Some(factory) = self.factories.draw(rng) else { break };
            let Some(group) = factory.build(&self.vocab, bonus, rng) else {
                *empty_draws.entry(factory.name()).or_insert(0) += 1;
                continue;
            };
            match validate(&group) {
                Verdict::Accept => {
                    if keys.insert(group.key().to_string()) {
                        kept.push(group);
                    }
                }
                Verdict::Reject(reason) => *rejections.entry(reason).or_insert(0) += 1,
            }
        }

        if !rejections.is_empty() || !empty_draws.is_empty() {
            let rejected: Vec<String> = rejections.iter().map(|(r, n)| format!("{}={n}", r.as_str())).collect();
            let empty: Vec<String> = empty_draws.iter().map(|(f, n)| format!("{f}={n}")).collect();
            debug!(
                "kept {} candidates; empty draws [{}]; rejected [{}]",
                kept.len(),
                empty.join(", "),
                rejected.join(", ")
            );
        }
        kept
    }

    /// Applies `filter`, loosening it one notch at a time while the result
    /// is under the pool floor. When even the loosest notch starves, every
    /// candidate comes back and the ones the record still names are marked
    /// stale so assembly reaches for them last.
    fn filter_recency<'c>(
        &self,
        candidates: &'c [CandidateGroup],
        recency: &RecencySet,
        filter: RecencyFilter,
    ) -> Vec<Ranked<'c>> {
        let fresh_only = |f: RecencyFilter| -> Vec<Ranked<'c>> {
            candidates
                .iter()
                .filter(|g| !recency.excludes(g, f))
                .map(|group| Ranked { group, stale: false })
                .collect()
        };
        if recency.is_empty() || filter == RecencyFilter::Off {
            return fresh_only(RecencyFilter::Off);
        }
        let ladder: &[RecencyFilter] = match filter {
            RecencyFilter::Full => &[RecencyFilter::Full, RecencyFilter::KeysAndLabels],
            _ => &[RecencyFilter::KeysAndLabels],
        };
        for &f in ladder {
            let fresh = fresh_only(f);
            if fresh.len() >= self.settings.min_pool_floor {
                return fresh;
            }
            debug!(
                "recency filter {:?} left {} candidates (floor {}); loosening",
                f,
                fresh.len(),
                self.settings.min_pool_floor
            );
        }
        candidates
            .iter()
            .map(|group| Ranked {
                group,
                stale: recency.excludes(group, RecencyFilter::KeysAndLabels),
            })
            .collect()
    }

    /// Greedy pick over the ranked candidates. Without `heat` no two groups
    /// may share a word; with it the level's overlap budget applies and the
    /// pick reaches for a candidate that can trade a spare with an
    /// already-picked group until one such pair is on the board.
    fn pick_four<R: Rng + ?Sized>(
        &self,
        pool: &[Ranked<'_>],
        config: &DifficultyConfig,
        step: Relaxation,
        heat: bool,
        rng: &mut R,
    ) -> Option<Vec<CandidateGroup>> {
        let rules = PickRules {
            budget: if heat { config.max_overlap_words } else { 0 },
            allow_domain_repeats: config.allow_domain_repeats || step >= Relaxation::AllowDomainRepeats,
        };
        let mut queue = rank(pool, config, rng);

        let mut picked: Vec<CandidateGroup> = Vec::with_capacity(GROUPS_PER_PUZZLE);
        let mut used_words: HashSet<WordToken> = HashSet::new();
        let mut linked = false;
        // queue entries before `next` already failed and only get less likely to fit
        let mut next = 0;
        while picked.len() < GROUPS_PER_PUZZLE {
            if heat && !linked && !picked.is_empty() {
                // a stale candidate is never worth a decoy
                let found = (next..queue.len()).find(|&i| {
                    let r = queue[i];
                    !r.stale && links(&picked, r.group, &used_words) && try_push(&mut picked, r.group, &used_words, rules)
                });
                if let Some(i) = found {
                    let g = queue.remove(i).group;
                    used_words.extend(g.words().iter().cloned());
                    linked = true;
                    continue;
                }
            }
            let Some(i) = (next..queue.len()).find(|&i| try_push(&mut picked, queue[i].group, &used_words, rules)) else {
                break;
            };
            let g = queue[i].group;
            linked = linked || (heat && links(&picked[..picked.len() - 1], g, &used_words));
            used_words.extend(g.words().iter().cloned());
            next = i + 1;
        }

        (picked.len() == GROUPS_PER_PUZZLE).then_some(picked)
    }

    /// Swaps one word of one group for a spare that another group's rule
    /// would also accept. Only runs when the level's heat roll passed.
    fn add_decoy_heat<R: Rng + ?Sized>(
        &self,
        groups: Vec<CandidateGroup>,
        config: &DifficultyConfig,
        heat: bool,
        rng: &mut R,
    ) -> Vec<CandidateGroup> {
        if !heat {
            return groups;
        }
        if max_shared(&groups) > 0 {
            debug!("decoy heat: picked groups already share a word");
            return groups;
        }
        let in_play: HashSet<WordToken> = groups.iter().flat_map(|g| g.words().iter().cloned()).collect();

        let mut order: Vec<usize> = (0..groups.len()).collect();
        order.shuffle(rng);
        let mut trials = 0;
        'search: for gi in order {
            let target = &groups[gi];
            let mut baits: Vec<&WordToken> = target
                .spares()
                .iter()
                .filter(|s| !in_play.contains(*s))
                .filter(|s| groups.iter().enumerate().any(|(j, h)| j != gi && h.admits(s)))
                .collect();
            baits.shuffle(rng);
            for bait in baits {
                let mut outs: Vec<&WordToken> = target.words().iter().collect();
                outs.shuffle(rng);
                for out in outs {
                    if trials >= self.settings.decoy_attempts {
                        break 'search;
                    }
                    trials += 1;
                    let Some(swapped) = target.swapped(out, bait.clone()) else { continue };
                    if !validate(&swapped).is_accept() {
                        continue;
                    }
                    let mut trial = groups.clone();
                    trial[gi] = swapped;
                    if max_shared(&trial) <= config.max_overlap_words && solution_count(&trial, 2) == 1 {
                        let rule = trial[gi].proof().map_or("none", |p| p.kind());
                        debug!("decoy heat: {} ({rule}) now carries {}", trial[gi].label(), bait);
                        return trial;
                    }
                }
            }
        }
        debug!("decoy heat: no swap held after {trials} trials");
        groups
    }
}

#[derive(Debug, Clone, Copy)]
struct PickRules {
    budget: usize,
    allow_domain_repeats: bool,
}

/// Pushes `g` if it fits beside `picked`; leaves `picked` untouched otherwise.
fn try_push(picked: &mut Vec<CandidateGroup>, g: &CandidateGroup, used: &HashSet<WordToken>, rules: PickRules) -> bool {
    if picked.iter().any(|p| p.label_key() == g.label_key()) {
        return false;
    }
    if !rules.allow_domain_repeats && picked.iter().any(|p| p.domain() == g.domain()) {
        return false;
    }
    if g.words().iter().any(|w| used.contains(w)) {
        return false;
    }
    if picked.iter().any(|p| shared_words(p, g) > rules.budget) {
        return false;
    }
    picked.push(g.clone());
    if solution_count(picked, 2) != 1 {
        picked.pop();
        return false;
    }
    true
}

/// Whether `g` and some picked group could trade a spare for a decoy.
fn links(picked: &[CandidateGroup], g: &CandidateGroup, used: &HashSet<WordToken>) -> bool {
    let open = |s: &&WordToken| !used.contains(*s) && !g.words().contains(*s);
    g.spares().iter().filter(open).any(|s| picked.iter().any(|p| p.admits(s)))
        || picked.iter().any(|p| p.spares().iter().filter(open).any(|s| g.admits(s)))
}

/// Relative pull of each family; easy levels lean on plain themed pools.
fn family_weight(family: Family, level: u8) -> f64 {
    let easy = level <= 2;
    match family {
        Family::PoolMembership if easy => 8.0,
        Family::PoolMembership => 3.0,
        Family::SharedAffix | Family::PairedRelation if easy => 1.0,
        Family::SharedAffix | Family::PairedRelation => 2.5,
        Family::LetterEdit | Family::Template if easy => 0.5,
        Family::LetterEdit | Family::Template => 2.0,
        Family::Mixer => 1.0,
        Family::Curated => 0.5,
    }
}

/// Orders candidates for the greedy pick. Each label keeps one random
/// representative (a fresh one when it has any), then labels are shuffled
/// with weights: a family's weight is split evenly over its labels, so a
/// factory that yields many variants of one label gains nothing from it.
fn rank<'c, R: Rng + ?Sized>(pool: &[Ranked<'c>], config: &DifficultyConfig, rng: &mut R) -> Vec<Ranked<'c>> {
    let mut by_label: BTreeMap<&'c str, Vec<Ranked<'c>>> = BTreeMap::new();
    for r in pool {
        by_label.entry(r.group.label_key()).or_default().push(*r);
    }
    let reps: Vec<Ranked<'c>> = by_label
        .into_values()
        .filter_map(|options| {
            let fresh: Vec<Ranked<'c>> = options.iter().filter(|r| !r.stale).copied().collect();
            if fresh.is_empty() {
                options.choose(rng).copied()
            } else {
                fresh.choose(rng).copied()
            }
        })
        .collect();

    let mut per_family: HashMap<Family, usize> = HashMap::new();
    for r in &reps {
        *per_family.entry(r.group.family()).or_insert(0) += 1;
    }
    let mut keyed: Vec<(f64, Ranked<'c>)> = reps
        .into_iter()
        .map(|r| {
            let family = r.group.family();
            let labels = per_family.get(&family).copied().unwrap_or(1).max(1);
            let mut weight = family_weight(family, config.level) / labels as f64;
            if r.group.domain() == FRESH_DOMAIN {
                weight *= FRESH_BOOST;
            }
            // Gumbel keys: sorting by ln(w) + G draws labels without replacement in proportion to w
            let u: f64 = rng.gen_range(f64::EPSILON..1.0);
            let mut key = weight.ln() - (-u.ln()).ln();
            if r.stale {
                key -= STALE_PENALTY;
            }
            (key, r)
        })
        .collect();
    keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
    keyed.into_iter().map(|(_, r)| r).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn selector() -> Selector {
        let vocab = Arc::new(Vocabulary::standard());
        let factories = FactorySet::standard(&vocab);
        Selector::new(vocab, factories, GeneratorSettings::default())
    }

    #[test]
    fn retry_policy_walks_the_ladder_then_repeats_the_last_rung() {
        let policy = RetryPolicy::for_config(&DifficultyConfig::for_level(5));
        let steps: Vec<Relaxation> = policy.schedule().collect();
        assert_eq!(steps.len(), 12);
        assert_eq!(&steps[..4], &Relaxation::LADDER);
        assert!(steps[4..].iter().all(|s| *s == Relaxation::RawPool));
    }

    #[test]
    fn candidates_are_validated_and_unique() {
        let s = selector();
        let mut rng = StdRng::seed_from_u64(42);
        let config = DifficultyConfig::for_level(3);
        let candidates = s.generate_candidates(&config, None, &mut rng);
        assert!(candidates.len() >= s.settings().min_pool_floor);
        let keys: HashSet<&str> = candidates.iter().map(CandidateGroup::key).collect();
        assert_eq!(keys.len(), candidates.len());
        assert!(candidates.iter().all(|g| validate(g).is_accept()));
    }

    #[test]
    fn assembled_groups_respect_the_level_budget() {
        let s = selector();
        for level in 1..=5 {
            let config = DifficultyConfig::for_level(level);
            let mut rng = StdRng::seed_from_u64(level as u64);
            let assembly = s.assemble(&config, &RecencySet::new(), None, &mut rng);
            assert_eq!(assembly.groups.len(), 4);
            assert!(max_shared(&assembly.groups) <= config.max_overlap_words);
            assert_eq!(solution_count(&assembly.groups, 2), 1);
        }
    }

    #[test]
    fn no_factories_means_fallback() {
        let vocab = Arc::new(Vocabulary::standard());
        let s = Selector::new(vocab, FactorySet::empty(), GeneratorSettings::default());
        let mut rng = StdRng::seed_from_u64(9);
        let assembly = s.assemble(&DifficultyConfig::for_level(2), &RecencySet::new(), None, &mut rng);
        assert!(assembly.fallback);
        assert_eq!(assembly.groups.len(), 4);
    }

    #[test]
    fn starved_recency_filter_loosens_instead_of_emptying() {
        let s = selector();
        let mut rng = StdRng::seed_from_u64(5);
        let config = DifficultyConfig::for_level(1);
        let candidates = s.generate_candidates(&config, None, &mut rng);
        let mut everything = RecencySet::new();
        everything.extend(candidates.iter().map(CandidateGroup::key));
        let kept = s.filter_recency(&candidates, &everything, RecencyFilter::Full);
        assert_eq!(kept.len(), candidates.len());
        assert!(kept.iter().all(|r| r.stale));

        let raw = s.filter_recency(&candidates, &everything, RecencyFilter::Off);
        assert!(raw.iter().all(|r| !r.stale));
    }

    #[test]
    fn ranking_keeps_one_candidate_per_label() {
        let s = selector();
        let mut rng = StdRng::seed_from_u64(8);
        let config = DifficultyConfig::for_level(1);
        let candidates = s.generate_candidates(&config, None, &mut rng);
        let pool = s.filter_recency(&candidates, &RecencySet::new(), RecencyFilter::Off);
        let ranked = rank(&pool, &config, &mut rng);
        let labels: HashSet<&str> = candidates.iter().map(CandidateGroup::label_key).collect();
        assert_eq!(ranked.len(), labels.len());
        assert!(ranked.len() < candidates.len());
    }

    #[test]
    fn picks_only_overlap_when_heated() {
        let s = selector();
        let config = DifficultyConfig::for_level(5);
        let mut rng = StdRng::seed_from_u64(14);
        let mut heated = 0;
        for _ in 0..40 {
            let candidates = s.generate_candidates(&config, None, &mut rng);
            let pool = s.filter_recency(&candidates, &RecencySet::new(), RecencyFilter::Off);
            let cold = s.pick_four(&pool, &config, Relaxation::Strict, false, &mut rng).unwrap();
            assert_eq!(max_shared(&cold), 0);
            let hot = s.pick_four(&pool, &config, Relaxation::Strict, true, &mut rng).unwrap();
            let hot = s.add_decoy_heat(hot, &config, true, &mut rng);
            assert!(max_shared(&hot) <= config.max_overlap_words);
            assert_eq!(solution_count(&hot, 2), 1);
            if max_shared(&hot) > 0 {
                heated += 1;
            }
        }
        assert!(heated >= 14, "only {heated} of 40 heated picks carried a decoy");
    }
}
