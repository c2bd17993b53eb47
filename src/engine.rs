use log::{debug, info};
use rand::Rng;
use std::sync::Arc;

use crate::factory::FactorySet;
use crate::freshness::{self, FreshnessSource};
use crate::puzzle::Puzzle;
use crate::response::{PuzzleRequest, PuzzleResponse};
use crate::selector::{GeneratorSettings, Selector};
use crate::vocab::{Pool, Vocabulary};

/// Shared, read-only generator state. One engine serves any number of
/// concurrent requests; each request brings its own RNG.
#[derive(Debug, Clone)]
pub struct Engine {
    selector: Arc<Selector>,
}

impl Engine {
    pub fn new(settings: GeneratorSettings) -> Self {
        let vocab = Arc::new(Vocabulary::standard());
        let factories = FactorySet::standard(&vocab);
        Self::with_factories(vocab, factories, settings)
    }

    pub fn with_factories(vocab: Arc<Vocabulary>, factories: FactorySet, settings: GeneratorSettings) -> Self {
        Engine {
            selector: Arc::new(Selector::new(vocab, factories, settings)),
        }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        self.selector.settings()
    }

    /// Generates without consulting any outside source.
    pub fn generate_offline<R: Rng + ?Sized>(
        &self,
        request: &PuzzleRequest,
        bonus: Option<&Arc<Pool>>,
        rng: &mut R,
    ) -> PuzzleResponse {
        let config = &request.difficulty;
        let assembly = self.selector.assemble(config, &request.recency, bonus, rng);
        let puzzle = Puzzle::from_groups(assembly.groups, rng);
        let response = PuzzleResponse::new(&puzzle, config, assembly.fallback);
        info!(
            "served level {} puzzle (fallback={}, attempts={}, avoided={})",
            config.level,
            assembly.fallback,
            assembly.attempts,
            request.recency.len()
        );
        response
    }

    /// Rolls for a freshness lookup, awaits it under the configured timeout,
    /// then generates. A failed lookup only means no bonus pool.
    pub async fn generate<S, R>(&self, request: &PuzzleRequest, source: &S, rng: &mut R) -> PuzzleResponse
    where
        S: FreshnessSource + ?Sized,
        R: Rng + Send + ?Sized,
    {
        let bonus = match freshness::plan_lookup(request.difficulty.freshness_probability, rng) {
            Some(topic) => match freshness::lookup(source, topic, self.settings().freshness_timeout).await {
                Ok(pool) => {
                    debug!("fresh pool for {topic}: {} words", pool.size());
                    Some(Arc::new(pool))
                }
                Err(e) => {
                    debug!("no fresh pool for {topic}: {e}");
                    None
                }
            },
            None => None,
        };
        self.generate_offline(request, bonus.as_ref(), rng)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(GeneratorSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{Factory, WeightedFactory};
    use crate::freshness::StaticSource;
    use crate::response::audit;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};
    use std::time::Duration;

    #[test]
    fn offline_generation_is_replayable() {
        let engine = Engine::default();
        let request = PuzzleRequest::new(3);
        let a = engine.generate_offline(&request, None, &mut StdRng::seed_from_u64(77));
        let b = engine.generate_offline(&request, None, &mut StdRng::seed_from_u64(77));
        assert_eq!(a.groups, b.groups);
        assert_eq!(a.tiles, b.tiles);
        assert_eq!(audit(&a), Ok(()));
    }

    #[tokio::test]
    async fn slow_sources_do_not_block_generation() {
        let settings = GeneratorSettings {
            freshness_timeout: Duration::from_millis(10),
            ..GeneratorSettings::default()
        };
        let engine = Engine::new(settings);
        let source = StaticSource {
            words: vec!["never".to_string(); 20],
            delay: Some(Duration::from_secs(5)),
        };
        let mut rng = StdRng::seed_from_u64(1);
        for level in 1..=5 {
            let response = engine.generate(&PuzzleRequest::new(level), &source, &mut rng).await;
            assert_eq!(audit(&response), Ok(()));
        }
    }

    #[tokio::test]
    async fn bonus_words_can_reach_the_board() {
        let vocab = Arc::new(Vocabulary::standard());
        let mut entries = vec![WeightedFactory {
            factory: Factory::Fresh,
            weight: 5,
        }];
        entries.extend(vocab.themes.iter().map(|p| WeightedFactory {
            factory: Factory::Theme(p.clone()),
            weight: 1,
        }));
        let engine = Engine::with_factories(vocab, FactorySet::new(entries), GeneratorSettings::default());
        let topical: Vec<String> = (0..40).map(|i| format!("TOPIC{i}")).collect();
        let source = StaticSource {
            words: topical.clone(),
            delay: None,
        };
        let mut rng = StdRng::seed_from_u64(8);
        let mut request = PuzzleRequest::new(5);
        request.difficulty.freshness_probability = 1.0;
        let mut reached = false;
        for _ in 0..10 {
            let response = engine.generate(&request, &source, &mut rng).await;
            assert_eq!(audit(&response), Ok(()));
            reached |= response.tiles.iter().any(|t| topical.contains(&t.word));
        }
        assert!(reached);
    }

    #[tokio::test]
    async fn any_seeded_source_of_randomness_will_do() {
        let engine = Engine::default();
        let source = StaticSource {
            words: Vec::new(),
            delay: None,
        };
        let request = PuzzleRequest::new(4);
        let mut boxed: Box<dyn RngCore + Send> = Box::new(StdRng::seed_from_u64(31));
        let a = engine.generate(&request, &source, boxed.as_mut()).await;
        let b = engine.generate(&request, &source, &mut StdRng::seed_from_u64(31)).await;
        assert_eq!(audit(&a), Ok(()));
        assert_eq!(a.groups, b.groups);
    }
}
