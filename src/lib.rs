//! Generator for sixteen-tile word-grouping puzzles: four hidden groups of
//! four, each backed by a checkable rule, with optional decoys between them.

pub mod candidate;
pub mod config;
pub mod difficulty;
pub mod engine;
pub mod factory;
pub mod freshness;
pub mod history;
pub mod overlap;
pub mod proof;
pub mod puzzle;
pub mod recency;
pub mod response;
pub mod selector;
pub mod token;
pub mod validate;
pub mod vocab;

pub use candidate::{identity_key, label_key, CandidateGroup, Family};
pub use config::Config;
pub use difficulty::DifficultyConfig;
pub use engine::Engine;
pub use factory::{Factory, FactoryResult, FactorySet, WeightedFactory};
pub use freshness::{DatamuseSource, DisabledSource, FetchError, FreshnessSource, StaticSource};
pub use history::{HistoryError, HistoryStore};
pub use proof::{Proof, ProofError};
pub use puzzle::{fallback_groups, Color, Puzzle, SolvedGroup, Tile, PALETTE};
pub use recency::{RecencyFilter, RecencySet};
pub use response::{audit, evaluate_guess, AuditError, GuessOutcome, PuzzleRequest, PuzzleResponse};
pub use selector::{Assembly, GeneratorSettings, Relaxation, RetryPolicy, Selector};
pub use token::{TokenError, WordToken};
pub use validate::{validate, RejectReason, Verdict};
pub use vocab::{Pool, Vocabulary};
