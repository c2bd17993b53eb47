use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::freshness::{DatamuseSource, DisabledSource, FreshnessSource, DATAMUSE_URL};
use crate::history::DEFAULT_HISTORY_CAP;
use crate::selector::GeneratorSettings;

/// Options shared by the generator binaries.
#[derive(Debug, Clone, Parser)]
#[command(about = "Word-group puzzle generator")]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Seed for the random number generator (omit for entropy)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Never consult the outside vocabulary source
    #[arg(long)]
    pub no_freshness: bool,

    /// Base URL of the outside vocabulary source
    #[arg(long, default_value = DATAMUSE_URL)]
    pub freshness_url: String,

    /// Timeout for one outside lookup, in milliseconds
    #[arg(long, default_value = "1500")]
    pub freshness_timeout_ms: u64,

    /// Stop generating candidates once this many distinct groups exist
    #[arg(long, default_value = "400")]
    pub target_pool_size: usize,

    /// Loosen recency filtering below this many candidates
    #[arg(long, default_value = "60")]
    pub min_pool_floor: usize,

    /// SQLite file holding recently served tokens (one-shot driver only)
    #[arg(long)]
    pub history_db: Option<PathBuf>,

    /// Tokens kept in the history store
    #[arg(long, default_value_t = DEFAULT_HISTORY_CAP)]
    pub history_cap: usize,

    /// Address the HTTP endpoint listens on
    #[arg(long, default_value = "127.0.0.1:8788")]
    pub bind: String,
}

impl Config {
    pub fn settings(&self) -> GeneratorSettings {
        GeneratorSettings {
            target_pool_size: self.target_pool_size,
            min_pool_floor: self.min_pool_floor,
            freshness_timeout: Duration::from_millis(self.freshness_timeout_ms),
            ..GeneratorSettings::default()
        }
    }

    /// Logs go to stderr; stdout belongs to the JSON protocol.
    pub fn init_logging(&self) {
        let mut builder = env_logger::Builder::from_default_env();
        builder.filter_level(self.log_level.parse().unwrap_or(log::LevelFilter::Info));
        builder.target(env_logger::Target::Stderr);
        let _ = builder.try_init();
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub fn freshness_source(&self) -> Arc<dyn FreshnessSource> {
        if self.no_freshness {
            Arc::new(DisabledSource)
        } else {
            Arc::new(DatamuseSource::new(self.freshness_url.clone()))
        }
    }
}
