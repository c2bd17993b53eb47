use anyhow::{Context, Result};
use clap::Parser;
use connected_engine::{Config, Engine, HistoryStore, PuzzleRequest};
use log::{debug, info};
use std::io::{Read, Write};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = Config::parse();
    config.init_logging();

    // Read stdin; empty or malformed input means defaults
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf).context("reading request from stdin")?;
    let mut request = PuzzleRequest::from_body(&buf);

    let mut history = match &config.history_db {
        Some(path) => Some(
            HistoryStore::open(path).with_context(|| format!("opening history store {}", path.display()))?,
        ),
        None => None,
    };
    if let Some(store) = &history {
        let recent = store.load_recent(config.history_cap)?;
        debug!("loaded {} remembered tokens", recent.len());
        request.recency.extend(recent.iter().map(String::as_str));
    }

    let engine = Engine::new(config.settings());
    let source = config.freshness_source();
    let mut rng = config.rng();
    let response = engine.generate(&request, source.as_ref(), &mut rng).await;

    let mut stdout = std::io::stdout();
    let s = serde_json::to_string(&response)?;
    stdout.write_all(s.as_bytes())?;
    stdout.write_all(b"\n")?;

    if let Some(store) = history.as_mut() {
        store.remember(&response.seen)?;
        let dropped = store.trim(config.history_cap)?;
        info!("history now holds {} tokens ({} trimmed)", store.len()?, dropped);
    }
    Ok(())
}
