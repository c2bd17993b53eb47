use anyhow::Result;
use clap::Parser;
use connected_engine::{
    audit, evaluate_guess, Config, Engine, FreshnessSource, GuessOutcome, PuzzleRequest, PuzzleResponse,
};
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Msg {
    Init {
        seed: Option<u64>,
    },
    Generate {
        #[serde(default)]
        request: serde_json::Value,
    },
    Audit {
        puzzle: PuzzleResponse,
    },
    Guess {
        puzzle: PuzzleResponse,
        words: Vec<String>,
    },
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum Out {
    Ready,
    Puzzle { puzzle: PuzzleResponse },
    Audit { ok: bool, error: Option<String> },
    Guess { result: GuessOutcome },
    Error { message: String },
}

struct State {
    engine: Engine,
    source: Arc<dyn FreshnessSource>,
    rng: StdRng,
}

fn emit<W: Write>(out: &mut W, msg: &Out) {
    match serde_json::to_string(msg) {
        Ok(line) => {
            let _ = writeln!(out, "{line}");
            let _ = out.flush();
        }
        Err(e) => error!("could not encode reply: {e}"),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = Config::parse();
    config.init_logging();
    info!("cx_worker ready for messages on stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();
    let mut state: Option<State> = None;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let msg: Msg = match serde_json::from_str(&line) {
            Ok(m) => m,
            Err(e) => {
                emit(&mut stdout, &Out::Error { message: format!("bad json: {e}") });
                continue;
            }
        };
        match msg {
            Msg::Init { seed } => {
                let rng = match seed.or(config.seed) {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                state = Some(State {
                    engine: Engine::new(config.settings()),
                    source: config.freshness_source(),
                    rng,
                });
                emit(&mut stdout, &Out::Ready);
            }
            Msg::Generate { request } => {
                let Some(ref mut s) = state else {
                    emit(&mut stdout, &Out::Error { message: "not initialized".into() });
                    continue;
                };
                let request = PuzzleRequest::from_json(&request);
                let puzzle = s.engine.generate(&request, s.source.as_ref(), &mut s.rng).await;
                emit(&mut stdout, &Out::Puzzle { puzzle });
            }
            Msg::Audit { puzzle } => {
                let reply = match audit(&puzzle) {
                    Ok(()) => Out::Audit { ok: true, error: None },
                    Err(e) => Out::Audit {
                        ok: false,
                        error: Some(e.to_string()),
                    },
                };
                emit(&mut stdout, &reply);
            }
            Msg::Guess { puzzle, words } => {
                let result = evaluate_guess(&puzzle, words.as_slice());
                emit(&mut stdout, &Out::Guess { result });
            }
        }
    }
    Ok(())
}
