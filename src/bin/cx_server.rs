// HTTP endpoint for puzzle generation: GET or POST /api/puzzle.

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, Method},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use clap::Parser;
use connected_engine::{Config, Engine, FreshnessSource, PuzzleRequest};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

struct AppState {
    engine: Engine,
    source: Arc<dyn FreshnessSource>,
    /// With `--seed`, request n uses seed + n so a run can be replayed.
    seed: Option<u64>,
    served: AtomicU64,
}

impl AppState {
    fn rng(&self) -> StdRng {
        let n = self.served.fetch_add(1, Ordering::Relaxed);
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(n)),
            None => StdRng::from_entropy(),
        }
    }
}

/// GET ignores the body; POST bodies that do not parse count as `{}`.
async fn puzzle_handler(State(app): State<Arc<AppState>>, method: Method, body: String) -> impl IntoResponse {
    let request = if method == Method::POST {
        PuzzleRequest::from_body(&body)
    } else {
        PuzzleRequest::default()
    };
    let mut rng = app.rng();
    let response = app.engine.generate(&request, app.source.as_ref(), &mut rng).await;
    ([(header::CACHE_CONTROL, "no-store")], Json(response))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    config.init_logging();

    let state = Arc::new(AppState {
        engine: Engine::new(config.settings()),
        source: config.freshness_source(),
        seed: config.seed,
        served: AtomicU64::new(0),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/puzzle", get(puzzle_handler).post(puzzle_handler))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!("cx_server listening on http://{}/api/puzzle", config.bind);

    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}
