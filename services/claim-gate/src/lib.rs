//! HTTP service exposing the prize claim authorization gate.

pub mod coalesce;
mod handlers;

use axum::routing::{get, post};
use axum::Router;
use coalesce::Coalescer;
use lootpool_gate::ClaimGate;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct ClaimGateConfig {
    pub host: String,
    pub port: u16,
    /// Redis connection URL; absent means the in-memory store.
    pub redis_url: Option<String>,
    pub redis_prefix: String,
    /// Per-request deadline for the claim pipeline.
    pub request_timeout_ms: u64,
    /// Window in which a duplicate in-flight claim for the same key is
    /// rejected instead of racing its twin.
    pub coalesce_window_ms: u64,
}

impl ClaimGateConfig {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("CLAIM_GATE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: read_u16("CLAIM_GATE_PORT", 9310),
            redis_url: std::env::var("CLAIM_GATE_REDIS_URL").ok(),
            redis_prefix: std::env::var("CLAIM_GATE_REDIS_PREFIX")
                .unwrap_or_else(|_| "lootpool:".to_string()),
            request_timeout_ms: read_ms("CLAIM_GATE_TIMEOUT_MS", 10_000),
            coalesce_window_ms: read_ms("CLAIM_GATE_COALESCE_MS", 30_000),
        }
    }
}

fn read_ms(key: &str, fallback: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or(fallback)
}

fn read_u16(key: &str, fallback: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<u16>().ok())
        .unwrap_or(fallback)
}

#[derive(Clone)]
pub struct AppState {
    gate: ClaimGate,
    coalescer: Arc<Coalescer>,
    deadline: Duration,
}

impl AppState {
    pub fn new(gate: ClaimGate, config: &ClaimGateConfig) -> Self {
        Self {
            gate,
            coalescer: Arc::new(Coalescer::new(Duration::from_millis(
                config.coalesce_window_ms,
            ))),
            deadline: Duration::from_millis(config.request_timeout_ms),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/claims/authorize", post(handlers::authorize_claim))
        .route("/claims/eligibility", get(handlers::eligibility))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}
