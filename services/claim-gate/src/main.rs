use anyhow::Context;
use lootpool_claim_gate::{router, AppState, ClaimGateConfig};
use lootpool_gate::ClaimGate;
use lootpool_store::{MemoryStore, RedisStore, Store};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = ClaimGateConfig::from_env();
    let store: Arc<dyn Store> = match &config.redis_url {
        Some(url) => {
            info!(url = %url, "using redis store");
            Arc::new(
                RedisStore::new(url, config.redis_prefix.clone())
                    .context("invalid redis url")?,
            )
        }
        None => {
            warn!("CLAIM_GATE_REDIS_URL not set; using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(ClaimGate::new(store), &config);
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid listen addr")?;
    info!(%addr, "claim gate service listening");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
