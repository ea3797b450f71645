use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lookup_latency_bench::config::{Backend, Config};
use lookup_latency_bench::directory::{Directory, EmployeeIndex, RedisDirectory};
use lookup_latency_bench::{mock_data, server, AppState};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // ── 1. Configuration ─────────────────────────────────────────
    let config = Config::from_env()?;
    info!(?config, "loaded configuration");

    // ── 2. Build the lookup backend & seed mock data ─────────────
    let roster = mock_data::roster(config.employees);
    let directory = match config.backend {
        Backend::Memory => Directory::Memory(Arc::new(EmployeeIndex::from_roster(&roster))),
        Backend::Redis => {
            info!(url = %config.redis_url, "connecting to redis");
            let store = RedisDirectory::open(&config.redis_url)?;
            let conn = store.manager().await?;
            mock_data::seed_redis(&conn, &roster).await?;
            Directory::Redis(store)
        }
    };

    // ── 3. Build shared state ────────────────────────────────────
    let state = Arc::new(AppState {
        directory,
        default_queries: config.default_queries,
        query: config.query.clone(),
    });

    // ── 4. Build Axum router ─────────────────────────────────────
    let app = server::create_router(state);

    // ── 5. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;

    info!(addr = %config.bind_addr, "server listening");
    info!("benchmark stream → http://{}/performance/search", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
