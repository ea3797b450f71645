use axum::{middleware as axum_mw, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::handlers;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router` with all routes, middleware, and static serving.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Benchmark stream ────────────────────────────────────
        .route(
            "/performance/search",
            get(handlers::performance::performance_search),
        )
        .route("/health", get(handlers::health::health))
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Serve static/ directory for the dashboard ───────────
        .fallback_service(ServeDir::new("static"))
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(timing::timing_middleware))
        .layer(CorsLayer::permissive())
}
