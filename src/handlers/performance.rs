use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header,
    response::{sse::Sse, IntoResponse},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::bench::stream::sse_events;
use crate::bench::run_benchmark;
use crate::config::MAX_QUERIES;
use crate::directory::{EmployeeQuery, Lookup};
use crate::AppState;

use super::AppError;

// ─── Request type ────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RunParams {
    /// Invocations in this run; falls back to the configured default
    pub queries: Option<u32>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl RunParams {
    fn queries(&self, default: u32) -> Result<u32, AppError> {
        let queries = self.queries.unwrap_or(default);
        if queries == 0 || queries > MAX_QUERIES {
            return Err(AppError::BadRequest(format!(
                "queries must be between 1 and {MAX_QUERIES}"
            )));
        }
        Ok(queries)
    }

    fn employee_query(self, default: &EmployeeQuery) -> EmployeeQuery {
        EmployeeQuery {
            first_name: self.first_name.unwrap_or_else(|| default.first_name.clone()),
            last_name: self.last_name.unwrap_or_else(|| default.last_name.clone()),
        }
    }
}

// ─── GET /performance/search ─────────────────────────────────────
/// Runs one benchmark and streams it as Server-Sent Events: one `running`
/// message per lookup, then a single `completed` message with percentiles.

pub async fn performance_search(
    State(state): State<Arc<AppState>>,
    params: Result<Query<RunParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let queries = params.queries(state.default_queries)?;
    let query = params.employee_query(&state.query);

    info!(queries, %query, backend = state.directory.name(), "starting benchmark run");

    // Opening a Redis lookup connects synchronously
    let directory = state.directory.clone();
    let lookup = tokio::task::spawn_blocking(move || directory.open(&query))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(event_stream(queries, lookup))
}

/// SSE response for one run over `lookup`.
///
/// No keep-alive comments: the body is exactly one `data:` frame per event.
///
/// The lookup runs inline on this response's task. Blocking lookups (the
/// Redis backend) go through `directory::run_blocking`, which hands the
/// worker's other tasks off while the call is in flight.
pub fn event_stream<L>(queries: u32, lookup: L) -> impl IntoResponse
where
    L: Lookup + 'static,
{
    (
        [(header::CONTENT_TYPE, "text/event-stream; charset=utf-8")],
        Sse::new(sse_events(run_benchmark(queries, lookup))),
    )
}
