pub mod percentiles;
pub mod runner;
pub mod stream;

pub use runner::{run_benchmark, RunState};

use serde::Serialize;

use crate::directory::LookupError;

/// Default invocation count when the caller doesn't pick one.
pub const DEFAULT_QUERIES: u32 = 100;

// ─── Events ──────────────────────────────────────────────────────

/// Status marker carried by every event; clients branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Running,
    Completed,
}

/// Snapshot taken right after one invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub progress: u32,
    pub total: u32,
    pub percentage: f64,
    pub current_query_time: f64,
    pub total_time: f64,
    pub results_count: u64,
    pub status: Status,
}

/// Terminal record of a finished run. All times in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEvent {
    pub status: Status,
    pub total_execution_time_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub queries_executed: u32,
    pub results_count: u64,
}

/// One element of a benchmark stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BenchEvent {
    Progress(ProgressEvent),
    Summary(SummaryEvent),
}

impl BenchEvent {
    pub fn is_summary(&self) -> bool {
        matches!(self, Self::Summary(_))
    }
}

// ─── Errors ──────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("lookup failed on invocation {invocation}: {source}")]
    Lookup {
        invocation: u32,
        #[source]
        source: LookupError,
    },

    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

// ─── Rounding ────────────────────────────────────────────────────

/// Round to `places` decimal digits.
///
/// Goes through exact decimal formatting, so ties resolve to even on the
/// value actually stored: 6.25 → 6.2, 0.125 → 0.12.
pub(crate) fn round_to(value: f64, places: usize) -> f64 {
    format!("{value:.places$}").parse().unwrap_or(value)
}
