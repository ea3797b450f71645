pub mod bench;
pub mod config;
pub mod directory;
pub mod handlers;
pub mod middleware;
pub mod mock_data;
pub mod server;

use directory::{Directory, EmployeeQuery};

/// Shared application state available to every handler via `State<Arc<AppState>>`.
///
/// Read-only after startup; each benchmark run builds its own state.
pub struct AppState {
    /// Backend that serves the benchmarked lookup.
    pub directory: Directory,

    /// Invocations per run when the client doesn't pass `queries`.
    pub default_queries: u32,

    /// Name counted when the client doesn't pass one.
    pub query: EmployeeQuery,
}
