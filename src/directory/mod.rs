pub mod memory;
pub mod redis_store;

pub use memory::EmployeeIndex;
pub use redis_store::{RedisDirectory, RedisLookup};

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task;

// ─── Lookup seam ─────────────────────────────────────────────────

/// The operation being benchmarked: a synchronous call returning a count.
///
/// Must return the same count on every call of a run.
pub trait Lookup: Send {
    fn lookup(&mut self) -> Result<u64, LookupError>;
}

impl<F> Lookup for F
where
    F: FnMut() -> Result<u64, LookupError> + Send,
{
    fn lookup(&mut self) -> Result<u64, LookupError> {
        self()
    }
}

/// Run a blocking call from inside a stream poll without stalling the
/// worker's other tasks.
///
/// On a multi-thread runtime the worker is handed off for the duration of
/// `f`; elsewhere (current-thread runtime, no runtime) `f` runs directly.
pub fn run_blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            task::block_in_place(f)
        }
        _ => f(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("{0}")]
    Backend(String),
}

// ─── Query ───────────────────────────────────────────────────────

/// Count employees whose full name matches exactly.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmployeeQuery {
    pub first_name: String,
    pub last_name: String,
}

impl EmployeeQuery {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// Normalised `first last` key shared by every backend.
    pub fn full_name(&self) -> String {
        full_name(&self.first_name, &self.last_name)
    }
}

impl Default for EmployeeQuery {
    fn default() -> Self {
        Self::new("John", "Smith")
    }
}

impl fmt::Display for EmployeeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

pub(crate) fn full_name(first: &str, last: &str) -> String {
    format!("{} {}", first.trim(), last.trim()).to_lowercase()
}

// ─── Backends ────────────────────────────────────────────────────

/// Where a run's lookups are served from. Cheap to clone.
#[derive(Clone)]
pub enum Directory {
    Memory(Arc<EmployeeIndex>),
    Redis(RedisDirectory),
}

impl Directory {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Redis(_) => "redis",
        }
    }

    /// Build the lookup one run will call repeatedly.
    ///
    /// The Redis backend opens a blocking connection here; call from a
    /// blocking context.
    pub fn open(&self, query: &EmployeeQuery) -> Result<DirectoryLookup, LookupError> {
        match self {
            Self::Memory(index) => Ok(DirectoryLookup::Memory {
                index: index.clone(),
                key: query.full_name(),
            }),
            Self::Redis(store) => Ok(DirectoryLookup::Redis(store.lookup(query)?)),
        }
    }
}

/// A lookup bound to one backend and one query.
pub enum DirectoryLookup {
    Memory { index: Arc<EmployeeIndex>, key: String },
    Redis(RedisLookup),
}

impl Lookup for DirectoryLookup {
    fn lookup(&mut self) -> Result<u64, LookupError> {
        match self {
            Self::Memory { index, key } => Ok(index.count(key)),
            Self::Redis(lookup) => lookup.lookup(),
        }
    }
}
