use redis::aio::ConnectionManager;

use super::{full_name, run_blocking, EmployeeQuery, Lookup, LookupError};

/// Key prefix of the per-name index sets.
pub const NAME_PREFIX: &str = "employee:name:";

pub fn employee_key(id: &str) -> String {
    format!("employee:{id}")
}

pub fn name_key(first: &str, last: &str) -> String {
    format!("{NAME_PREFIX}{}", full_name(first, last))
}

/// Redis-backed employee directory.
///
/// Seeding goes through the async `ConnectionManager`; benchmark lookups
/// use a dedicated blocking connection per run so each timed call is
/// exactly one round-trip.
#[derive(Clone)]
pub struct RedisDirectory {
    client: redis::Client,
}

impl RedisDirectory {
    pub fn open(url: &str) -> Result<Self, LookupError> {
        Ok(Self {
            client: redis::Client::open(url)?,
        })
    }

    /// Async connection for seeding. `ConnectionManager` reconnects on
    /// failure and is cheap to clone.
    pub async fn manager(&self) -> Result<ConnectionManager, LookupError> {
        Ok(ConnectionManager::new(self.client.clone()).await?)
    }

    /// Blocking lookup bound to `query`. Opens a TCP connection.
    pub fn lookup(&self, query: &EmployeeQuery) -> Result<RedisLookup, LookupError> {
        Ok(RedisLookup {
            conn: self.client.get_connection()?,
            key: name_key(&query.first_name, &query.last_name),
        })
    }
}

/// `SCARD` on one name index set.
pub struct RedisLookup {
    conn: redis::Connection,
    key: String,
}

impl Lookup for RedisLookup {
    fn lookup(&mut self) -> Result<u64, LookupError> {
        let Self { conn, key } = self;
        Ok(run_blocking(|| redis::cmd("SCARD").arg(key.as_str()).query::<u64>(conn))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys() {
        assert_eq!(employee_key("emp_00000001"), "employee:emp_00000001");
        assert_eq!(name_key("John", "Smith"), "employee:name:john smith");
    }

    #[test]
    fn rejects_bad_url() {
        assert!(RedisDirectory::open("not a url").is_err());
    }
}
