use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use redis::aio::ConnectionManager;
use std::time::Instant;
use tracing::info;

use crate::directory::{redis_store, LookupError};

// ─── Constants ───────────────────────────────────────────────────

/// Rows named exactly `John Smith`, on top of any the RNG produces.
pub const GUARANTEED_MATCHES: usize = 12;
/// Pipeline batch size — keeps Redis buffers comfortable.
const BATCH: usize = 500;

// ─── Name pools ──────────────────────────────────────────────────

static FIRST: &[&str] = &[
    "Emma", "Liam", "Olivia", "Noah", "Ava", "Ethan", "Sophia", "Mason", "Isabella", "William",
    "Mia", "James", "Charlotte", "Benjamin", "Amelia", "Lucas", "Harper", "Henry", "Evelyn",
    "Alexander", "Abigail", "Daniel", "Emily", "Michael", "Elizabeth", "Owen", "Sofia",
    "Sebastian", "Avery", "John",
];

static LAST: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson", "White", "Harris", "Sanchez",
    "Clark", "Ramirez", "Lewis", "Robinson",
];

static DEPARTMENTS: &[&str] = &[
    "engineering",
    "sales",
    "marketing",
    "finance",
    "operations",
    "support",
    "legal",
    "people",
];

// ─── Domain type ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: String,
}

impl Employee {
    pub fn new(n: usize, first: &str, last: &str, department: &str) -> Self {
        Self {
            id: format!("emp_{:08}", n),
            first_name: first.to_owned(),
            last_name: last.to_owned(),
            email: format!(
                "{}.{}{}@example.com",
                first.to_lowercase(),
                last.to_lowercase(),
                n,
            ),
            department: department.to_owned(),
        }
    }
}

// ─── Generation ──────────────────────────────────────────────────

/// Deterministic roster of `n` employees (plus the guaranteed matches).
///
/// Re-runs with the same `n` produce the same rows.
pub fn roster(n: usize) -> Vec<Employee> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut out = Vec::with_capacity(n + GUARANTEED_MATCHES);

    for i in 0..n {
        let first = FIRST[rng.gen_range(0..FIRST.len())];
        let last = LAST[rng.gen_range(0..LAST.len())];
        let dept = DEPARTMENTS[rng.gen_range(0..DEPARTMENTS.len())];
        out.push(Employee::new(i + 1, first, last, dept));
    }

    for i in 0..GUARANTEED_MATCHES {
        let dept = DEPARTMENTS[i % DEPARTMENTS.len()];
        out.push(Employee::new(n + i + 1, "John", "Smith", dept));
    }

    out
}

// ─── Redis seeding ───────────────────────────────────────────────

/// Push the roster into Redis: one hash per employee plus a name index set.
pub async fn seed_redis(conn: &ConnectionManager, roster: &[Employee]) -> Result<(), LookupError> {
    let start = Instant::now();
    info!(employees = roster.len(), "seeding employees into redis");

    let mut conn = conn.clone();

    // Drop stale name sets so counts don't grow across restarts
    let stale: Vec<String> = redis::cmd("KEYS")
        .arg(format!("{}*", redis_store::NAME_PREFIX))
        .query_async(&mut conn)
        .await?;
    if !stale.is_empty() {
        let _: () = redis::cmd("DEL").arg(&stale).query_async(&mut conn).await?;
    }

    for chunk in roster.chunks(BATCH) {
        let mut pipe = redis::pipe();

        for employee in chunk {
            pipe.cmd("HSET")
                .arg(redis_store::employee_key(&employee.id))
                .arg("id")
                .arg(&employee.id)
                .arg("first_name")
                .arg(&employee.first_name)
                .arg("last_name")
                .arg(&employee.last_name)
                .arg("email")
                .arg(&employee.email)
                .arg("department")
                .arg(&employee.department)
                .ignore();
            pipe.cmd("SADD")
                .arg(redis_store::name_key(&employee.first_name, &employee.last_name))
                .arg(&employee.id)
                .ignore();
        }

        let _: () = pipe.query_async(&mut conn).await?;
    }

    info!(
        elapsed_secs = start.elapsed().as_secs_f64(),
        "seed complete"
    );
    Ok(())
}
