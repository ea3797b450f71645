use serde::Serialize;

/// Interpolated percentile over an ascending slice.
///
/// `rank` is in `[0, 100]`; values outside are clamped to it. The slice
/// must already be sorted; this never sorts. Returns `0.0` for an empty
/// slice.
pub fn percentile(sorted: &[f64], rank: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    debug_assert!((0.0..=100.0).contains(&rank), "rank {rank} out of range");
    let rank = rank.clamp(0.0, 100.0);

    let idx = rank / 100.0 * (sorted.len() - 1) as f64;
    let lower = idx.floor() as usize;
    let upper = lower + 1;

    // Tail: no neighbour to interpolate with
    if upper >= sorted.len() {
        return sorted[lower];
    }

    let frac = idx - lower as f64;
    sorted[lower] * (1.0 - frac) + sorted[upper] * frac
}

/// The three latency ranks reported at the end of a run (milliseconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencyPercentiles {
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

impl LatencyPercentiles {
    /// Query all three ranks against one already-sorted slice.
    pub fn from_sorted(sorted: &[f64]) -> Self {
        Self {
            p50: percentile(sorted, 50.0),
            p95: percentile(sorted, 95.0),
            p99: percentile(sorted, 99.0),
        }
    }

    /// Sorts a copy of `samples` once, then queries it.
    pub fn from_samples(samples: &[f64]) -> Self {
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted)
    }
}
