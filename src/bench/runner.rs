use std::time::Instant;

use futures::stream::{self, Stream};
use tracing::{info, trace, warn};

use super::percentiles::LatencyPercentiles;
use super::{round_to, BenchError, BenchEvent, ProgressEvent, Status, SummaryEvent};
use crate::directory::Lookup;

// ─── Run state ───────────────────────────────────────────────────

/// Accumulator for one run. Owned by exactly one stream.
#[derive(Debug, Clone)]
pub struct RunState {
    total: u32,
    completed: u32,
    /// Sum of `samples`, ms
    total_ms: f64,
    /// Per-invocation latency in call order, ms
    samples: Vec<f64>,
    last_count: u64,
}

impl RunState {
    pub fn new(total: u32) -> Self {
        Self {
            total,
            completed: 0,
            total_ms: 0.0,
            samples: Vec::with_capacity(total as usize),
            last_count: 0,
        }
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn completed(&self) -> u32 {
        self.completed
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }

    pub fn total_ms(&self) -> f64 {
        self.total_ms
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Fold one measured invocation in and snapshot the result.
    ///
    /// Returns `None` once `total` invocations have been recorded.
    pub fn record(&mut self, latency_ms: f64, results_count: u64) -> Option<ProgressEvent> {
        if self.is_done() {
            return None;
        }

        self.completed += 1;
        self.total_ms += latency_ms;
        self.samples.push(latency_ms);
        self.last_count = results_count;

        Some(ProgressEvent {
            progress: self.completed,
            total: self.total,
            percentage: round_to(self.completed as f64 / self.total as f64 * 100.0, 1),
            current_query_time: round_to(latency_ms, 2),
            total_time: round_to(self.total_ms, 2),
            results_count,
            status: Status::Running,
        })
    }

    /// Sorts the retained samples once and builds the terminal record.
    pub fn summary(&self) -> SummaryEvent {
        let pct = LatencyPercentiles::from_samples(&self.samples);

        SummaryEvent {
            status: Status::Completed,
            total_execution_time_ms: round_to(self.total_ms, 2),
            p50_ms: round_to(pct.p50, 2),
            p95_ms: round_to(pct.p95, 2),
            p99_ms: round_to(pct.p99, 2),
            queries_executed: self.completed,
            results_count: self.last_count,
        }
    }
}

// ─── Runner ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    NotStarted,
    Running,
    Completed,
}

struct Runner<L> {
    state: RunState,
    lookup: L,
    phase: Phase,
}

impl<L: Lookup> Runner<L> {
    /// Time one synchronous lookup and fold it into the state.
    ///
    /// `Ok(None)` once the configured total has been reached; the lookup is
    /// not called in that case.
    fn invoke(&mut self) -> Result<Option<ProgressEvent>, BenchError> {
        if self.state.is_done() {
            return Ok(None);
        }
        let invocation = self.state.completed() + 1;

        let start = Instant::now();
        let count = self
            .lookup
            .lookup()
            .map_err(|source| BenchError::Lookup { invocation, source })?;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        trace!(invocation, latency_ms, count, "lookup");

        Ok(self.state.record(latency_ms, count))
    }

    fn finish(&mut self) -> SummaryEvent {
        self.phase = Phase::Completed;
        let summary = self.state.summary();
        info!(
            queries = summary.queries_executed,
            total_ms = summary.total_execution_time_ms,
            p50_ms = summary.p50_ms,
            p95_ms = summary.p95_ms,
            p99_ms = summary.p99_ms,
            "benchmark completed"
        );
        summary
    }
}

/// Run `total` sequential lookups, yielding one progress event per call and
/// a single summary at the end.
///
/// After every progress event the stream yields to the scheduler before the
/// next lookup (or the summary), so a transport polling it can flush each
/// event as it is produced. A lookup error is yielded once and ends the
/// stream without a summary.
pub fn run_benchmark<L>(total: u32, lookup: L) -> impl Stream<Item = Result<BenchEvent, BenchError>>
where
    L: Lookup,
{
    let runner = Runner {
        state: RunState::new(total),
        lookup,
        phase: Phase::NotStarted,
    };

    stream::unfold(runner, |mut runner| async move {
        match runner.phase {
            Phase::Completed => return None,
            Phase::NotStarted => {
                info!(total = runner.state.total(), "benchmark started");
                runner.phase = Phase::Running;
            }
            Phase::Running => tokio::task::yield_now().await,
        }

        match runner.invoke() {
            Ok(Some(progress)) => Some((Ok(BenchEvent::Progress(progress)), runner)),
            Ok(None) => {
                let summary = runner.finish();
                Some((Ok(BenchEvent::Summary(summary)), runner))
            }
            Err(err) => {
                warn!(error = %err, "benchmark aborted");
                runner.phase = Phase::Completed;
                Some((Err(err), runner))
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::LookupError;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    async fn collect<L: Lookup>(total: u32, lookup: L) -> Vec<Result<BenchEvent, BenchError>> {
        run_benchmark(total, lookup).collect().await
    }

    #[test]
    fn state_tracks_sum_and_order() {
        let mut state = RunState::new(4);
        for ms in [10.0, 20.0, 30.0, 40.0] {
            state.record(ms, 7).unwrap();
        }

        assert_eq!(state.samples(), &[10.0, 20.0, 30.0, 40.0]);
        assert_eq!(state.total_ms(), 100.0);
        assert!(state.is_done());
        assert!(state.record(50.0, 7).is_none());
        assert_eq!(state.completed(), 4);
    }

    #[test]
    fn summary_of_known_latencies() {
        let mut state = RunState::new(4);
        let events: Vec<_> = [10.0, 20.0, 30.0, 40.0]
            .into_iter()
            .map(|ms| state.record(ms, 3).unwrap())
            .collect();

        let pct: Vec<f64> = events.iter().map(|e| e.percentage).collect();
        assert_eq!(pct, vec![25.0, 50.0, 75.0, 100.0]);
        assert_eq!(events[1].total_time, 30.0);

        let summary = state.summary();
        assert_eq!(summary.status, Status::Completed);
        assert_eq!(summary.total_execution_time_ms, 100.0);
        assert_eq!(summary.p50_ms, 25.0);
        assert_eq!(summary.p95_ms, 38.5);
        assert_eq!(summary.p99_ms, 39.7);
        assert_eq!(summary.queries_executed, 4);
        assert_eq!(summary.results_count, 3);
    }

    #[test]
    fn summary_of_empty_run_is_zeroed() {
        let summary = RunState::new(0).summary();
        assert_eq!(summary.queries_executed, 0);
        assert_eq!(summary.total_execution_time_ms, 0.0);
        assert_eq!((summary.p50_ms, summary.p95_ms, summary.p99_ms), (0.0, 0.0, 0.0));
    }

    #[tokio::test]
    async fn single_invocation() {
        let events = collect(1, || Ok::<u64, LookupError>(42)).await;
        assert_eq!(events.len(), 2);

        let Ok(BenchEvent::Progress(progress)) = &events[0] else {
            panic!("expected progress, got {:?}", events[0]);
        };
        assert_eq!(progress.progress, 1);
        assert_eq!(progress.total, 1);
        assert_eq!(progress.percentage, 100.0);
        assert_eq!(progress.results_count, 42);
        assert_eq!(progress.status, Status::Running);

        let Ok(BenchEvent::Summary(summary)) = &events[1] else {
            panic!("expected summary, got {:?}", events[1]);
        };
        assert_eq!(summary.queries_executed, 1);
        assert_eq!(summary.results_count, 42);
        assert_eq!(summary.p50_ms, summary.p95_ms);
        assert_eq!(summary.p95_ms, summary.p99_ms);
    }

    #[tokio::test]
    async fn n_progress_events_then_one_summary() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let lookup = move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<u64, LookupError>(12)
        };

        let events = collect(3, lookup).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(events.len(), 4);

        let expected_pct = [33.3, 66.7, 100.0];
        let mut running_total = 0.0;
        let mut per_call_sum = 0.0;
        for (i, event) in events[..3].iter().enumerate() {
            let Ok(BenchEvent::Progress(p)) = event else {
                panic!("expected progress at {i}");
            };
            assert_eq!(p.progress, i as u32 + 1);
            assert_eq!(p.total, 3);
            assert_eq!(p.percentage, expected_pct[i]);
            assert!(p.total_time >= running_total);
            running_total = p.total_time;
            per_call_sum += p.current_query_time;
        }

        let Ok(BenchEvent::Summary(s)) = &events[3] else {
            panic!("expected summary last");
        };
        assert_eq!(s.queries_executed, 3);
        assert!(s.p50_ms <= s.p95_ms && s.p95_ms <= s.p99_ms);
        assert_eq!(s.total_execution_time_ms, running_total);
        // Each rounded per-call value is off by at most half a hundredth
        assert!((s.total_execution_time_ms - per_call_sum).abs() <= 0.02);
    }

    #[tokio::test]
    async fn percentages_round_ties_to_even() {
        let events = collect(16, || Ok::<u64, LookupError>(1)).await;
        let pct: Vec<f64> = events
            .iter()
            .filter_map(|e| match e {
                Ok(BenchEvent::Progress(p)) => Some(p.percentage),
                _ => None,
            })
            .collect();

        assert_eq!(pct.len(), 16);
        assert_eq!(pct[0], 6.2);
        assert_eq!(pct[2], 18.8);
        assert_eq!(pct[4], 31.2);
        assert_eq!(pct[15], 100.0);
    }

    #[tokio::test]
    async fn slow_lookup_shows_in_latency() {
        let lookup = || {
            std::thread::sleep(std::time::Duration::from_millis(5));
            Ok::<u64, LookupError>(1)
        };

        let events = collect(2, lookup).await;
        let Ok(BenchEvent::Summary(s)) = &events[2] else {
            panic!("expected summary");
        };
        assert!(s.p50_ms >= 5.0);
        assert!(s.total_execution_time_ms >= 10.0);
    }

    #[tokio::test]
    async fn zero_invocations_emit_only_summary() {
        let events = collect(0, || -> Result<u64, LookupError> {
            panic!("lookup must not run")
        })
        .await;

        assert_eq!(events.len(), 1);
        let Ok(BenchEvent::Summary(s)) = &events[0] else {
            panic!("expected summary");
        };
        assert_eq!(s.queries_executed, 0);
        assert_eq!(s.p99_ms, 0.0);
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn lookup_failure_aborts_without_summary() {
        let mut n = 0u32;
        let lookup = move || {
            n += 1;
            if n == 3 {
                Err(LookupError::Backend("connection reset".into()))
            } else {
                Ok(5u64)
            }
        };

        let events = collect(10, lookup).await;
        assert_eq!(events.len(), 3);
        assert!(events[..2].iter().all(|e| matches!(e, Ok(BenchEvent::Progress(_)))));
        match &events[2] {
            Err(BenchError::Lookup { invocation, .. }) => assert_eq!(*invocation, 3),
            other => panic!("expected lookup error, got {other:?}"),
        }
        assert!(logs_contain("benchmark aborted"));
    }

    #[tokio::test]
    async fn stream_is_lazy() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let mut stream = Box::pin(run_benchmark(50, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<u64, LookupError>(0)
        }));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        stream.next().await;
        stream.next().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        // Dropping mid-run is the only teardown
        drop(stream);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn yields_to_scheduler_between_events() {
        let ticks = Arc::new(AtomicU32::new(0));
        let ticker = ticks.clone();
        let background = tokio::spawn(async move {
            loop {
                ticker.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
            }
        });

        let events = collect(5, || Ok::<u64, LookupError>(1)).await;
        background.abort();

        assert_eq!(events.len(), 6);
        // The spawned task can only run when the stream suspends
        assert!(ticks.load(Ordering::SeqCst) >= 5);
    }
}
