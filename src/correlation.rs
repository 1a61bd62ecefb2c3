//! Per-test correlation context and process-wide execution statistics.
//!
//! Every logical test owns an [`ExecutionContext`] for its lifetime. The
//! context hands out correlation IDs (`<testId>-R<seq>`) that join request
//! and response log lines, counts outbound calls, and on completion folds
//! its aggregates into a shared [`StatsRegistry`].
//!
//! The context is an owned value passed to the executor rather than
//! ambient thread-local state, so ownership of the per-test data is
//! visible in every signature that touches it.

use crate::logging::{log_debug, log_info, log_warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Tests slower than this show up in the summary report.
const SLOW_TEST_THRESHOLD: Duration = Duration::from_secs(5);

/// Correlation state for one logical test execution.
///
/// Created at test start, carried through every executor call, consumed by
/// [`finish`](Self::finish) at test end. Two contexts never share state;
/// their test IDs are random, so IDs from concurrent executions do not
/// collide.
#[derive(Debug)]
pub struct ExecutionContext {
    test_id: String,
    test_class: String,
    test_method: String,
    started_at: Instant,
    call_count: u32,
}

impl ExecutionContext {
    /// Initialize a fresh context for one test execution.
    ///
    /// Generates a short random test ID, zeroes the call counter, and
    /// records the start instant.
    pub fn start(test_class: &str, test_method: &str) -> Self {
        let test_id = generate_test_id();
        log_debug!(
            test_id = %test_id,
            test = %format!("{test_class}.{test_method}"),
            "Test execution started"
        );
        Self {
            test_id,
            test_class: test_class.to_string(),
            test_method: test_method.to_string(),
            started_at: Instant::now(),
            call_count: 0,
        }
    }

    /// Register an outbound call and return its correlation ID.
    ///
    /// IDs are strictly increasing and unique within this context, e.g.
    /// `"3F2A9C1B-R001"`, `"3F2A9C1B-R002"`.
    pub fn register_call(&mut self) -> String {
        self.call_count += 1;
        format!("{}-R{:03}", self.test_id, self.call_count)
    }

    /// Number of calls registered so far.
    pub fn call_count(&self) -> u32 {
        self.call_count
    }

    /// Time since the context was started.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// The short random identifier embedded in correlation IDs.
    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    /// `Class.method` form used as the statistics key.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.test_class, self.test_method)
    }

    /// Complete this execution, recording its aggregates into `stats`.
    ///
    /// Consumes the context; the per-test state dies here while the
    /// registry keeps the durable summary.
    pub fn finish(self, stats: &StatsRegistry, passed: bool, failure_reason: Option<&str>) {
        let duration = self.started_at.elapsed();
        let full_name = self.full_name();

        let status = if passed { "PASS" } else { "FAIL" };
        log_debug!(
            test = %full_name,
            status = status,
            duration_ms = duration.as_millis() as u64,
            api_calls = self.call_count,
            "Test execution finished"
        );
        if !passed {
            if let Some(reason) = failure_reason {
                log_debug!(test = %full_name, reason = %reason, "Test failure reason");
            }
        }

        stats.record(ExecutionStats {
            test_id: self.test_id,
            test_name: full_name,
            duration,
            call_count: self.call_count,
            passed,
            failure_reason: failure_reason.map(str::to_string),
        });
    }
}

/// Aggregates for one completed test execution.
#[derive(Debug, Clone)]
pub struct ExecutionStats {
    pub test_id: String,
    pub test_name: String,
    pub duration: Duration,
    pub call_count: u32,
    pub passed: bool,
    pub failure_reason: Option<String>,
}

/// Suite-wide totals derived from the registry.
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub total_duration: Duration,
    pub total_calls: u64,
    /// Slowest tests above [`SLOW_TEST_THRESHOLD`], worst first, capped at 5.
    pub slow_tests: Vec<(String, Duration)>,
}

/// Process-wide, concurrency-safe collection of per-test statistics.
///
/// Cloning the registry clones the handle, not the data; all clones share
/// one map. Many concurrently finishing tests may record at once.
#[derive(Debug, Clone, Default)]
pub struct StatsRegistry {
    inner: Arc<Mutex<HashMap<String, ExecutionStats>>>,
}

impl StatsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) the stats for one test, keyed by its full name.
    pub fn record(&self, stats: ExecutionStats) {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(stats.test_name.clone(), stats);
    }

    /// Snapshot of every recorded entry.
    pub fn all(&self) -> Vec<ExecutionStats> {
        let map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        let map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all recorded statistics (typically at suite start).
    pub fn clear(&self) {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.clear();
    }

    /// Compute suite-wide totals and the slow-test list.
    pub fn summary(&self) -> StatsSummary {
        let entries = self.all();
        let mut summary = StatsSummary {
            total: entries.len(),
            ..StatsSummary::default()
        };

        for stats in &entries {
            summary.total_duration += stats.duration;
            summary.total_calls += u64::from(stats.call_count);
            if stats.passed {
                summary.passed += 1;
            } else {
                summary.failed += 1;
            }
        }

        let mut slow: Vec<(String, Duration)> = entries
            .iter()
            .filter(|s| s.duration > SLOW_TEST_THRESHOLD)
            .map(|s| (s.test_name.clone(), s.duration))
            .collect();
        slow.sort_by(|a, b| b.1.cmp(&a.1));
        slow.truncate(5);
        summary.slow_tests = slow;

        summary
    }

    /// Emit the suite summary through tracing; slow tests log at warn.
    pub fn log_summary(&self) {
        let summary = self.summary();
        if summary.total == 0 {
            return;
        }

        let avg_duration_ms = summary.total_duration.as_millis() as u64 / summary.total as u64;
        let avg_calls = summary.total_calls / summary.total as u64;
        log_info!(
            total_tests = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            total_duration_ms = summary.total_duration.as_millis() as u64,
            total_api_calls = summary.total_calls,
            avg_duration_ms = avg_duration_ms,
            avg_api_calls = avg_calls,
            "Test execution summary"
        );

        for (name, duration) in &summary.slow_tests {
            log_warn!(
                test = %name,
                duration_ms = duration.as_millis() as u64,
                "Slow test"
            );
        }
    }
}

/// 8-char uppercase prefix of a random UUID; short enough to scan in logs,
/// random enough that concurrent executions never collide.
fn generate_test_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}
