use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::summary::{compute_summary_stats, summary_lines};
use super::*;
use crate::args::PositiveU64;
use crate::error::{LedgerError, SetupStep};
use crate::shutdown::{ShutdownSender, shutdown_channel};

struct ScriptedWorkload {
    concurrency: usize,
    delay: Duration,
    failing_worker: Option<usize>,
    fail_init: bool,
    init_delay: Duration,
    shutdown_during_init: Option<ShutdownSender>,
    initialized: bool,
    calls: Arc<AtomicU64>,
}

impl ScriptedWorkload {
    fn new(concurrency: usize, calls: &Arc<AtomicU64>) -> Self {
        Self {
            concurrency,
            delay: Duration::from_millis(10),
            failing_worker: None,
            fail_init: false,
            init_delay: Duration::ZERO,
            shutdown_during_init: None,
            initialized: false,
            calls: Arc::clone(calls),
        }
    }
}

#[async_trait]
impl WorkloadGenerator for ScriptedWorkload {
    fn kind(&self) -> &'static str {
        "scripted"
    }

    fn concurrency(&self) -> usize {
        self.concurrency
    }

    async fn init(&mut self) -> Result<(), WorkloadError> {
        if self.fail_init {
            return Err(WorkloadError::Setup {
                step: SetupStep::FundWorkers,
                source: LedgerError::Rejected {
                    message: "insufficient balance".to_owned(),
                },
            });
        }
        if let Some(shutdown_tx) = self.shutdown_during_init.as_ref() {
            drop(shutdown_tx.send(()));
        }
        tokio::time::sleep(self.init_delay).await;
        self.initialized = true;
        Ok(())
    }

    async fn generate(&self, worker_id: usize) -> Result<Arc<Receipt>, WorkloadError> {
        if !self.initialized {
            return Err(WorkloadError::NotInitialized);
        }
        self.calls.fetch_add(1, Ordering::Relaxed);
        tokio::time::sleep(self.delay).await;
        if self.failing_worker == Some(worker_id) {
            return Err(WorkloadError::Call {
                worker: worker_id,
                source: LedgerError::Rejected {
                    message: "out of gas".to_owned(),
                },
            });
        }
        Ok(Arc::new(Receipt::default()))
    }
}

fn iterations(count: u64) -> Result<Option<PositiveU64>, String> {
    PositiveU64::try_from(count)
        .map(Some)
        .map_err(|err| err.to_string())
}

#[tokio::test(start_paused = true)]
async fn iteration_budget_caps_total_calls() -> Result<(), String> {
    let calls = Arc::new(AtomicU64::new(0));
    let (shutdown_tx, _shutdown_rx) = shutdown_channel();
    let bounds = RunBounds {
        duration: None,
        iterations: iterations(25)?,
    };

    let summary = run(Box::new(ScriptedWorkload::new(4, &calls)), bounds, &shutdown_tx)
        .await
        .map_err(|err| err.to_string())?;
    assert_eq!(summary.total, 25);
    assert_eq!(summary.succeeded, 25);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.latency.count(), 25);
    assert_eq!(calls.load(Ordering::Relaxed), 25);
    assert_eq!(summary.concurrency, 4);
    assert_eq!(summary.workload, "scripted");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn duration_bound_stops_workers() -> Result<(), String> {
    let calls = Arc::new(AtomicU64::new(0));
    let (shutdown_tx, _shutdown_rx) = shutdown_channel();
    let bounds = RunBounds {
        duration: Some(Duration::from_secs(1)),
        iterations: None,
    };

    let summary = run(Box::new(ScriptedWorkload::new(2, &calls)), bounds, &shutdown_tx)
        .await
        .map_err(|err| err.to_string())?;
    assert!(summary.total > 0);
    assert!(summary.total <= 200);
    assert!(summary.duration >= Duration::from_secs(1));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn external_shutdown_stops_workers() -> Result<(), String> {
    let calls = Arc::new(AtomicU64::new(0));
    let (shutdown_tx, _shutdown_rx) = shutdown_channel();
    let trigger = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(55)).await;
        drop(trigger.send(()));
    });

    let summary = run(
        Box::new(ScriptedWorkload::new(1, &calls)),
        RunBounds::default(),
        &shutdown_tx,
    )
    .await
    .map_err(|err| err.to_string())?;
    assert!((4..=6).contains(&summary.total));
    assert!(calls.load(Ordering::Relaxed) >= summary.total);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failures_are_counted_per_invocation() -> Result<(), String> {
    let calls = Arc::new(AtomicU64::new(0));
    let (shutdown_tx, _shutdown_rx) = shutdown_channel();
    let mut workload = ScriptedWorkload::new(2, &calls);
    workload.failing_worker = Some(1);
    let bounds = RunBounds {
        duration: Some(Duration::from_millis(100)),
        iterations: None,
    };

    let summary = run(Box::new(workload), bounds, &shutdown_tx)
        .await
        .map_err(|err| err.to_string())?;
    assert!(summary.succeeded > 0);
    assert!(summary.failed > 0);
    assert_eq!(summary.total, summary.succeeded.saturating_add(summary.failed));
    let first_error = summary.first_error.as_deref().unwrap_or_default();
    assert!(first_error.contains("out of gas"));
    Ok(())
}

#[tokio::test]
async fn init_failure_aborts_before_workers_start() {
    let calls = Arc::new(AtomicU64::new(0));
    let (shutdown_tx, _shutdown_rx) = shutdown_channel();
    let mut workload = ScriptedWorkload::new(2, &calls);
    workload.fail_init = true;

    let result = run(Box::new(workload), RunBounds::default(), &shutdown_tx).await;
    assert!(matches!(
        result,
        Err(AppError::Workload(WorkloadError::Setup {
            step: SetupStep::FundWorkers,
            ..
        }))
    ));
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

#[tokio::test(start_paused = true)]
async fn shutdown_sent_by_init_skips_steady_state() -> Result<(), String> {
    let calls = Arc::new(AtomicU64::new(0));
    let (shutdown_tx, _shutdown_rx) = shutdown_channel();
    let mut workload = ScriptedWorkload::new(3, &calls);
    workload.shutdown_during_init = Some(shutdown_tx.clone());
    let bounds = RunBounds {
        duration: Some(Duration::from_secs(60)),
        iterations: None,
    };

    let summary = run(Box::new(workload), bounds, &shutdown_tx)
        .await
        .map_err(|err| err.to_string())?;
    assert_eq!(summary.total, 0);
    assert_eq!(summary.duration, Duration::ZERO);
    assert_eq!(summary.concurrency, 3);
    assert_eq!(calls.load(Ordering::Relaxed), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn shutdown_while_init_waits_cancels_run() -> Result<(), String> {
    let calls = Arc::new(AtomicU64::new(0));
    let (shutdown_tx, _shutdown_rx) = shutdown_channel();
    let mut workload = ScriptedWorkload::new(2, &calls);
    workload.init_delay = Duration::from_secs(5);
    let trigger = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(trigger.send(()));
    });
    let bounds = RunBounds {
        duration: None,
        iterations: iterations(1000)?,
    };

    let started = Instant::now();
    let summary = run(Box::new(workload), bounds, &shutdown_tx)
        .await
        .map_err(|err| err.to_string())?;
    assert_eq!(summary.total, 0);
    assert_eq!(calls.load(Ordering::Relaxed), 0);
    assert!(started.elapsed() < Duration::from_secs(5));
    Ok(())
}

#[test]
fn histogram_reports_percentiles_and_merges() -> Result<(), String> {
    let mut first = LatencyHistogram::new().map_err(|err| err.to_string())?;
    assert_eq!(first.percentiles(), (0, 0, 0));
    assert_eq!(first.min(), 0);

    for value in 1..=100u64 {
        first.record(value.saturating_mul(1000)).map_err(|err| err.to_string())?;
    }
    let mut second = LatencyHistogram::new().map_err(|err| err.to_string())?;
    second.record(0).map_err(|err| err.to_string())?;
    first.merge(&second).map_err(|err| err.to_string())?;

    assert_eq!(first.count(), 101);
    assert_eq!(first.min(), 1);
    let (p50, p90, p99) = first.percentiles();
    assert!(p50 <= p90 && p90 <= p99);
    assert!(first.max() >= 100_000);
    Ok(())
}

#[test]
fn summary_lines_report_rates() -> Result<(), String> {
    let mut latency = LatencyHistogram::new().map_err(|err| err.to_string())?;
    latency.record(1500).map_err(|err| err.to_string())?;
    let summary = RunSummary {
        workload: "contract",
        concurrency: 4,
        duration: Duration::from_secs(2),
        total: 200,
        succeeded: 150,
        failed: 50,
        latency,
        first_error: Some("Worker 1 call error".to_owned()),
    };

    let stats = compute_summary_stats(&summary);
    assert_eq!(stats.success_rate_x100, 7500);
    assert_eq!(stats.avg_tps_x100, 10_000);

    let lines = summary_lines(&summary);
    assert!(lines.contains(&"Successful: 150 (75.00%)".to_owned()));
    assert!(lines.contains(&"Avg TPS: 100.00".to_owned()));
    assert!(lines.iter().any(|line| line.starts_with("Avg Latency: 1.5")));
    assert!(lines.contains(&"First Error: Worker 1 call error".to_owned()));
    Ok(())
}
