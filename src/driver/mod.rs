//! Harness driver: runs `init` once, then drives `generate` from a fixed
//! pool of worker tasks until the run bounds or a shutdown signal stop it.
mod histogram;
mod summary;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::future::join_all;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::time::Instant;

use crate::config::RunBounds;
use crate::error::{AppError, AppResult, MetricsError, WorkloadError};
use crate::ledger::Receipt;
use crate::shutdown::{ShutdownReceiver, ShutdownSender, setup_deadline_shutdown};
use crate::workload::WorkloadGenerator;

pub use histogram::LatencyHistogram;
pub use summary::{RunSummary, print_summary};

/// Shared count of `generate` calls still allowed.
struct IterationBudget {
    remaining: AtomicU64,
}

impl IterationBudget {
    const fn new(total: u64) -> Self {
        Self {
            remaining: AtomicU64::new(total),
        }
    }

    fn try_take(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| {
                left.checked_sub(1)
            })
            .is_ok()
    }
}

#[derive(Debug)]
struct WorkerStats {
    succeeded: u64,
    failed: u64,
    latency: LatencyHistogram,
    first_error: Option<String>,
}

impl WorkerStats {
    fn new() -> Result<Self, MetricsError> {
        Ok(Self {
            succeeded: 0,
            failed: 0,
            latency: LatencyHistogram::new()?,
            first_error: None,
        })
    }

    fn record(
        &mut self,
        elapsed_us: u64,
        result: Result<Arc<Receipt>, WorkloadError>,
    ) -> Result<(), MetricsError> {
        match result {
            Ok(_) => self.succeeded = self.succeeded.saturating_add(1),
            Err(err) => {
                self.failed = self.failed.saturating_add(1);
                if self.first_error.is_none() {
                    self.first_error = Some(err.to_string());
                }
            }
        }
        self.latency.record(elapsed_us)
    }
}

/// Runs `init`, then the steady state, and returns the aggregated summary.
///
/// The generator is only shared with workers once `init` has returned. A
/// shutdown requested while `init` is running abandons the run and yields an
/// empty summary.
///
/// # Errors
///
/// Returns the `init` error, a failed worker task, or a histogram failure.
pub async fn run(
    mut generator: Box<dyn WorkloadGenerator>,
    bounds: RunBounds,
    shutdown_tx: &ShutdownSender,
) -> AppResult<RunSummary> {
    let mut init_shutdown = shutdown_tx.subscribe();
    let interrupted = tokio::select! {
        biased;
        _ = init_shutdown.recv() => true,
        result = generator.init() => {
            result.map_err(AppError::workload)?;
            shutdown_pending(&mut init_shutdown)
        }
    };
    if interrupted {
        tracing::info!("shutdown requested during init, skipping steady state");
        return Ok(RunSummary {
            workload: generator.kind(),
            concurrency: generator.concurrency(),
            duration: std::time::Duration::ZERO,
            total: 0,
            succeeded: 0,
            failed: 0,
            latency: LatencyHistogram::new().map_err(AppError::metrics)?,
            first_error: None,
        });
    }
    drop(init_shutdown);

    let generator: Arc<dyn WorkloadGenerator> = Arc::from(generator);
    let concurrency = generator.concurrency();
    let budget = bounds
        .iterations
        .map(|iterations| Arc::new(IterationBudget::new(iterations.get())));

    tracing::info!(
        "starting {} workers for workload {}",
        concurrency,
        generator.kind()
    );
    let started = Instant::now();

    let mut handles = Vec::with_capacity(concurrency);
    for worker_id in 0..concurrency {
        let generator = Arc::clone(&generator);
        let budget = budget.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();
        handles.push(tokio::spawn(async move {
            let mut stats = WorkerStats::new()?;
            loop {
                if let Some(budget) = budget.as_deref()
                    && !budget.try_take()
                {
                    break;
                }
                let call_started = Instant::now();
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => break,
                    result = generator.generate(worker_id) => {
                        let elapsed_us =
                            u64::try_from(call_started.elapsed().as_micros()).unwrap_or(u64::MAX);
                        stats.record(elapsed_us, result)?;
                    }
                }
            }
            tracing::debug!("worker {} stopped", worker_id);
            Ok::<WorkerStats, MetricsError>(stats)
        }));
    }

    let deadline = bounds
        .duration
        .map(|duration| setup_deadline_shutdown(shutdown_tx, duration));

    let mut latency = LatencyHistogram::new().map_err(AppError::metrics)?;
    let mut succeeded: u64 = 0;
    let mut failed: u64 = 0;
    let mut first_error = None;
    for joined in join_all(handles).await {
        let stats = joined?.map_err(AppError::metrics)?;
        succeeded = succeeded.saturating_add(stats.succeeded);
        failed = failed.saturating_add(stats.failed);
        latency.merge(&stats.latency).map_err(AppError::metrics)?;
        if first_error.is_none() {
            first_error = stats.first_error;
        }
    }
    let duration = started.elapsed();

    drop(shutdown_tx.send(()));
    if let Some(deadline) = deadline {
        deadline.await?;
    }

    Ok(RunSummary {
        workload: generator.kind(),
        concurrency,
        duration,
        total: succeeded.saturating_add(failed),
        succeeded,
        failed,
        latency,
        first_error,
    })
}

fn shutdown_pending(shutdown_rx: &mut ShutdownReceiver) -> bool {
    match shutdown_rx.try_recv() {
        Ok(()) | Err(TryRecvError::Lagged(_) | TryRecvError::Closed) => true,
        Err(TryRecvError::Empty) => false,
    }
}
