use std::time::Duration;

use super::LatencyHistogram;

/// Aggregated outcome of a steady-state run.
#[derive(Debug)]
pub struct RunSummary {
    pub workload: &'static str,
    pub concurrency: usize,
    pub duration: Duration,
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub latency: LatencyHistogram,
    pub first_error: Option<String>,
}

pub(crate) struct SummaryStats {
    pub(crate) success_rate_x100: u64,
    pub(crate) avg_tps_x100: u64,
}

pub(crate) fn compute_summary_stats(summary: &RunSummary) -> SummaryStats {
    let duration_ms = summary.duration.as_millis().max(1);
    let total = summary.total;

    let success_rate_x100 = if total > 0 {
        let scaled = u128::from(summary.succeeded)
            .saturating_mul(10_000)
            .checked_div(u128::from(total))
            .unwrap_or(0);
        u64::try_from(scaled).map_or(u64::MAX, |value| value)
    } else {
        0
    };

    let avg_tps_x100 = if total > 0 {
        let scaled = u128::from(total)
            .saturating_mul(100_000)
            .checked_div(duration_ms)
            .unwrap_or(0);
        u64::try_from(scaled).map_or(u64::MAX, |value| value)
    } else {
        0
    };

    SummaryStats {
        success_rate_x100,
        avg_tps_x100,
    }
}

pub(crate) fn summary_lines(summary: &RunSummary) -> Vec<String> {
    let stats = compute_summary_stats(summary);
    let (p50, p90, p99) = summary.latency.percentiles();

    let mut lines = vec![
        format!("Workload: {}", summary.workload),
        format!("Concurrency: {}", summary.concurrency),
        format!("Duration: {}s", summary.duration.as_secs()),
        format!("Total Requests: {}", summary.total),
        format!(
            "Successful: {} ({}.{:02}%)",
            summary.succeeded,
            stats.success_rate_x100 / 100,
            stats.success_rate_x100 % 100
        ),
        format!("Errors: {}", summary.failed),
        format!("Avg Latency: {}", format_us(summary.latency.mean())),
        format!(
            "Min/Max Latency: {} / {}",
            format_us(summary.latency.min()),
            format_us(summary.latency.max())
        ),
        format!(
            "P50/P90/P99 Latency: {} / {} / {}",
            format_us(p50),
            format_us(p90),
            format_us(p99)
        ),
        format!(
            "Avg TPS: {}.{:02}",
            stats.avg_tps_x100 / 100,
            stats.avg_tps_x100 % 100
        ),
    ];
    if let Some(err) = &summary.first_error {
        lines.push(format!("First Error: {}", err));
    }
    lines
}

pub fn print_summary(summary: &RunSummary) {
    for line in summary_lines(summary) {
        println!("{}", line);
    }
}

fn format_us(value_us: u64) -> String {
    format!("{}.{:03}ms", value_us / 1000, value_us % 1000)
}
