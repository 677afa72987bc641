use hdrhistogram::Histogram;

use crate::error::MetricsError;

/// Significant figures kept by the latency histogram.
const SIGNIFICANT_FIGURES: u8 = 3;

/// Latency histogram in microseconds.
#[derive(Debug)]
pub struct LatencyHistogram {
    hist: Histogram<u64>,
}

impl LatencyHistogram {
    /// # Errors
    ///
    /// Returns an error if the histogram cannot be created.
    pub fn new() -> Result<Self, MetricsError> {
        let hist = Histogram::<u64>::new(SIGNIFICANT_FIGURES).map_err(|err| {
            MetricsError::Histogram {
                context: "create",
                source: Box::new(err),
            }
        })?;
        Ok(Self { hist })
    }

    /// Records one latency sample; zero is clamped to 1µs.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be recorded.
    pub fn record(&mut self, latency_us: u64) -> Result<(), MetricsError> {
        self.hist
            .record(latency_us.max(1))
            .map_err(|err| MetricsError::Histogram {
                context: "record",
                source: Box::new(err),
            })
    }

    /// # Errors
    ///
    /// Returns an error if the merge fails.
    pub fn merge(&mut self, other: &LatencyHistogram) -> Result<(), MetricsError> {
        self.hist
            .add(&other.hist)
            .map_err(|err| MetricsError::Histogram {
                context: "merge",
                source: Box::new(err),
            })
    }

    /// p50, p90 and p99 in microseconds, zero when empty.
    #[must_use]
    pub fn percentiles(&self) -> (u64, u64, u64) {
        if self.count() == 0 {
            return (0, 0, 0);
        }

        (
            self.hist.value_at_quantile(0.5),
            self.hist.value_at_quantile(0.9),
            self.hist.value_at_quantile(0.99),
        )
    }

    #[must_use]
    pub fn min(&self) -> u64 {
        if self.count() == 0 { 0 } else { self.hist.min() }
    }

    #[must_use]
    pub fn max(&self) -> u64 {
        self.hist.max()
    }

    /// Mean latency; float-to-int casts saturate, so NaN reads as zero.
    #[must_use]
    pub fn mean(&self) -> u64 {
        self.hist.mean() as u64
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.hist.len()
    }
}
