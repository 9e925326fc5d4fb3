//! Scan timing metrics.
//!
//! A ring buffer of scan durations with running min/max/mean and percentile
//! queries. Recording is allocation-free so it can sit on the scan path.

use std::time::Duration;

/// Scan execution metrics with a ring buffer for latency tracking.
#[derive(Debug)]
pub struct ScanMetrics {
    /// Ring buffer of scan durations in nanoseconds.
    samples: Box<[u64]>,
    write_pos: usize,
    /// Number of valid samples (saturates at buffer size).
    sample_count: usize,
    total_scans: u64,
    min_ns: u64,
    max_ns: u64,
    sum_ns: u64,
    overrun_count: u64,
    /// Scan period in nanoseconds; durations beyond it count as overruns.
    period_ns: u64,
}

impl ScanMetrics {
    /// Create a collector retaining `histogram_size` samples against the
    /// given scan period.
    #[must_use]
    pub fn new(histogram_size: usize, scan_period: Duration) -> Self {
        let size = histogram_size.max(1);
        Self {
            samples: vec![0u64; size].into_boxed_slice(),
            write_pos: 0,
            sample_count: 0,
            total_scans: 0,
            min_ns: u64::MAX,
            max_ns: 0,
            sum_ns: 0,
            overrun_count: 0,
            period_ns: u64::try_from(scan_period.as_nanos()).unwrap_or(u64::MAX),
        }
    }

    /// Record one scan duration.
    pub fn record(&mut self, duration: Duration) {
        let ns = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);

        self.samples[self.write_pos] = ns;
        self.write_pos = (self.write_pos + 1) % self.samples.len();
        self.sample_count = (self.sample_count + 1).min(self.samples.len());

        self.total_scans += 1;
        self.min_ns = self.min_ns.min(ns);
        self.max_ns = self.max_ns.max(ns);
        self.sum_ns = self.sum_ns.wrapping_add(ns);

        if ns > self.period_ns {
            self.overrun_count += 1;
        }
    }

    /// Total scans recorded.
    #[must_use]
    pub fn total_scans(&self) -> u64 {
        self.total_scans
    }

    /// Shortest observed scan, if any.
    #[must_use]
    pub fn min(&self) -> Option<Duration> {
        (self.total_scans > 0).then(|| Duration::from_nanos(self.min_ns))
    }

    /// Longest observed scan, if any.
    #[must_use]
    pub fn max(&self) -> Option<Duration> {
        (self.total_scans > 0).then(|| Duration::from_nanos(self.max_ns))
    }

    /// Mean scan duration, if any.
    #[must_use]
    pub fn mean(&self) -> Option<Duration> {
        (self.total_scans > 0).then(|| Duration::from_nanos(self.sum_ns / self.total_scans))
    }

    /// Scans that exceeded the period.
    #[must_use]
    pub fn overrun_count(&self) -> u64 {
        self.overrun_count
    }

    /// Compute one percentile (0.0 to 100.0) from the retained samples.
    ///
    /// Returns `None` with no samples or an out-of-range percentile.
    #[must_use]
    pub fn percentile(&self, percentile: f64) -> Option<Duration> {
        if self.sample_count == 0 || !(0.0..=100.0).contains(&percentile) {
            return None;
        }

        let mut sorted: Vec<u64> = self.samples[..self.sample_count].to_vec();
        sorted.sort_unstable();

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let idx = ((percentile / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        Some(Duration::from_nanos(sorted[idx.min(sorted.len() - 1)]))
    }

    /// Immutable snapshot for reporting.
    #[must_use]
    pub fn snapshot(&self) -> ScanStats {
        ScanStats {
            total_scans: self.total_scans,
            min_ns: (self.total_scans > 0).then_some(self.min_ns),
            max_ns: (self.total_scans > 0).then_some(self.max_ns),
            mean_ns: (self.total_scans > 0).then(|| self.sum_ns / self.total_scans),
            overrun_count: self.overrun_count,
            sample_count: self.sample_count,
        }
    }

    /// Reset to the initial state.
    pub fn reset(&mut self) {
        self.samples.fill(0);
        self.write_pos = 0;
        self.sample_count = 0;
        self.total_scans = 0;
        self.min_ns = u64::MAX;
        self.max_ns = 0;
        self.sum_ns = 0;
        self.overrun_count = 0;
    }
}

/// Immutable metrics snapshot.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ScanStats {
    /// Total scans recorded.
    pub total_scans: u64,
    /// Minimum scan duration in nanoseconds.
    pub min_ns: Option<u64>,
    /// Maximum scan duration in nanoseconds.
    pub max_ns: Option<u64>,
    /// Mean scan duration in nanoseconds.
    pub mean_ns: Option<u64>,
    /// Scans that exceeded the period.
    pub overrun_count: u64,
    /// Samples currently retained.
    pub sample_count: usize,
}

impl ScanStats {
    /// Jitter (max minus min) in nanoseconds.
    #[must_use]
    pub fn jitter_ns(&self) -> Option<u64> {
        match (self.min_ns, self.max_ns) {
            (Some(min), Some(max)) => Some(max - min),
            _ => None,
        }
    }
}
