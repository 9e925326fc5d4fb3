//! Read-only scheduler telemetry.
//!
//! The scan worker publishes its counters here; observers read without
//! touching the worker. Each cell sits on its own cache line so readers
//! do not bounce the worker's writes.

use crossbeam_utils::CachePadded;
use ladder_common::mode::RunMode;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::Duration;

/// Shared scheduler counters.
#[derive(Debug, Default)]
pub struct ScanTelemetry {
    scan_count: CachePadded<AtomicU64>,
    overrun_count: CachePadded<AtomicU64>,
    /// Last measured start-to-start scan period in nanoseconds.
    last_period_ns: CachePadded<AtomicU64>,
    run_mode: CachePadded<AtomicU8>,
}

impl ScanTelemetry {
    /// Create zeroed telemetry in STOPPED mode.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one completed scan.
    pub fn record_scan(&self) {
        self.scan_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Publish the measured start-to-start period.
    pub fn record_period(&self, period_ns: u64) {
        self.last_period_ns.store(period_ns, Ordering::Relaxed);
    }

    /// Count one scan overrun.
    pub fn record_overrun(&self) {
        self.overrun_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Publish the scheduler mode.
    pub fn set_mode(&self, mode: RunMode) {
        self.run_mode.store(mode.as_u8(), Ordering::Release);
    }

    /// Total completed scans.
    #[must_use]
    pub fn scan_count(&self) -> u64 {
        self.scan_count.load(Ordering::Relaxed)
    }

    /// Total scan overruns.
    #[must_use]
    pub fn overrun_count(&self) -> u64 {
        self.overrun_count.load(Ordering::Relaxed)
    }

    /// The scheduler mode as last published.
    #[must_use]
    pub fn mode(&self) -> RunMode {
        RunMode::from_u8(self.run_mode.load(Ordering::Acquire))
    }

    /// Point-in-time copy of every counter.
    #[must_use]
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            scan_count: self.scan_count(),
            overrun_count: self.overrun_count(),
            last_scan_period: Duration::from_nanos(self.last_period_ns.load(Ordering::Relaxed)),
            run_mode: self.mode(),
        }
    }
}

/// Immutable telemetry snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    /// Total completed scans.
    pub scan_count: u64,
    /// Total scan overruns.
    pub overrun_count: u64,
    /// Last measured start-to-start scan period.
    pub last_scan_period: Duration,
    /// Scheduler mode.
    pub run_mode: RunMode,
}
