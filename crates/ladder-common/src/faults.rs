//! Soft-fault accounting.
//!
//! Nothing at scan time is fatal. Runtime anomalies are counted here and
//! surfaced via telemetry; the scan always completes. The counters are
//! shared between the scan worker and external observers, so each sits on
//! its own cache line.

use crossbeam_utils::CachePadded;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Non-fatal anomaly kinds observed during scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftFault {
    /// A rung element of a kind the evaluator does not know; passed through.
    UnknownElementKind,
    /// A typed image read hit a cell of the other type; zero was returned.
    ImageTypeMismatch,
    /// A scan took longer than the scan period; the next scan started late.
    ScanOverrun,
}

impl fmt::Display for SoftFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownElementKind => write!(f, "UNKNOWN_ELEMENT_KIND"),
            Self::ImageTypeMismatch => write!(f, "IMAGE_TYPE_MISMATCH"),
            Self::ScanOverrun => write!(f, "SCAN_OVERRUN"),
        }
    }
}

/// Thread-safe counters, one per [`SoftFault`] kind.
#[derive(Debug, Default)]
pub struct FaultCounters {
    unknown_element: CachePadded<AtomicU64>,
    type_mismatch: CachePadded<AtomicU64>,
    scan_overrun: CachePadded<AtomicU64>,
}

impl FaultCounters {
    /// Create zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, kind: SoftFault) -> &AtomicU64 {
        match kind {
            SoftFault::UnknownElementKind => &self.unknown_element,
            SoftFault::ImageTypeMismatch => &self.type_mismatch,
            SoftFault::ScanOverrun => &self.scan_overrun,
        }
    }

    /// Record one occurrence.
    pub fn record(&self, kind: SoftFault) {
        self.cell(kind).fetch_add(1, Ordering::Relaxed);
    }

    /// Current count for one kind.
    #[must_use]
    pub fn count(&self, kind: SoftFault) -> u64 {
        self.cell(kind).load(Ordering::Relaxed)
    }

    /// Sum over all kinds.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.count(SoftFault::UnknownElementKind)
            + self.count(SoftFault::ImageTypeMismatch)
            + self.count(SoftFault::ScanOverrun)
    }

    /// Immutable snapshot for reporting.
    #[must_use]
    pub fn snapshot(&self) -> FaultSnapshot {
        FaultSnapshot {
            unknown_element: self.count(SoftFault::UnknownElementKind),
            type_mismatch: self.count(SoftFault::ImageTypeMismatch),
            scan_overrun: self.count(SoftFault::ScanOverrun),
        }
    }

    /// Zero every counter.
    pub fn reset(&self) {
        self.unknown_element.store(0, Ordering::Relaxed);
        self.type_mismatch.store(0, Ordering::Relaxed);
        self.scan_overrun.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time copy of the fault counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FaultSnapshot {
    /// Unknown element kinds passed through.
    pub unknown_element: u64,
    /// Typed image reads that hit the other type.
    pub type_mismatch: u64,
    /// Scans that exceeded the scan period.
    pub scan_overrun: u64,
}
