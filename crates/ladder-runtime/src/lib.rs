#![doc = "Scan scheduling and shared I/O for the ladder PLC."]
//!
//! The runtime owns the two halves of the scan cycle: the
//! [`io_table::IoTable`], the one structure shared with external
//! collaborators (fieldbus servers, UIs), and the [`scheduler::ScanEngine`],
//! the single writer that snapshots inputs, evaluates the program, and
//! commits outputs on a fixed period.

pub mod clock;
pub mod io_table;
pub mod scheduler;
pub mod telemetry;

pub use clock::{Clock, ManualClock, StdClock};
pub use io_table::{IoChange, IoTable};
pub use scheduler::{Command, EngineHandle, ScanEngine, ScanEngineBuilder, ScanReport};
pub use telemetry::{ScanTelemetry, TelemetrySnapshot};
