use thiserror::Error;

/// Engine error types covering program validation, control, and configuration.
///
/// Runtime anomalies that do not abort a scan (unknown element kinds, image
/// type mismatches, scan overruns) are not errors; they are counted via
/// [`crate::faults::FaultCounters`] and surfaced through telemetry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Two coils drive the same bit. Rejected at program load.
    #[error("multiple coils drive `{id}` (rungs {first} and {second})")]
    MultipleDrivers {
        /// The doubly-driven symbol.
        id: String,
        /// Rung index of the first coil, in program order.
        first: usize,
        /// Rung index of the conflicting coil.
        second: usize,
    },

    /// Invalid run mode transition attempted.
    #[error("invalid run mode transition from {from} to {to}")]
    InvalidModeTransition {
        /// Source mode.
        from: String,
        /// Attempted target mode.
        to: String,
    },

    /// The control channel to the scan worker is gone.
    #[error("control channel closed: {0}")]
    ControlChannel(String),

    /// Failed to spawn the scan worker thread.
    #[error("failed to spawn scan thread: {0}")]
    ThreadSpawn(String),

    /// Configuration or initialization error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
