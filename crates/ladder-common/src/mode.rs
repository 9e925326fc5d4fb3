//! Run mode state machine for the scan scheduler.
//!
//! The scheduler cycles between STOPPED, RUNNING, and SINGLE_STEP. A
//! single-step scan always falls back to STOPPED when it completes, so
//! SINGLE_STEP is only ever observable for one scan.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scheduler run modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunMode {
    /// Not scanning; the worker drains control messages only.
    #[default]
    Stopped,
    /// Cyclic scanning at the configured period.
    Running,
    /// Exactly one scan, then back to STOPPED.
    SingleStep,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "STOPPED"),
            Self::Running => write!(f, "RUNNING"),
            Self::SingleStep => write!(f, "SINGLE_STEP"),
        }
    }
}

impl RunMode {
    /// Check whether a transition to `target` is valid.
    #[must_use]
    pub fn can_transition_to(self, target: RunMode) -> bool {
        use RunMode::{Running, SingleStep, Stopped};

        matches!(
            (self, target),
            (Stopped, Running)
                | (Stopped, SingleStep)
                | (Running, Stopped)
                // Single-step completion
                | (SingleStep, Stopped)
        )
    }

    /// Attempt a transition, returning an error if invalid.
    pub fn transition_to(&mut self, target: RunMode) -> EngineResult<()> {
        if self.can_transition_to(target) {
            *self = target;
            Ok(())
        } else {
            Err(EngineError::InvalidModeTransition {
                from: self.to_string(),
                to: target.to_string(),
            })
        }
    }

    /// True while the scheduler executes scans.
    #[must_use]
    pub fn is_scanning(self) -> bool {
        matches!(self, Self::Running | Self::SingleStep)
    }

    /// Encode for storage in an atomic telemetry cell.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Stopped => 0,
            Self::Running => 1,
            Self::SingleStep => 2,
        }
    }

    /// Decode from an atomic telemetry cell. Unknown encodings read as STOPPED.
    #[must_use]
    pub fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Running,
            2 => Self::SingleStep,
            _ => Self::Stopped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_stop_cycle() {
        let mut mode = RunMode::Stopped;
        assert!(mode.transition_to(RunMode::Running).is_ok());
        assert!(mode.transition_to(RunMode::Stopped).is_ok());
        assert_eq!(mode, RunMode::Stopped);
    }

    #[test]
    fn test_single_step_only_from_stopped() {
        let mut mode = RunMode::Stopped;
        assert!(mode.transition_to(RunMode::SingleStep).is_ok());
        assert!(mode.is_scanning());

        // Completion falls back to STOPPED
        assert!(mode.transition_to(RunMode::Stopped).is_ok());

        mode = RunMode::Running;
        assert!(mode.transition_to(RunMode::SingleStep).is_err());
        assert_eq!(mode, RunMode::Running);
    }

    #[test]
    fn test_self_transition_rejected() {
        let mut mode = RunMode::Running;
        let result = mode.transition_to(RunMode::Running);
        assert!(result.is_err());
    }

    #[test]
    fn test_atomic_encoding_round_trip() {
        for mode in [RunMode::Stopped, RunMode::Running, RunMode::SingleStep] {
            assert_eq!(RunMode::from_u8(mode.as_u8()), mode);
        }
        assert_eq!(RunMode::from_u8(250), RunMode::Stopped);
    }
}
