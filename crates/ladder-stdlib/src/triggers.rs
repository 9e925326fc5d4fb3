//! Edge detection function blocks (R_TRIG, F_TRIG).
//!
//! The counters and the pulse timer embed these; they are also usable
//! directly from application logic that reacts to transitions rather than
//! levels. Output is true for exactly the scan in which the edge occurs.

use serde::{Deserialize, Serialize};

/// Rising edge trigger (R_TRIG).
///
/// `step` returns true only on a FALSE to TRUE transition of `clk`,
/// detected against the value seen on the previous step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RTrig {
    prev: bool,
}

impl RTrig {
    /// Create a trigger with no edge pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Step once; returns true on a rising edge of `clk`.
    pub fn step(&mut self, clk: bool) -> bool {
        let edge = clk && !self.prev;
        self.prev = clk;
        edge
    }

    /// The trigger value captured on the previous step.
    #[must_use]
    pub fn prev(&self) -> bool {
        self.prev
    }

    /// Forget the captured trigger value.
    pub fn reset(&mut self) {
        self.prev = false;
    }
}

/// Falling edge trigger (F_TRIG).
///
/// `step` returns true only on a TRUE to FALSE transition of `clk`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FTrig {
    prev: bool,
}

impl FTrig {
    /// Create a trigger with no edge pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Step once; returns true on a falling edge of `clk`.
    pub fn step(&mut self, clk: bool) -> bool {
        let edge = !clk && self.prev;
        self.prev = clk;
        edge
    }

    /// The trigger value captured on the previous step.
    #[must_use]
    pub fn prev(&self) -> bool {
        self.prev
    }

    /// Forget the captured trigger value.
    pub fn reset(&mut self) {
        self.prev = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rtrig_fires_once_per_edge() {
        let mut trig = RTrig::new();

        assert!(!trig.step(false));
        assert!(trig.step(true));
        // Held high: no further edges
        assert!(!trig.step(true));
        assert!(!trig.step(true));
        assert!(!trig.step(false));
        assert!(trig.step(true));
    }

    #[test]
    fn test_rtrig_initial_high_counts_as_edge() {
        // A fresh trigger has prev == false, so the first high step is an edge
        let mut trig = RTrig::new();
        assert!(trig.step(true));
    }

    #[test]
    fn test_ftrig_fires_on_fall() {
        let mut trig = FTrig::new();

        assert!(!trig.step(false));
        assert!(!trig.step(true));
        assert!(trig.step(false));
        assert!(!trig.step(false));
    }

    #[test]
    fn test_reset_rearms() {
        let mut trig = RTrig::new();
        trig.step(true);
        trig.reset();
        assert!(!trig.prev());
        assert!(trig.step(true));
    }
}
