//! Timer function blocks (TON, TOF, TP).
//!
//! All presets and deltas are `TIME` (i64 nanoseconds). A timer advances
//! by the `dt` it is handed each scan; the scheduler hands every scan the
//! nominal scan period, which keeps timer behavior deterministic across
//! runs regardless of actual wall-clock jitter.

use ladder_common::iec_types::TIME;
use serde::{Deserialize, Serialize};

/// On-delay timer (TON).
///
/// Q goes TRUE once the input has been held TRUE for at least `pt`.
/// Releasing the input drops Q immediately and clears the elapsed time.
///
/// ```text
///       +---------------+     +---+
/// IN    |               |     |   |
///    ---+               +-----+   +---
///
///              +--------+
/// Q            |        |
///    ----------+        +-------------
///          pt
/// ```
///
/// The elapsed time accumulates while the input holds and saturates at
/// `pt`, so `q` rises exactly once per activation and never falls while
/// the input stays TRUE.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ton {
    q: bool,
    et: TIME,
}

impl Ton {
    /// Create an idle timer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Step one scan.
    ///
    /// Returns `(q, et)` where `et` is the accumulated time, capped at `pt`.
    pub fn step(&mut self, input: bool, pt: TIME, dt: TIME) -> (bool, TIME) {
        if input {
            if self.et < pt {
                self.et = (self.et + dt).min(pt);
            }
            self.q = self.et >= pt;
        } else {
            self.q = false;
            self.et = 0;
        }
        (self.q, self.et)
    }

    /// Current Q output.
    #[must_use]
    pub fn q(&self) -> bool {
        self.q
    }

    /// Accumulated time.
    #[must_use]
    pub fn et(&self) -> TIME {
        self.et
    }

    /// Return to the idle state.
    pub fn reset(&mut self) {
        self.q = false;
        self.et = 0;
    }
}

/// Off-delay timer (TOF).
///
/// Q follows the input TRUE immediately and holds TRUE for `pt` after the
/// input drops. The remaining hold time reloads to `pt` whenever the input
/// is TRUE and counts down toward zero while it is FALSE.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tof {
    q: bool,
    /// Remaining hold time.
    rem: TIME,
}

impl Tof {
    /// Create an idle timer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Step one scan.
    ///
    /// Returns `(q, remaining)` where `remaining` is the hold time left
    /// before Q drops.
    pub fn step(&mut self, input: bool, pt: TIME, dt: TIME) -> (bool, TIME) {
        if input {
            self.rem = pt;
        } else if self.rem > 0 {
            self.rem = (self.rem - dt).max(0);
        }
        self.q = self.rem > 0;
        (self.q, self.rem)
    }

    /// Current Q output.
    #[must_use]
    pub fn q(&self) -> bool {
        self.q
    }

    /// Remaining hold time.
    #[must_use]
    pub fn remaining(&self) -> TIME {
        self.rem
    }

    /// Return to the idle state.
    pub fn reset(&mut self) {
        self.q = false;
        self.rem = 0;
    }
}

/// Pulse timer (TP).
///
/// A rising edge of the input while idle starts a pulse of duration `pt`.
/// The pulse runs to completion regardless of further input changes and
/// cannot be retriggered until it has finished; the pulse advances only
/// while running, so a level without an edge never starts one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tp {
    q: bool,
    et: TIME,
    trig: crate::triggers::RTrig,
}

impl Tp {
    /// Create an idle timer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Step one scan.
    ///
    /// Returns `(q, et)` where `et` is the elapsed pulse time, zero when
    /// idle.
    pub fn step(&mut self, input: bool, pt: TIME, dt: TIME) -> (bool, TIME) {
        let rising = self.trig.step(input);
        if self.et == 0 {
            if rising {
                // Seed the pulse with this scan's delta
                self.et = dt;
            }
        } else if self.et < pt {
            self.et += dt;
        } else {
            self.et = 0;
        }
        self.q = self.et > 0;
        (self.q, self.et)
    }

    /// Current Q output.
    #[must_use]
    pub fn q(&self) -> bool {
        self.q
    }

    /// Elapsed pulse time, zero when idle.
    #[must_use]
    pub fn et(&self) -> TIME {
        self.et
    }

    /// True while a pulse is in flight.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.et > 0
    }

    /// Return to the idle state.
    pub fn reset(&mut self) {
        self.q = false;
        self.et = 0;
        self.trig.reset();
    }
}
