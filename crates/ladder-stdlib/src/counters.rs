//! Counter function blocks (CTU, CTD, CTUD).
//!
//! Counting happens on rising edges of the count inputs, detected by an
//! embedded [`crate::triggers::RTrig`], so a trigger held high across many
//! scans counts exactly once. Values are `DINT` (i32) with saturating
//! arithmetic.

use ladder_common::iec_types::DINT;
use serde::{Deserialize, Serialize};

use crate::triggers::RTrig;

/// Up counter (CTU).
///
/// Counts up on each rising edge of `cu`; `r` forces the value back to
/// zero and dominates counting. Q is TRUE while the value has reached the
/// preset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ctu {
    cv: DINT,
    q: bool,
    trig: RTrig,
}

impl Ctu {
    /// Create a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Step one scan. Returns `(q, cv)`.
    pub fn step(&mut self, cu: bool, r: bool, pv: DINT) -> (bool, DINT) {
        let edge = self.trig.step(cu);
        if r {
            self.cv = 0;
        } else if edge {
            self.cv = self.cv.saturating_add(1);
        }
        self.q = self.cv >= pv;
        (self.q, self.cv)
    }

    /// Current value.
    #[must_use]
    pub fn cv(&self) -> DINT {
        self.cv
    }

    /// Current Q output.
    #[must_use]
    pub fn q(&self) -> bool {
        self.q
    }

    /// Return to zero with no edge pending.
    pub fn reset(&mut self) {
        self.cv = 0;
        self.q = false;
        self.trig.reset();
    }
}

/// Down counter (CTD).
///
/// Counts down on each rising edge of `cd`; `ld` loads the preset and
/// dominates counting. Q is TRUE while the value is at or below zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ctd {
    cv: DINT,
    q: bool,
    trig: RTrig,
}

impl Ctd {
    /// Create a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Step one scan. Returns `(q, cv)`.
    pub fn step(&mut self, cd: bool, ld: bool, pv: DINT) -> (bool, DINT) {
        let edge = self.trig.step(cd);
        if ld {
            self.cv = pv;
        } else if edge {
            self.cv = self.cv.saturating_sub(1);
        }
        self.q = self.cv <= 0;
        (self.q, self.cv)
    }

    /// Current value.
    #[must_use]
    pub fn cv(&self) -> DINT {
        self.cv
    }

    /// Current Q output.
    #[must_use]
    pub fn q(&self) -> bool {
        self.q
    }

    /// Return to zero with no edge pending.
    pub fn reset(&mut self) {
        self.cv = 0;
        self.q = true;
        self.trig.reset();
    }
}

/// Up/down counter (CTUD).
///
/// Combines CTU and CTD on one value. `r` clears, `ld` loads the preset,
/// and reset dominates load. Simultaneous up and down edges cancel out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ctud {
    cv: DINT,
    qu: bool,
    qd: bool,
    up: RTrig,
    down: RTrig,
}

impl Ctud {
    /// Create a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Step one scan. Returns `(qu, qd, cv)`.
    #[allow(clippy::fn_params_excessive_bools)]
    pub fn step(&mut self, cu: bool, cd: bool, r: bool, ld: bool, pv: DINT) -> (bool, bool, DINT) {
        let up_edge = self.up.step(cu);
        let down_edge = self.down.step(cd);

        if r {
            self.cv = 0;
        } else if ld {
            self.cv = pv;
        } else {
            if up_edge {
                self.cv = self.cv.saturating_add(1);
            }
            if down_edge {
                self.cv = self.cv.saturating_sub(1);
            }
        }

        self.qu = self.cv >= pv;
        self.qd = self.cv <= 0;
        (self.qu, self.qd, self.cv)
    }

    /// Current value.
    #[must_use]
    pub fn cv(&self) -> DINT {
        self.cv
    }

    /// Up output, TRUE while `cv >= pv`.
    #[must_use]
    pub fn qu(&self) -> bool {
        self.qu
    }

    /// Down output, TRUE while `cv <= 0`.
    #[must_use]
    pub fn qd(&self) -> bool {
        self.qd
    }

    /// Return to zero with no edges pending.
    pub fn reset(&mut self) {
        self.cv = 0;
        self.qu = false;
        self.qd = true;
        self.up.reset();
        self.down.reset();
    }
}
