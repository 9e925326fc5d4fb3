//! Bistable function blocks (SR, RS).
//!
//! Memory cells with set and reset inputs. The two differ only in which
//! input wins when both are true on the same scan:
//!
//! - [`Sr`]: set dominant, `Q := SET OR (Q AND NOT RESET)`
//! - [`Rs`]: reset dominant, `Q := NOT RESET AND (Q OR SET)`
//!
//! Both expose `Q` and its complement.

use serde::{Deserialize, Serialize};

/// Set-dominant bistable (SR).
///
/// With both inputs true the output latches TRUE.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sr {
    q: bool,
}

impl Sr {
    /// Create an SR latch with Q low.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Step once and return the new Q.
    pub fn step(&mut self, set: bool, reset: bool) -> bool {
        self.q = set || (self.q && !reset);
        self.q
    }

    /// Current Q output.
    #[must_use]
    pub fn q(&self) -> bool {
        self.q
    }

    /// Complement of Q.
    #[must_use]
    pub fn not_q(&self) -> bool {
        !self.q
    }

    /// Drop the latched state.
    pub fn reset(&mut self) {
        self.q = false;
    }
}

/// Reset-dominant bistable (RS).
///
/// With both inputs true the output drops FALSE.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rs {
    q: bool,
}

impl Rs {
    /// Create an RS latch with Q low.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Step once and return the new Q.
    pub fn step(&mut self, set: bool, reset: bool) -> bool {
        self.q = !reset && (self.q || set);
        self.q
    }

    /// Current Q output.
    #[must_use]
    pub fn q(&self) -> bool {
        self.q
    }

    /// Complement of Q.
    #[must_use]
    pub fn not_q(&self) -> bool {
        !self.q
    }

    /// Drop the latched state.
    pub fn reset(&mut self) {
        self.q = false;
    }
}
