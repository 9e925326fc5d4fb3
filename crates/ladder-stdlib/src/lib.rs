//! IEC 61131-3 standard function blocks.
//!
//! Every block is a small state machine stepped once per scan:
//!
//! - **Bistables** ([`bistable`]): SR (set dominant), RS (reset dominant)
//! - **Timers** ([`timers`]): TON, TOF, TP
//! - **Counters** ([`counters`]): CTU, CTD, CTUD
//! - **Edge triggers** ([`triggers`]): R_TRIG, F_TRIG
//!
//! Time values are `TIME` (i64 nanoseconds); the rung evaluator derives
//! the preset from the element's tick count and the scan period. Blocks
//! carry their own edge-detection state, so the same instance stepped with
//! a held-high trigger counts exactly once.

pub mod bistable;
pub mod counters;
pub mod timers;
pub mod triggers;

pub use bistable::{Rs, Sr};
pub use counters::{Ctd, Ctu, Ctud};
pub use timers::{Tof, Ton, Tp};
pub use triggers::{FTrig, RTrig};
