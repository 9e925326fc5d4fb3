#![doc = "Ladder program model and deterministic scan evaluation."]
//!
//! A [`program::Program`] is an ordered list of rungs of elements. Each
//! scan, the [`eval::ProgramEvaluator`] walks the rungs in the order
//! produced by [`order::resolve`], evaluating every rung as a left-to-right
//! series chain against a working copy of the I/O image. Per-instance
//! function block state (timer accumulation, counter values, latch memory)
//! lives in a [`blocks::BlockTable`] keyed by element id, so repeated
//! occurrences of the same id share one instance.

pub mod blocks;
pub mod eval;
pub mod order;
pub mod program;

pub use blocks::BlockTable;
pub use eval::{ProgramEvaluator, RungResult, ScanResult};
pub use order::resolve;
pub use program::{
    CounterMode, Element, ElementKind, Geometry, LatchMode, Program, Rung, TimerMode,
};
