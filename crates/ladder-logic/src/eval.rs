//! Rung and program evaluation.
//!
//! A rung is a series AND chain: power enters from the left rail as true
//! and each element either gates it (contacts, timers, counters, latches)
//! or records it (coils, outputs). Coils do not alter power, so a rung
//! with several coils drives each from the power value at the coil's
//! position, which under the series chain is the running power.
//!
//! Reads during a rung come from the image as it stood when the rung
//! started; a rung never observes its own writes. Writes accumulate in a
//! per-rung delta that the program evaluator merges into the working image
//! between rungs, so rungs later in the resolved order do observe them.

use crate::blocks::BlockTable;
use crate::order;
use crate::program::{CounterMode, ElementKind, LatchMode, Program, Rung, TimerMode};
use ladder_common::error::EngineResult;
use ladder_common::faults::{FaultCounters, SoftFault};
use ladder_common::iec_types::TIME;
use ladder_common::image::{Image, SymbolId};
use ladder_common::value::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, trace};

/// Outcome of one rung evaluation.
#[derive(Debug)]
pub struct RungResult {
    /// Power at the right end of the chain.
    pub power: bool,
    /// Writes produced by coils and outputs on this rung.
    pub delta: Image,
}

/// Outcome of one full program scan.
#[derive(Debug)]
pub struct ScanResult {
    /// The working image after every rung ran: inputs plus all writes.
    pub image: Image,
    /// Only the cells the program wrote this scan. Committing the delta
    /// instead of the whole working image keeps concurrent external writes
    /// to untouched cells intact.
    pub delta: Image,
}

/// Read a bit for the evaluator: absent reads false, a type mismatch reads
/// false and is counted.
fn read_bit(image: &Image, id: &str, faults: &FaultCounters) -> bool {
    match image.get(id) {
        None => false,
        Some(value) => value.as_bit().unwrap_or_else(|| {
            faults.record(SoftFault::ImageTypeMismatch);
            false
        }),
    }
}

/// Evaluate one rung against `image`, stepping block state in `blocks`.
///
/// `dt` is the scan delta in nanoseconds; timer presets count scan ticks
/// and are converted against it here.
pub fn eval_rung(
    rung: &Rung,
    blocks: &mut BlockTable,
    image: &Image,
    dt: TIME,
    faults: &FaultCounters,
) -> RungResult {
    let mut power = true;
    let mut delta = Image::new();

    for element in &rung.elements {
        match &element.kind {
            ElementKind::Input => {}

            ElementKind::Contact {
                source,
                normally_open,
            } => {
                let bit = read_bit(image, source, faults);
                let effective = if *normally_open { bit } else { !bit };
                power = power && effective;
            }

            ElementKind::Timer { mode, preset } => {
                let pt = TIME::from(*preset) * dt;
                let (q, _) = match mode {
                    TimerMode::Ton => blocks.ton(&element.id).step(power, pt, dt),
                    TimerMode::Tof => blocks.tof(&element.id).step(power, pt, dt),
                    TimerMode::Tp => blocks.tp(&element.id).step(power, pt, dt),
                };
                power = power && q;
            }

            ElementKind::Counter {
                mode,
                preset,
                reset,
                load,
            } => {
                let r = reset
                    .as_deref()
                    .is_some_and(|id| read_bit(image, id, faults));
                let ld = load
                    .as_deref()
                    .is_some_and(|id| read_bit(image, id, faults));
                let q = match mode {
                    CounterMode::Ctu => blocks.ctu(&element.id).step(power, r, *preset).0,
                    CounterMode::Ctd => blocks.ctd(&element.id).step(power, ld, *preset).0,
                    CounterMode::Ctud => {
                        // Rung power feeds both count inputs; simultaneous
                        // edges cancel, so the value moves via reset and load
                        blocks.ctud(&element.id).step(power, power, r, ld, *preset).0
                    }
                };
                power = power && q;
            }

            ElementKind::Latch { mode, reset } => {
                let r = read_bit(image, reset, faults);
                let q = match mode {
                    LatchMode::Sr => blocks.sr(&element.id).step(power, r),
                    LatchMode::Rs => blocks.rs(&element.id).step(power, r),
                };
                power = power && q;
            }

            ElementKind::Coil { target } => {
                delta.set(target.clone(), Value::Bit(power));
            }

            ElementKind::Output => {
                delta.set(element.id.clone(), Value::Bit(power));
            }

            ElementKind::Unknown => {
                faults.record(SoftFault::UnknownElementKind);
            }
        }
    }

    RungResult { power, delta }
}

/// Evaluates a whole program, one scan at a time.
///
/// Owns the program, its resolved execution order, and all per-instance
/// block state. The scheduler is the only caller during execution, which
/// keeps the single-writer discipline for program state.
#[derive(Debug)]
pub struct ProgramEvaluator {
    program: Program,
    order: Vec<usize>,
    blocks: BlockTable,
    faults: Arc<FaultCounters>,
}

impl ProgramEvaluator {
    /// Create an evaluator with an empty program.
    #[must_use]
    pub fn new(faults: Arc<FaultCounters>) -> Self {
        Self {
            program: Program::default(),
            order: Vec::new(),
            blocks: BlockTable::new(),
            faults,
        }
    }

    /// Install a program.
    ///
    /// Re-validates the single-driver invariant, resolves the execution
    /// order, and drops all block state. On rejection the previous program
    /// stays installed.
    pub fn load(&mut self, program: Program) -> EngineResult<()> {
        program.validate()?;
        self.order = order::resolve(&program);
        info!(
            rungs = program.rungs.len(),
            elements = program.element_count(),
            "program loaded"
        );
        self.program = program;
        self.blocks.reset();
        Ok(())
    }

    /// Run one scan against a snapshot of the I/O image.
    ///
    /// Rungs execute in resolved order; each observes the writes of rungs
    /// before it in that order and nothing from its own position onward.
    pub fn scan(&mut self, inputs: &Image, dt: TIME) -> ScanResult {
        let mut working = inputs.clone();
        let mut delta = Image::new();

        for &idx in &self.order {
            let rung = &self.program.rungs[idx];
            let result = eval_rung(rung, &mut self.blocks, &working, dt, &self.faults);
            trace!(rung = idx, power = result.power, "rung evaluated");
            working.merge(&result.delta);
            delta.merge(&result.delta);
        }

        ScanResult {
            image: working,
            delta,
        }
    }

    /// Drop all block state, as for a controller reset.
    pub fn reset(&mut self) {
        self.blocks.reset();
    }

    /// The installed program.
    #[must_use]
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// The resolved execution order.
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Ids the installed program writes.
    #[must_use]
    pub fn output_ids(&self) -> BTreeSet<SymbolId> {
        self.program.output_ids()
    }

    /// The shared soft-fault counters.
    #[must_use]
    pub fn faults(&self) -> &Arc<FaultCounters> {
        &self.faults
    }
}
