//! Ladder program model.
//!
//! The program structure is produced by an external loader and consumed
//! read-only by the evaluator. Element attributes are immutable during
//! execution; runtime state lives in the block table, keyed by element id.
//! Geometry is carried for the editor and ignored by the engine.
//!
//! Serialization preserves rung order, element order, ids, and every
//! kind-specific attribute, so whatever format the loader reads round-trips
//! through this model without loss.

use ladder_common::error::{EngineError, EngineResult};
use ladder_common::image::SymbolId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Editor placement of an element. Opaque to the evaluator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    /// Horizontal position.
    pub x: i32,
    /// Vertical position.
    pub y: i32,
    /// Optional width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Optional height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Timer flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimerMode {
    /// On-delay.
    Ton,
    /// Off-delay.
    Tof,
    /// Pulse.
    Tp,
}

/// Counter flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CounterMode {
    /// Up counter.
    Ctu,
    /// Down counter.
    Ctd,
    /// Up/down counter.
    Ctud,
}

/// Bistable flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LatchMode {
    /// Set dominant.
    Sr,
    /// Reset dominant.
    Rs,
}

/// Kind-specific element payload.
///
/// Internally tagged so the editor's element records stay flat. Kinds this
/// engine does not know deserialize as [`ElementKind::Unknown`] and pass
/// power through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementKind {
    /// A discrete input marker; does not alter rung power.
    Input,
    /// A discrete output; writes the rung power at its position under `id`.
    Output,
    /// Reads a bit and gates rung power.
    Contact {
        /// The bit observed; by convention equal to the element id.
        source: SymbolId,
        /// Normally open passes the bit as-is, normally closed inverts it.
        #[serde(default = "default_normally_open")]
        normally_open: bool,
    },
    /// Writes the rung power at its position to a named bit.
    Coil {
        /// The bit driven.
        target: SymbolId,
    },
    /// A timer block; gates rung power with its Q output.
    Timer {
        /// Timer flavor.
        mode: TimerMode,
        /// Preset in scan ticks; converted to time via the scan period.
        preset: u32,
    },
    /// A counter block; gates rung power with its Q output.
    Counter {
        /// Counter flavor.
        mode: CounterMode,
        /// Preset value.
        preset: i32,
        /// Bit that forces the value to zero (CTU/CTUD reset input).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reset: Option<SymbolId>,
        /// Bit that loads the preset (CTD/CTUD load input).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        load: Option<SymbolId>,
    },
    /// A bistable instance; set input is rung power, reset is a named bit.
    Latch {
        /// Bistable flavor.
        mode: LatchMode,
        /// Bit driving the reset input.
        reset: SymbolId,
    },
    /// Forward compatibility: anything newer editors emit.
    #[serde(other)]
    Unknown,
}

fn default_normally_open() -> bool {
    true
}

/// An addressable node on a rung.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Symbolic name, unique per program; the address of any block state.
    pub id: SymbolId,
    /// Editor placement.
    #[serde(default)]
    pub geometry: Geometry,
    /// Kind-specific payload.
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl Element {
    fn new(id: impl Into<SymbolId>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            geometry: Geometry::default(),
            kind,
        }
    }

    /// An input marker.
    #[must_use]
    pub fn input(id: impl Into<SymbolId>) -> Self {
        Self::new(id, ElementKind::Input)
    }

    /// An output writing power under its own id.
    #[must_use]
    pub fn output(id: impl Into<SymbolId>) -> Self {
        Self::new(id, ElementKind::Output)
    }

    /// A contact observing its own id.
    #[must_use]
    pub fn contact(id: impl Into<SymbolId>, normally_open: bool) -> Self {
        let id = id.into();
        Self::new(
            id.clone(),
            ElementKind::Contact {
                source: id,
                normally_open,
            },
        )
    }

    /// A coil driving `target`.
    #[must_use]
    pub fn coil(target: impl Into<SymbolId>) -> Self {
        let target = target.into();
        Self::new(target.clone(), ElementKind::Coil { target })
    }

    /// A timer block.
    #[must_use]
    pub fn timer(id: impl Into<SymbolId>, mode: TimerMode, preset: u32) -> Self {
        Self::new(id, ElementKind::Timer { mode, preset })
    }

    /// A counter block with optional reset and load wires.
    #[must_use]
    pub fn counter(
        id: impl Into<SymbolId>,
        mode: CounterMode,
        preset: i32,
        reset: Option<SymbolId>,
        load: Option<SymbolId>,
    ) -> Self {
        Self::new(
            id,
            ElementKind::Counter {
                mode,
                preset,
                reset,
                load,
            },
        )
    }

    /// A bistable instance reset by the named bit.
    #[must_use]
    pub fn latch(id: impl Into<SymbolId>, mode: LatchMode, reset: impl Into<SymbolId>) -> Self {
        Self::new(
            id,
            ElementKind::Latch {
                mode,
                reset: reset.into(),
            },
        )
    }
}

/// One horizontal line of ladder logic, evaluated left to right.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rung {
    /// Elements in series order; the first connects to the left power rail.
    pub elements: Vec<Element>,
}

impl Rung {
    /// Build a rung from elements in series order.
    #[must_use]
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }
}

/// An ordered sequence of rungs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Rungs in source order.
    pub rungs: Vec<Rung>,
}

impl Program {
    /// Build a program from rungs in source order.
    #[must_use]
    pub fn new(rungs: Vec<Rung>) -> Self {
        Self { rungs }
    }

    /// Re-validate the single-driver invariant.
    ///
    /// The loader owns schema validation; the engine only rejects programs
    /// where one bit is the target of more than one coil, which would make
    /// scan results depend on rung order in an unspecified way.
    pub fn validate(&self) -> EngineResult<()> {
        let mut drivers: HashMap<&str, usize> = HashMap::new();
        for (rung_idx, rung) in self.rungs.iter().enumerate() {
            for element in &rung.elements {
                if let ElementKind::Coil { target } = &element.kind {
                    if let Some(&first) = drivers.get(target.as_str()) {
                        return Err(EngineError::MultipleDrivers {
                            id: target.clone(),
                            first,
                            second: rung_idx,
                        });
                    }
                    drivers.insert(target, rung_idx);
                }
            }
        }
        Ok(())
    }

    /// Per-rung sets of coil targets, indexed by rung.
    #[must_use]
    pub fn coils_by_rung(&self) -> Vec<HashSet<&str>> {
        self.rungs
            .iter()
            .map(|rung| {
                rung.elements
                    .iter()
                    .filter_map(|element| match &element.kind {
                        ElementKind::Coil { target } => Some(target.as_str()),
                        _ => None,
                    })
                    .collect()
            })
            .collect()
    }

    /// Per-rung sets of contact sources, indexed by rung.
    #[must_use]
    pub fn contacts_by_rung(&self) -> Vec<HashSet<&str>> {
        self.rungs
            .iter()
            .map(|rung| {
                rung.elements
                    .iter()
                    .filter_map(|element| match &element.kind {
                        ElementKind::Contact { source, .. } => Some(source.as_str()),
                        _ => None,
                    })
                    .collect()
            })
            .collect()
    }

    /// Every id the program writes: coil targets and output element ids.
    #[must_use]
    pub fn output_ids(&self) -> BTreeSet<SymbolId> {
        let mut ids = BTreeSet::new();
        for rung in &self.rungs {
            for element in &rung.elements {
                match &element.kind {
                    ElementKind::Coil { target } => {
                        ids.insert(target.clone());
                    }
                    ElementKind::Output => {
                        ids.insert(element.id.clone());
                    }
                    _ => {}
                }
            }
        }
        ids
    }

    /// Total element count across all rungs.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.rungs.iter().map(|rung| rung.elements.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_driver_accepted() {
        let program = Program::new(vec![
            Rung::new(vec![Element::contact("in1", true), Element::coil("out1")]),
            Rung::new(vec![Element::contact("in2", true), Element::coil("out2")]),
        ]);
        assert!(program.validate().is_ok());
    }

    #[test]
    fn test_multiple_drivers_across_rungs_rejected() {
        let program = Program::new(vec![
            Rung::new(vec![Element::contact("a", true), Element::coil("out")]),
            Rung::new(vec![Element::contact("b", true), Element::coil("out")]),
        ]);

        let err = program.validate().unwrap_err();
        assert_eq!(
            err,
            EngineError::MultipleDrivers {
                id: "out".into(),
                first: 0,
                second: 1,
            }
        );
    }

    #[test]
    fn test_multiple_drivers_same_rung_rejected() {
        let program = Program::new(vec![Rung::new(vec![
            Element::contact("a", true),
            Element::coil("out"),
            Element::coil("out"),
        ])]);
        assert!(program.validate().is_err());
    }

    #[test]
    fn test_contact_and_coil_on_same_id_is_fine() {
        // A latch observes its own coil; that is one driver, not two
        let program = Program::new(vec![Rung::new(vec![
            Element::contact("motor", true),
            Element::coil("motor"),
        ])]);
        assert!(program.validate().is_ok());
    }

    #[test]
    fn test_output_ids_collects_coils_and_outputs() {
        let program = Program::new(vec![
            Rung::new(vec![Element::contact("in", true), Element::coil("c1")]),
            Rung::new(vec![Element::contact("in", true), Element::output("q0")]),
        ]);
        let ids: Vec<_> = program.output_ids().into_iter().collect();
        assert_eq!(ids, vec!["c1".to_string(), "q0".to_string()]);
    }

    #[test]
    fn test_serde_round_trip_preserves_everything() {
        let program = Program::new(vec![Rung::new(vec![
            Element {
                id: "start".into(),
                geometry: Geometry {
                    x: 40,
                    y: 120,
                    width: Some(32),
                    height: None,
                },
                kind: ElementKind::Contact {
                    source: "start".into(),
                    normally_open: false,
                },
            },
            Element::timer("t1", TimerMode::Tof, 7),
            Element::counter("c1", CounterMode::Ctud, 3, Some("rst".into()), None),
            Element::latch("m1", LatchMode::Rs, "stop"),
            Element::coil("motor"),
        ])]);

        let json = serde_json::to_string(&program).unwrap();
        let back: Program = serde_json::from_str(&json).unwrap();
        assert_eq!(back, program);
    }

    #[test]
    fn test_unknown_kind_deserializes_as_unknown() {
        let json = r#"{"rungs":[{"elements":[
            {"id":"x1","geometry":{"x":0,"y":0},"kind":"shift_register","width":8}
        ]}]}"#;

        let program: Program = serde_json::from_str(json).unwrap();
        assert_eq!(program.rungs[0].elements[0].kind, ElementKind::Unknown);
    }

    #[test]
    fn test_contact_defaults_normally_open() {
        let json = r#"{"rungs":[{"elements":[
            {"id":"in1","kind":"contact","source":"in1"}
        ]}]}"#;

        let program: Program = serde_json::from_str(json).unwrap();
        assert_eq!(
            program.rungs[0].elements[0].kind,
            ElementKind::Contact {
                source: "in1".into(),
                normally_open: true,
            }
        );
    }
}
