//! Per-instance function block state.
//!
//! Block state is stored in a side table keyed by element id rather than
//! inline in the rung, so multiple visual occurrences of the same timer or
//! counter id share one instance. Instances are created lazily on first
//! evaluation and dropped wholesale on reset or program load.

use ladder_common::image::SymbolId;
use ladder_stdlib::{Ctd, Ctu, Ctud, Rs, Sr, Tof, Ton, Tp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One stateful block instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockInstance {
    /// On-delay timer.
    Ton(Ton),
    /// Off-delay timer.
    Tof(Tof),
    /// Pulse timer.
    Tp(Tp),
    /// Up counter.
    Ctu(Ctu),
    /// Down counter.
    Ctd(Ctd),
    /// Up/down counter.
    Ctud(Ctud),
    /// Set-dominant bistable.
    Sr(Sr),
    /// Reset-dominant bistable.
    Rs(Rs),
}

/// Side table of block instances keyed by element id.
///
/// An id that changes block kind between scans (a loader quirk) gets a
/// fresh instance of the new kind; stale state never leaks across kinds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockTable {
    blocks: HashMap<SymbolId, BlockInstance>,
}

macro_rules! accessor {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $ty:ty) => {
        $(#[$doc])*
        pub fn $name(&mut self, id: &str) -> &mut $ty {
            let slot = self
                .blocks
                .entry(id.to_owned())
                .or_insert_with(|| BlockInstance::$variant(<$ty>::new()));
            if !matches!(slot, BlockInstance::$variant(_)) {
                *slot = BlockInstance::$variant(<$ty>::new());
            }
            match slot {
                BlockInstance::$variant(block) => block,
                _ => unreachable!(),
            }
        }
    };
}

impl BlockTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    accessor!(
        /// The TON instance for `id`, created on first use.
        ton, Ton, Ton
    );
    accessor!(
        /// The TOF instance for `id`, created on first use.
        tof, Tof, Tof
    );
    accessor!(
        /// The TP instance for `id`, created on first use.
        tp, Tp, Tp
    );
    accessor!(
        /// The CTU instance for `id`, created on first use.
        ctu, Ctu, Ctu
    );
    accessor!(
        /// The CTD instance for `id`, created on first use.
        ctd, Ctd, Ctd
    );
    accessor!(
        /// The CTUD instance for `id`, created on first use.
        ctud, Ctud, Ctud
    );
    accessor!(
        /// The SR instance for `id`, created on first use.
        sr, Sr, Sr
    );
    accessor!(
        /// The RS instance for `id`, created on first use.
        rs, Rs, Rs
    );

    /// Look up an instance without creating it.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&BlockInstance> {
        self.blocks.get(id)
    }

    /// Number of live instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True if no instance exists yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Drop every instance, returning all block state to defaults.
    pub fn reset(&mut self) {
        self.blocks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instances_created_lazily() {
        let mut table = BlockTable::new();
        assert!(table.is_empty());

        table.ton("t1");
        table.ctu("c1");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_same_id_shares_state() {
        let mut table = BlockTable::new();

        table.ctu("c1").step(true, false, 10);
        table.ctu("c1").step(false, false, 10);
        let (_, cv) = table.ctu("c1").step(true, false, 10);
        assert_eq!(cv, 2);
    }

    #[test]
    fn test_kind_change_gets_fresh_instance() {
        let mut table = BlockTable::new();

        table.ctu("x").step(true, false, 10);
        assert_eq!(table.ctu("x").cv(), 1);

        // Same id used as a timer: counter state is discarded
        assert_eq!(table.ton("x").et(), 0);
        assert_eq!(table.len(), 1);

        // And back again: counting restarts
        assert_eq!(table.ctu("x").cv(), 0);
    }

    #[test]
    fn test_reset_drops_all_state() {
        let mut table = BlockTable::new();
        table.sr("m").step(true, false);
        assert!(table.sr("m").q());

        table.reset();
        assert!(table.is_empty());
        assert!(!table.sr("m").q());
    }
}
