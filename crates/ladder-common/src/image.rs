//! Value-copy I/O image.
//!
//! An [`Image`] is a plain map from symbol to [`Value`]. The thread-safe
//! table in the runtime crate wraps one; the evaluator works on owned
//! copies. Reads of absent keys yield the zero of the requested type, so a
//! dangling contact reference is not an error.

use crate::iec_types::DINT;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Symbolic address of an image cell or rung element.
pub type SymbolId = String;

/// A snapshot of input, output, and memory values keyed by symbol.
///
/// Backed by an ordered map so iteration, `Debug` output, and change
/// notification are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Image {
    cells: BTreeMap<SymbolId, Value>,
}

impl Image {
    /// Create an empty image.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cell.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Value> {
        self.cells.get(id).copied()
    }

    /// Read a bit with zero default.
    ///
    /// Absent keys and type mismatches both read as `false`; callers that
    /// need to distinguish a mismatch should go through [`Image::get`].
    #[must_use]
    pub fn bit(&self, id: &str) -> bool {
        self.get(id).and_then(Value::as_bit).unwrap_or(false)
    }

    /// Read a word with zero default.
    #[must_use]
    pub fn word(&self, id: &str) -> DINT {
        self.get(id).and_then(Value::as_word).unwrap_or(0)
    }

    /// Store a cell, replacing any previous value.
    pub fn set(&mut self, id: impl Into<SymbolId>, value: Value) {
        self.cells.insert(id.into(), value);
    }

    /// Merge a delta onto this image.
    ///
    /// Keys present in `delta` overwrite; keys absent are unchanged.
    pub fn merge(&mut self, delta: &Image) {
        for (id, value) in &delta.cells {
            self.cells.insert(id.clone(), *value);
        }
    }

    /// Remove every cell.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if no cell is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate cells in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&SymbolId, &Value)> {
        self.cells.iter()
    }

    /// Copy the cells named by `ids` into a new image. Absent keys are skipped.
    #[must_use]
    pub fn filtered<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> Image {
        let mut out = Image::new();
        for id in ids {
            if let Some(value) = self.get(id) {
                out.set(id, value);
            }
        }
        out
    }
}

impl FromIterator<(SymbolId, Value)> for Image {
    fn from_iter<T: IntoIterator<Item = (SymbolId, Value)>>(iter: T) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_defaults_on_miss() {
        let image = Image::new();
        assert!(!image.bit("nowhere"));
        assert_eq!(image.word("nowhere"), 0);
        assert_eq!(image.get("nowhere"), None);
    }

    #[test]
    fn test_type_mismatch_reads_as_zero() {
        let mut image = Image::new();
        image.set("w", Value::Word(9));
        assert!(!image.bit("w"));
        assert_eq!(image.word("w"), 9);
    }

    #[test]
    fn test_merge_overwrites_present_keys_only() {
        let mut base = Image::new();
        base.set("a", Value::Bit(true));
        base.set("b", Value::Word(1));

        let mut delta = Image::new();
        delta.set("b", Value::Word(2));
        delta.set("c", Value::Bit(true));

        base.merge(&delta);
        assert_eq!(base.get("a"), Some(Value::Bit(true)));
        assert_eq!(base.get("b"), Some(Value::Word(2)));
        assert_eq!(base.get("c"), Some(Value::Bit(true)));
    }

    #[test]
    fn test_filtered_skips_absent_keys() {
        let mut image = Image::new();
        image.set("out1", Value::Bit(true));
        image.set("in1", Value::Bit(false));

        let outputs = image.filtered(["out1", "out2"]);
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs.get("out1"), Some(Value::Bit(true)));
    }

    #[test]
    fn test_serde_round_trip() {
        let mut image = Image::new();
        image.set("flag", Value::Bit(true));
        image.set("level", Value::Word(-12));

        let json = serde_json::to_string(&image).unwrap();
        let back: Image = serde_json::from_str(&json).unwrap();
        assert_eq!(back, image);
    }
}
