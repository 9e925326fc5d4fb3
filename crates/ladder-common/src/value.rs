//! Tagged value type for the I/O image.
//!
//! Bits and words live in the same flat namespace keyed by symbol. Readers
//! request a type; a mismatch yields the zero of the requested type rather
//! than an error (the caller decides whether to count it as a soft fault).

use crate::iec_types::DINT;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single image cell: a discrete bit or a signed word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// Discrete bit (inputs, outputs, memory bits).
    Bit(bool),
    /// Signed word (analog channels, memory words).
    Word(DINT),
}

impl Value {
    /// Interpret as a bit. Returns `None` on a type mismatch.
    #[must_use]
    pub fn as_bit(self) -> Option<bool> {
        match self {
            Value::Bit(b) => Some(b),
            Value::Word(_) => None,
        }
    }

    /// Interpret as a word. Returns `None` on a type mismatch.
    #[must_use]
    pub fn as_word(self) -> Option<DINT> {
        match self {
            Value::Word(w) => Some(w),
            Value::Bit(_) => None,
        }
    }

    /// True if this cell holds a bit.
    #[must_use]
    pub fn is_bit(self) -> bool {
        matches!(self, Value::Bit(_))
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Bit(false)
    }
}

impl From<bool> for Value {
    fn from(bit: bool) -> Self {
        Value::Bit(bit)
    }
}

impl From<DINT> for Value {
    fn from(word: DINT) -> Self {
        Value::Word(word)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bit(true) => write!(f, "1"),
            Value::Bit(false) => write!(f, "0"),
            Value::Word(w) => write!(f, "{w}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessors() {
        assert_eq!(Value::Bit(true).as_bit(), Some(true));
        assert_eq!(Value::Word(7).as_word(), Some(7));

        // Mismatches yield None; zero-coercion is the caller's policy
        assert_eq!(Value::Word(7).as_bit(), None);
        assert_eq!(Value::Bit(true).as_word(), None);
    }

    #[test]
    fn test_default_is_false_bit() {
        assert_eq!(Value::default(), Value::Bit(false));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Value::from(true), Value::Bit(true));
        assert_eq!(Value::from(-3), Value::Word(-3));
    }

    #[test]
    fn test_serde_round_trip() {
        let bit: Value = serde_json::from_str(r#"{"bit":true}"#).unwrap();
        assert_eq!(bit, Value::Bit(true));

        let word = serde_json::to_string(&Value::Word(42)).unwrap();
        assert_eq!(word, r#"{"word":42}"#);
    }
}
