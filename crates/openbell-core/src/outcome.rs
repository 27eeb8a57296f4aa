//! Outcome tables: bit-string → count mappings from executed experiments.
//!
//! # Bit ordering
//!
//! The backend convention places register 0 in the **rightmost** string
//! position: the digit at position `i` of an outcome string of length `len`
//! belongs to register `len - 1 - i`. Decoding therefore reverses the string
//! before indexing by register number. This is a genuine backend convention,
//! not a bug, and every aggregation routine in [`crate::analysis`] depends on
//! it — do not "fix" it.

use serde::Serialize;
use std::collections::BTreeMap;

/// Immutable mapping from outcome bit-string to occurrence count for one
/// executed experiment. Missing keys read as count 0 — an outcome that never
/// occurred is a legitimate statistical result at low shot counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeTable {
    counts: BTreeMap<String, u64>,
    measured: bool,
}

impl OutcomeTable {
    /// Table from raw counts produced by an executor.
    pub fn from_counts(counts: BTreeMap<String, u64>) -> Self {
        Self {
            counts,
            measured: true,
        }
    }

    /// Table from `(outcome, count)` pairs.
    pub fn from_pairs(pairs: &[(&str, u64)]) -> Self {
        Self::from_counts(
            pairs
                .iter()
                .map(|&(outcome, count)| (outcome.to_string(), count))
                .collect(),
        )
    }

    /// Sentinel table for a composed experiment with no measurement
    /// operations. Substituted locally instead of surfacing a decode error.
    pub fn no_measurement() -> Self {
        Self {
            counts: BTreeMap::new(),
            measured: false,
        }
    }

    /// False only for the [`no_measurement`](Self::no_measurement) sentinel.
    pub fn is_measured(&self) -> bool {
        self.measured
    }

    /// Count for one outcome string; 0 when absent.
    pub fn count(&self, outcome: &str) -> u64 {
        self.counts.get(outcome).copied().unwrap_or(0)
    }

    /// Sum of all counts. Equals the shot count for a well-formed table.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Length of the outcome strings, i.e. the number of measured registers.
    /// `None` for a table without entries.
    pub fn outcome_len(&self) -> Option<usize> {
        self.counts.keys().next().map(|k| k.len())
    }

    /// Iterate `(outcome, count)` pairs in lexicographic outcome order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

/// Digit of `outcome` for one register, following the reversed-string
/// convention: register 0 is the rightmost character.
///
/// Panics if `register` is out of range or the character is not binary;
/// callers index registers they know the experiment measured.
pub fn register_digit(outcome: &str, register: usize) -> u8 {
    let bytes = outcome.as_bytes();
    match bytes[bytes.len() - 1 - register] {
        b'0' => 0,
        b'1' => 1,
        other => panic!("non-binary outcome digit {:?}", other as char),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_read_as_zero() {
        let table = OutcomeTable::from_pairs(&[("00", 600), ("11", 400)]);
        assert_eq!(table.count("01"), 0);
        assert_eq!(table.count("00"), 600);
        assert_eq!(table.total(), 1000);
    }

    #[test]
    fn sentinel_is_unmeasured_and_empty() {
        let sentinel = OutcomeTable::no_measurement();
        assert!(!sentinel.is_measured());
        assert_eq!(sentinel.total(), 0);
        assert_eq!(sentinel.outcome_len(), None);
    }

    #[test]
    fn register_digit_reverses_string_positions() {
        // "10" means register 1 fired, register 0 did not.
        assert_eq!(register_digit("10", 0), 0);
        assert_eq!(register_digit("10", 1), 1);
        // Register 0 is always the rightmost character.
        assert_eq!(register_digit("0001", 0), 1);
        assert_eq!(register_digit("1000", 3), 1);
    }

    #[test]
    fn outcome_len_matches_measured_registers() {
        let table = OutcomeTable::from_pairs(&[("0101", 1)]);
        assert_eq!(table.outcome_len(), Some(4));
    }
}
