//! Conditional-probability estimation and violation scoring.
//!
//! Raw outcome counts become conditional probabilities here, and probability
//! tables become a single scalar score against a known classical bound. Two
//! scorer shapes exist and both stay: the expectation-difference form used by
//! the entanglement (CHSH) protocol and the facet-mask form used by the
//! measurement-incompatibility protocol. Their tolerance policies differ on
//! purpose — closeness to a specific quantum value is a different statistical
//! claim than any violation of a classical bound — and are kept per-protocol.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::outcome::{OutcomeTable, register_digit};

/// Maximum CHSH score under any local-hidden-variable strategy.
pub const CHSH_CLASSICAL_BOUND: f64 = 2.0;

/// Maximum CHSH score achievable quantumly (Tsirelson bound, 2√2).
pub const CHSH_QUANTUM_BOUND: f64 = 2.0 * std::f64::consts::SQRT_2;

/// Classical bound for the 4-setting measurement-incompatibility facet.
pub const BB84_CLASSICAL_BOUND: f64 = 6.0;

/// Facet masks selecting which (outcome-bit, setting) cells contribute for
/// each of Bob's settings y. Protocol constants, not derived: row b, column x
/// marks the cell P(b|x) that a noiseless device would maximize under that y.
const FACET_MASK_Y0: [[u8; 4]; 2] = [[1, 0, 1, 0], [0, 1, 0, 1]];
const FACET_MASK_Y1: [[u8; 4]; 2] = [[0, 1, 1, 0], [1, 0, 0, 1]];

/// 2×K conditional-probability matrix: cell (b, x) is the estimated
/// probability of outcome bit `b` on register `x`, for one fixed setting of
/// the other party. Derived fresh from an outcome table, never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CondProbTable {
    probs: [Vec<f64>; 2],
}

impl CondProbTable {
    /// Number of settings K (matrix columns).
    pub fn settings(&self) -> usize {
        self.probs[0].len()
    }

    /// Probability of outcome `bit` under setting `x`.
    pub fn prob(&self, bit: u8, x: usize) -> f64 {
        self.probs[bit as usize][x]
    }

    /// One full row (all settings for a fixed outcome bit).
    pub fn row(&self, bit: u8) -> &[f64] {
        &self.probs[bit as usize]
    }
}

/// Estimate the 2×K conditional-probability matrix from one outcome table.
///
/// Each outcome string is reversed before indexing, so column `x` accumulates
/// the digit of register `x` (the rightmost decoded digit is setting 0). The
/// per-column accumulator must sum to exactly `shots` — anything else means
/// dropped or duplicated repetitions and fails fast rather than silently
/// normalizing.
pub fn conditional_probs(table: &OutcomeTable, shots: u32) -> Result<CondProbTable> {
    let k = table.outcome_len().ok_or(Error::ShotCountMismatch {
        expected: u64::from(shots),
        counted: 0,
    })?;

    let mut acc = [vec![0u64; k], vec![0u64; k]];
    for (outcome, count) in table.iter() {
        if outcome.len() != k {
            return Err(Error::MalformedOutcome(outcome.to_string()));
        }
        for (x, digit) in outcome.bytes().rev().enumerate() {
            match digit {
                b'0' => acc[0][x] += count,
                b'1' => acc[1][x] += count,
                _ => return Err(Error::MalformedOutcome(outcome.to_string())),
            }
        }
    }

    // Every register fires exactly once per shot, so each column totals the
    // same; checking column 0 checks them all.
    let counted = acc[0][0] + acc[1][0];
    if counted != u64::from(shots) {
        return Err(Error::ShotCountMismatch {
            expected: u64::from(shots),
            counted,
        });
    }

    let probs = acc.map(|row| {
        row.into_iter()
            .map(|count| count as f64 / f64::from(shots))
            .collect()
    });
    Ok(CondProbTable { probs })
}

/// Correlation expectation E = (N00 + N11 − N01 − N10) / shots for a
/// 2-register outcome table. Missing outcomes count as zero.
pub fn chsh_expectation(table: &OutcomeTable, shots: u32) -> f64 {
    let same = table.count("00") + table.count("11");
    let diff = table.count("01") + table.count("10");
    (same as f64 - diff as f64) / f64::from(shots)
}

/// Correlation expectation for one register pair decoded out of a wider
/// outcome table — used when independent experiments are packed into a single
/// composed run.
pub fn pair_expectation(table: &OutcomeTable, pair: (usize, usize), shots: u32) -> f64 {
    let mut signed: i64 = 0;
    for (outcome, count) in table.iter() {
        if register_digit(outcome, pair.0) == register_digit(outcome, pair.1) {
            signed += count as i64;
        } else {
            signed -= count as i64;
        }
    }
    signed as f64 / f64::from(shots)
}

/// Combine the four per-setting expectations as E1 + E2 + E3 − E4.
///
/// Settings are ordered ZW, ZV, XW, XV (the dispatcher's batch order for the
/// entanglement protocol); the minus lands on the XV term. This is the
/// canonical sign pattern — changing it changes which classical and quantum
/// bounds apply.
pub fn chsh_score(expectations: [f64; 4]) -> f64 {
    expectations[0] + expectations[1] + expectations[2] - expectations[3]
}

/// Facet-mask violation score for the measurement-incompatibility test.
///
/// Builds one conditional-probability table per setting y, sums the cells
/// selected by that setting's facet mask across both tables, and subtracts
/// the classical bound of 6. Positive means no local-hidden-variable model
/// can explain the statistics.
pub fn bell_violation(
    counts_y0: &OutcomeTable,
    counts_y1: &OutcomeTable,
    shots_y0: u32,
    shots_y1: u32,
) -> Result<f64> {
    let probs_y0 = conditional_probs(counts_y0, shots_y0)?;
    let probs_y1 = conditional_probs(counts_y1, shots_y1)?;
    for probs in [&probs_y0, &probs_y1] {
        if probs.settings() != 4 {
            return Err(Error::SettingCountMismatch {
                expected: 4,
                got: probs.settings(),
            });
        }
    }
    Ok(masked_sum(&probs_y0, &FACET_MASK_Y0) + masked_sum(&probs_y1, &FACET_MASK_Y1)
        - BB84_CLASSICAL_BOUND)
}

fn masked_sum(probs: &CondProbTable, mask: &[[u8; 4]; 2]) -> f64 {
    let mut sum = 0.0;
    for (bit, row) in mask.iter().enumerate() {
        for (x, &selected) in row.iter().enumerate() {
            if selected == 1 {
                sum += probs.prob(bit as u8, x);
            }
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn four_register_counts() -> OutcomeTable {
        OutcomeTable::from_pairs(&[
            ("1011", 78),
            ("0000", 11),
            ("0001", 103),
            ("1001", 523),
            ("1111", 17),
            ("1100", 14),
            ("0101", 19),
            ("1010", 16),
            ("0111", 3),
            ("1101", 103),
            ("0110", 1),
            ("1110", 5),
            ("1000", 91),
            ("0011", 16),
        ])
    }

    #[test]
    fn conditional_probs_reference_vector() {
        let probs = conditional_probs(&four_register_counts(), 1000).unwrap();
        let expected = [
            [0.138, 0.864, 0.838, 0.153],
            [0.862, 0.136, 0.162, 0.847],
        ];
        for bit in 0..2u8 {
            for x in 0..4 {
                assert!(
                    (probs.prob(bit, x) - expected[bit as usize][x]).abs() < EPS,
                    "cell ({bit}, {x}): {} != {}",
                    probs.prob(bit, x),
                    expected[bit as usize][x]
                );
            }
        }
    }

    #[test]
    fn conditional_probs_small_reference_vector() {
        let counts =
            OutcomeTable::from_pairs(&[("1000", 1), ("0100", 2), ("0010", 3), ("0001", 4)]);
        let probs = conditional_probs(&counts, 10).unwrap();
        let expected = [[0.6, 0.7, 0.8, 0.9], [0.4, 0.3, 0.2, 0.1]];
        for bit in 0..2u8 {
            for x in 0..4 {
                assert!((probs.prob(bit, x) - expected[bit as usize][x]).abs() < EPS);
            }
        }
    }

    #[test]
    fn conditional_probs_columns_sum_to_one() {
        let probs = conditional_probs(&four_register_counts(), 1000).unwrap();
        for x in 0..probs.settings() {
            assert!((probs.prob(0, x) + probs.prob(1, x) - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn conditional_probs_is_pure() {
        let table = four_register_counts();
        let a = conditional_probs(&table, 1000).unwrap();
        let b = conditional_probs(&table, 1000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn conditional_probs_rejects_shot_deficit() {
        let counts = OutcomeTable::from_pairs(&[("00", 400), ("11", 500)]);
        let err = conditional_probs(&counts, 1000).unwrap_err();
        assert_eq!(
            err,
            Error::ShotCountMismatch {
                expected: 1000,
                counted: 900
            }
        );
    }

    #[test]
    fn conditional_probs_rejects_ragged_strings() {
        let counts = OutcomeTable::from_pairs(&[("00", 500), ("111", 500)]);
        assert!(matches!(
            conditional_probs(&counts, 1000),
            Err(Error::MalformedOutcome(_))
        ));
    }

    #[test]
    fn conditional_probs_rejects_empty_table() {
        let err = conditional_probs(&OutcomeTable::no_measurement(), 10).unwrap_err();
        assert_eq!(
            err,
            Error::ShotCountMismatch {
                expected: 10,
                counted: 0
            }
        );
    }

    #[test]
    fn bell_violation_reference_vector() {
        let counts_y0 = OutcomeTable::from_pairs(&[
            ("1010", 515),
            ("0000", 13),
            ("0001", 4),
            ("0010", 90),
            ("0011", 16),
            ("0100", 4),
            ("0110", 20),
            ("0111", 3),
            ("1000", 103),
            ("1001", 13),
            ("1011", 87),
            ("1100", 18),
            ("1101", 3),
            ("1110", 99),
            ("1111", 12),
        ]);
        let counts_y1 = four_register_counts();
        let score = bell_violation(&counts_y0, &counts_y1, 1000, 1000).unwrap();
        assert!((score - 0.806).abs() < EPS, "score = {score}");
    }

    #[test]
    fn bell_violation_rejects_wrong_setting_count() {
        let two_register = OutcomeTable::from_pairs(&[("00", 1000)]);
        let err = bell_violation(&two_register, &two_register, 1000, 1000).unwrap_err();
        assert_eq!(err, Error::SettingCountMismatch { expected: 4, got: 2 });
    }

    #[test]
    fn chsh_expectation_ideal_bell_statistics() {
        let counts = OutcomeTable::from_pairs(&[("00", 500), ("11", 500)]);
        assert!((chsh_expectation(&counts, 1000) - 1.0).abs() < EPS);
    }

    #[test]
    fn chsh_expectation_missing_keys_count_as_zero() {
        let counts = OutcomeTable::from_pairs(&[("01", 1000)]);
        assert!((chsh_expectation(&counts, 1000) + 1.0).abs() < EPS);
    }

    #[test]
    fn pair_expectation_decodes_packed_registers() {
        // Registers (0,1) uncorrelated on balance, (2,3) perfectly correlated.
        let counts = OutcomeTable::from_pairs(&[("0010", 250), ("0001", 250), ("0011", 500)]);
        assert!((pair_expectation(&counts, (0, 1), 1000) - 0.0).abs() < EPS);
        assert!((pair_expectation(&counts, (2, 3), 1000) - 1.0).abs() < EPS);
    }

    #[test]
    fn chsh_score_sign_pattern() {
        let s = 1.0 / std::f64::consts::SQRT_2;
        let score = chsh_score([s, s, s, -s]);
        assert!((score - CHSH_QUANTUM_BOUND).abs() < EPS);
    }
}
