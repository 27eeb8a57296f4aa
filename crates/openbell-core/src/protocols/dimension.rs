//! Dimensionality test for a 2-register system.
//!
//! One device prepares each of the four computational basis states, the
//! other measures in the matching basis; a genuinely 2-register ("2-qubit")
//! channel recovers every prepared state with probability 1. The empirical
//! success probability must lie within `tolerance` of 1.

use super::ProtocolOutcome;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::fragment::Fragment;
use crate::outcome::OutcomeTable;

/// Run the dimensionality test.
pub fn run_test(dispatcher: &Dispatcher, tolerance: f64, shots: u32) -> Result<ProtocolOutcome> {
    let initial_states: [[u8; 2]; 4] = [[0, 0], [0, 1], [1, 0], [1, 1]];
    let preps: Vec<Fragment> = initial_states
        .iter()
        .map(|bits| prepare_bit_fragment(bits))
        .collect();

    let a_choices = [Fragment::new(2)];
    let b_choices = [Fragment::new(2).measure_all()];

    let counts = dispatcher.run_batch(&preps, (&a_choices, &b_choices), shots)?;
    let value = success_probability(&counts, shots);
    let passed = (value - 1.0).abs() <= tolerance;
    log::info!("dimensionality: success probability {value:.4}, tolerance {tolerance}");
    Ok(ProtocolOutcome { passed, value })
}

/// Fragment that writes a binary register string: an X on every register
/// whose bit is set.
pub fn prepare_bit_fragment(bits: &[u8]) -> Fragment {
    let mut fragment = Fragment::new(bits.len());
    for (register, &bit) in bits.iter().enumerate() {
        if bit == 1 {
            fragment = fragment.x(register);
        }
    }
    fragment
}

/// Fraction of shots that read back the prepared state, over all four
/// preparations.
///
/// The backend decodes register 0 into the rightmost digit, so prepared
/// `[0, 1]` reads back as `"10"` and `[1, 0]` as `"01"`. That inversion is
/// hard-coded into the lookup keys here, not inferred at runtime.
fn success_probability(counts: &[OutcomeTable], shots: u32) -> f64 {
    let hits = counts[0].count("00")
        + counts[1].count("10")
        + counts[2].count("01")
        + counts[3].count("11");
    hits as f64 / (f64::from(shots) * 4.0)
}
