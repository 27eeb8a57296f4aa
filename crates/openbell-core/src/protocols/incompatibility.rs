//! Measurement-incompatibility test (BB84 facet).
//!
//! One device prepares the four BB84 states 0, 1, +, − as a single
//! 4-register preparation; the other applies one of two rotation
//! measurements, Ry(−(π/4 + y·π/2)) on every register for y ∈ {0, 1}. If
//! Bob's two settings were jointly measurable, the facet score in
//! [`crate::analysis::bell_violation`] could not exceed the classical bound
//! of 6; incompatible measurements push it up to 2√2 − 2 ≈ 0.83 above it.

use std::f64::consts::PI;

use super::ProtocolOutcome;
use crate::analysis::bell_violation;
use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};
use crate::fragment::Fragment;

/// Alice's 4-register preparation: registers 0–3 carry 0, 1, +, −.
pub fn bb84_fragment() -> Fragment {
    Fragment::new(4).x(1).h(2).x(3).h(3)
}

/// Bob's rotation measurement for setting `y`: Ry(−(π/4 + y·π/2)) on every
/// register, then a terminal measurement. Settings outside {0, 1} are a
/// caller error.
pub fn rotation_fragment(y: u8) -> Result<Fragment> {
    if y > 1 {
        return Err(Error::InvalidSetting {
            name: "y",
            value: i64::from(y),
            allowed: "{0, 1}",
        });
    }
    let theta = -(PI / 4.0 + 0.5 * f64::from(y) * PI);
    let mut fragment = Fragment::new(4);
    for register in 0..4 {
        fragment = fragment.ry(register, theta);
    }
    Ok(fragment.measure_all())
}

/// Run the measurement-incompatibility test. One-sided check: pass iff the
/// facet score exceeds `tolerance` beyond the classical bound.
pub fn run_test(dispatcher: &Dispatcher, tolerance: f64, shots: u32) -> Result<ProtocolOutcome> {
    let preps = [bb84_fragment()];
    let a_choices = [Fragment::new(4)];
    let b_choices = [rotation_fragment(0)?, rotation_fragment(1)?];

    let counts = dispatcher.run_batch(&preps, (&a_choices, &b_choices), shots)?;
    let value = bell_violation(&counts[0], &counts[1], shots, shots)?;
    let passed = value > tolerance;
    log::info!("measurement incompatibility: violation {value:.4}, tolerance {tolerance}");
    Ok(ProtocolOutcome { passed, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{ExecutorConfig, LocalSimulator};

    fn dispatcher(seed: u64) -> Dispatcher {
        Dispatcher::new(Box::new(LocalSimulator::new(ExecutorConfig {
            seed: Some(seed),
            max_registers: 8,
        })))
    }

    #[test]
    fn rotation_setting_outside_binary_is_rejected() {
        let err = rotation_fragment(2).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidSetting {
                name: "y",
                value: 2,
                allowed: "{0, 1}",
            }
        );
    }

    #[test]
    fn incompatible_rotations_violate_the_facet() {
        // Ideal devices score 2√2 − 2 ≈ 0.828 above the classical bound.
        let outcome = run_test(&dispatcher(0xBB84), 0.5, 4000).unwrap();
        assert!(outcome.passed, "violation {}", outcome.value);
        assert!(outcome.value > 0.7 && outcome.value < 0.95);
    }

    #[test]
    fn identical_settings_stay_classical() {
        // Both jobs measuring with y = 0 cannot beat the facet bound: the
        // y = 1 mask rewards the opposite outcomes on registers 0 and 1.
        let dispatcher = dispatcher(0xBB85);
        let preps = [bb84_fragment()];
        let a_choices = [Fragment::new(4)];
        let same = rotation_fragment(0).unwrap();
        let counts = dispatcher
            .run_batch(&preps, (&a_choices, &[same.clone(), same]), 4000)
            .unwrap();
        let value = bell_violation(&counts[0], &counts[1], 4000, 4000).unwrap();
        assert!(value < 0.1, "violation {value}");
    }
}
