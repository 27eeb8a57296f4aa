//! Entanglement test via the CHSH inequality.
//!
//! One device prepares the Bell pair |Φ+⟩ and hands half to the other; the
//! parties measure in the bases {Z, X} and {W, V}, where W = (Z+X)/√2 and
//! V = (Z−X)/√2. The dispatcher's batch order yields the settings ZW, ZV,
//! XW, XV, whose expectations combine as S = E₁ + E₂ + E₃ − E₄. Classically
//! S ≤ 2; the Bell pair reaches 2√2.
//!
//! Two variants: [`run_test`] checks |S − 2√2| ≤ tolerance (the devices hit
//! the maximal violation), [`run_violation_test`] checks S − 2 > tolerance
//! (any violation at all). [`run_parallel_test`] packs two independent Bell
//! pairs into one 4-register experiment so two jobs cover all four settings.

use super::ProtocolOutcome;
use crate::analysis::{
    CHSH_CLASSICAL_BOUND, CHSH_QUANTUM_BOUND, chsh_expectation, chsh_score, pair_expectation,
};
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::fragment::Fragment;

/// Bell-pair preparation |Φ+⟩ = (|00⟩ + |11⟩)/√2.
pub fn bell_fragment() -> Fragment {
    Fragment::new(2).h(0).cx(0, 1)
}

/// A-side basis change: Z is a plain readout.
fn a_basis_z() -> Fragment {
    Fragment::new(1)
}

/// A-side basis change: X readout via a Hadamard.
fn a_basis_x() -> Fragment {
    Fragment::new(1).h(0)
}

/// B-side basis change onto W = (Z+X)/√2, with terminal measurement.
fn b_basis_w() -> Fragment {
    Fragment::new(2).s(1).h(1).t(1).h(1).measure_all()
}

/// B-side basis change onto V = (Z−X)/√2, with terminal measurement.
fn b_basis_v() -> Fragment {
    Fragment::new(2).s(1).h(1).tdg(1).h(1).measure_all()
}

/// Maximal-violation variant: pass iff |S − 2√2| ≤ tolerance.
pub fn run_test(dispatcher: &Dispatcher, tolerance: f64, shots: u32) -> Result<ProtocolOutcome> {
    let score = chsh_from_batch(dispatcher, shots)?;
    let passed = (score - CHSH_QUANTUM_BOUND).abs() <= tolerance;
    log::info!("entanglement: CHSH score {score:.4}, tolerance {tolerance}");
    Ok(ProtocolOutcome {
        passed,
        value: score,
    })
}

/// Any-violation variant: pass iff S − 2 > tolerance. One-sided — only a
/// violation beyond the classical bound counts.
pub fn run_violation_test(
    dispatcher: &Dispatcher,
    tolerance: f64,
    shots: u32,
) -> Result<ProtocolOutcome> {
    let score = chsh_from_batch(dispatcher, shots)?;
    let passed = score - CHSH_CLASSICAL_BOUND > tolerance;
    log::info!("entanglement (violation): CHSH score {score:.4}, tolerance {tolerance}");
    Ok(ProtocolOutcome {
        passed,
        value: score,
    })
}

fn chsh_from_batch(dispatcher: &Dispatcher, shots: u32) -> Result<f64> {
    let preps = [bell_fragment()];
    let a_choices = [a_basis_z(), a_basis_x()];
    let b_choices = [b_basis_w(), b_basis_v()];
    let counts = dispatcher.run_batch(&preps, (&a_choices, &b_choices), shots)?;

    // Batch order: ZW, ZV, XW, XV.
    let e: Vec<f64> = counts
        .iter()
        .map(|table| chsh_expectation(table, shots))
        .collect();
    Ok(chsh_score([e[0], e[1], e[2], e[3]]))
}

/// Parallel variant: two Bell pairs on registers (0,1) and (2,3) in one
/// composed experiment. Job one measures ZW on the low pair and ZV on the
/// high pair; job two measures XW and XV. Register-index bookkeeping aside,
/// the scoring formula is identical to the single-job variant.
pub fn run_parallel_test(
    dispatcher: &Dispatcher,
    tolerance: f64,
    shots: u32,
) -> Result<ProtocolOutcome> {
    let prep = Fragment::new(4).h(0).cx(0, 1).h(2).cx(2, 3);

    // A-side: Z on both pairs, then X on both pairs.
    let a_z = Fragment::new(4);
    let a_x = Fragment::new(4).h(0).h(2);
    // B-side: W on register 1, V on register 3, in every job.
    let b_wv = Fragment::new(4)
        .s(1)
        .h(1)
        .t(1)
        .h(1)
        .s(3)
        .h(3)
        .tdg(3)
        .h(3)
        .measure_all();

    let preps = vec![prep.clone(), prep];
    let pairs = vec![(a_z, b_wv.clone()), (a_x, b_wv)];
    let counts = dispatcher.run_many(&preps, &pairs, shots)?;

    let e_zw = pair_expectation(&counts[0], (0, 1), shots);
    let e_zv = pair_expectation(&counts[0], (2, 3), shots);
    let e_xw = pair_expectation(&counts[1], (0, 1), shots);
    let e_xv = pair_expectation(&counts[1], (2, 3), shots);
    let score = chsh_score([e_zw, e_zv, e_xw, e_xv]);

    let passed = (score - CHSH_QUANTUM_BOUND).abs() <= tolerance;
    log::info!("entanglement (parallel): CHSH score {score:.4}, tolerance {tolerance}");
    Ok(ProtocolOutcome {
        passed,
        value: score,
    })
}
