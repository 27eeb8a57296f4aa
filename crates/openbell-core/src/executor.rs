//! Executor contract and the local statevector backend.
//!
//! The dispatch layer never trusts the internals of a device; it talks to an
//! opaque [`Executor`] capability: run a composed experiment for N shots and
//! hand back an outcome-frequency table. Remote fleets, job batching, and any
//! retry policy live behind this trait. [`LocalSimulator`] is the in-process
//! backend: a dense statevector simulation sampled with a seeded RNG.

use std::collections::BTreeMap;
use std::f64::consts::FRAC_1_SQRT_2;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::fragment::{Fragment, Gate};
use crate::outcome::OutcomeTable;

/// Opaque execution capability consumed by the dispatcher.
///
/// Implementations must preserve order in [`execute_many`](Self::execute_many):
/// the i-th returned table belongs to the i-th experiment, whether elements
/// ran sequentially or concurrently.
pub trait Executor: Send + Sync {
    /// Run one composed experiment for `shots` repetitions.
    fn execute(&self, experiment: &Fragment, shots: u32) -> Result<OutcomeTable>;

    /// Run a batch of experiments. Default: element-wise `execute`.
    fn execute_many(&self, experiments: &[Fragment], shots: u32) -> Result<Vec<OutcomeTable>> {
        experiments
            .iter()
            .map(|experiment| self.execute(experiment, shots))
            .collect()
    }

    /// Backend identifier for logs.
    fn name(&self) -> &'static str;
}

/// Explicit backend configuration, passed at construction. There is no
/// process-wide credential or session state in the core.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ExecutorConfig {
    /// RNG seed for reproducible sampling; `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Largest register count the backend will accept.
    pub max_registers: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_registers: 16,
        }
    }
}

/// In-process statevector backend.
///
/// Amplitudes are kept as separate re/im arrays and outcome strings are
/// emitted MSB-first, so string position `i` holds register `len - 1 - i` —
/// the convention every decoder in [`crate::analysis`] expects.
pub struct LocalSimulator {
    config: ExecutorConfig,
    rng: Mutex<StdRng>,
}

impl LocalSimulator {
    pub fn new(config: ExecutorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            config,
            rng: Mutex::new(rng),
        }
    }
}

impl Default for LocalSimulator {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

impl Executor for LocalSimulator {
    fn execute(&self, experiment: &Fragment, shots: u32) -> Result<OutcomeTable> {
        let registers = experiment.registers();
        if registers > self.config.max_registers {
            return Err(Error::RegisterOverflow {
                registers,
                max: self.config.max_registers,
            });
        }
        if !experiment.has_measurement() {
            return Ok(OutcomeTable::no_measurement());
        }

        log::debug!(
            "simulating {} registers, {} ops, {} shots",
            registers,
            experiment.ops().len(),
            shots
        );

        let mut state = StateVector::new(registers);
        for gate in experiment.ops() {
            state.apply(gate);
        }
        let probs = state.probabilities();

        let mut rng = self.rng.lock().unwrap();
        let counts = sample(&probs, registers, shots, &mut rng);
        Ok(OutcomeTable::from_counts(counts))
    }

    fn name(&self) -> &'static str {
        "local_simulator"
    }
}

/// Draw `shots` outcomes from the measurement distribution. One draw per
/// shot, so the counts sum to exactly `shots` — no dropped or duplicated
/// repetitions.
fn sample(probs: &[f64], registers: usize, shots: u32, rng: &mut StdRng) -> BTreeMap<String, u64> {
    let mut cumulative = Vec::with_capacity(probs.len());
    let mut acc = 0.0;
    for &p in probs {
        acc += p;
        cumulative.push(acc);
    }

    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for _ in 0..shots {
        // Scale by the accumulated total to absorb floating-point drift.
        let r = rng.random::<f64>() * acc;
        let index = cumulative
            .partition_point(|&c| c < r)
            .min(probs.len() - 1);
        let outcome = format!("{index:0registers$b}");
        *counts.entry(outcome).or_insert(0) += 1;
    }
    counts
}

// ---------------------------------------------------------------------------
// Statevector
// ---------------------------------------------------------------------------

/// Dense statevector over `registers` registers, amplitudes as separate
/// re/im arrays. Basis index bit `q` is register `q`.
struct StateVector {
    re: Vec<f64>,
    im: Vec<f64>,
}

/// 2x2 complex matrix, row-major, entries as (re, im).
type Matrix2 = [[(f64, f64); 2]; 2];

impl StateVector {
    /// |0…0⟩ state.
    fn new(registers: usize) -> Self {
        let dim = 1usize << registers;
        let mut re = vec![0.0; dim];
        re[0] = 1.0;
        Self {
            re,
            im: vec![0.0; dim],
        }
    }

    fn apply(&mut self, gate: &Gate) {
        match *gate {
            Gate::X(q) => self.apply_single(q, [[(0.0, 0.0), (1.0, 0.0)], [(1.0, 0.0), (0.0, 0.0)]]),
            Gate::H(q) => {
                let h = FRAC_1_SQRT_2;
                self.apply_single(q, [[(h, 0.0), (h, 0.0)], [(h, 0.0), (-h, 0.0)]]);
            }
            Gate::S(q) => self.apply_single(q, phase(0.0, 1.0)),
            Gate::Sdg(q) => self.apply_single(q, phase(0.0, -1.0)),
            Gate::T(q) => self.apply_single(q, phase(FRAC_1_SQRT_2, FRAC_1_SQRT_2)),
            Gate::Tdg(q) => self.apply_single(q, phase(FRAC_1_SQRT_2, -FRAC_1_SQRT_2)),
            Gate::Ry(q, theta) => {
                let (s, c) = (theta / 2.0).sin_cos();
                self.apply_single(q, [[(c, 0.0), (-s, 0.0)], [(s, 0.0), (c, 0.0)]]);
            }
            Gate::Cx(control, target) => self.apply_cx(control, target),
        }
    }

    /// Apply a single-register unitary to `target`.
    fn apply_single(&mut self, target: usize, m: Matrix2) {
        let stride = 1usize << target;
        for i in 0..self.re.len() {
            if i & stride != 0 {
                continue;
            }
            let j = i | stride;
            let (ar, ai) = (self.re[i], self.im[i]);
            let (br, bi) = (self.re[j], self.im[j]);
            self.re[i] = m[0][0].0 * ar - m[0][0].1 * ai + m[0][1].0 * br - m[0][1].1 * bi;
            self.im[i] = m[0][0].0 * ai + m[0][0].1 * ar + m[0][1].0 * bi + m[0][1].1 * br;
            self.re[j] = m[1][0].0 * ar - m[1][0].1 * ai + m[1][1].0 * br - m[1][1].1 * bi;
            self.im[j] = m[1][0].0 * ai + m[1][0].1 * ar + m[1][1].0 * bi + m[1][1].1 * br;
        }
    }

    fn apply_cx(&mut self, control: usize, target: usize) {
        let c = 1usize << control;
        let t = 1usize << target;
        for i in 0..self.re.len() {
            if i & c != 0 && i & t == 0 {
                let j = i | t;
                self.re.swap(i, j);
                self.im.swap(i, j);
            }
        }
    }

    /// Measurement distribution: |amplitude|² per basis state.
    fn probabilities(&self) -> Vec<f64> {
        self.re
            .iter()
            .zip(&self.im)
            .map(|(&r, &i)| r * r + i * i)
            .collect()
    }
}

/// diag(1, re + i·im) — the phase-gate family S, S†, T, T†.
fn phase(re: f64, im: f64) -> Matrix2 {
    [[(1.0, 0.0), (0.0, 0.0)], [(0.0, 0.0), (re, im)]]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> LocalSimulator {
        LocalSimulator::new(ExecutorConfig {
            seed: Some(0xB311),
            max_registers: 8,
        })
    }

    #[test]
    fn deterministic_preparation_yields_one_outcome() {
        let sim = seeded();
        let experiment = Fragment::new(2).x(1).measure_all();
        let table = sim.execute(&experiment, 500).unwrap();
        // Register 1 set, register 0 clear -> "10" in MSB-first order.
        assert_eq!(table.count("10"), 500);
        assert_eq!(table.total(), 500);
    }

    #[test]
    fn counts_sum_to_shots() {
        let sim = seeded();
        let experiment = Fragment::new(2).h(0).h(1).measure_all();
        let table = sim.execute(&experiment, 1000).unwrap();
        assert_eq!(table.total(), 1000);
    }

    #[test]
    fn bell_pair_has_even_parity_outcomes_only() {
        let sim = seeded();
        let experiment = Fragment::new(2).h(0).cx(0, 1).measure_all();
        let table = sim.execute(&experiment, 2000).unwrap();
        assert_eq!(table.count("01"), 0);
        assert_eq!(table.count("10"), 0);
        let even = table.count("00") + table.count("11");
        assert_eq!(even, 2000);
        // Both outcomes should appear at this shot count.
        assert!(table.count("00") > 700);
        assert!(table.count("11") > 700);
    }

    #[test]
    fn no_measurement_returns_sentinel() {
        let sim = seeded();
        let experiment = Fragment::new(2).h(0);
        let table = sim.execute(&experiment, 100).unwrap();
        assert!(!table.is_measured());
    }

    #[test]
    fn register_overflow_is_an_error() {
        let sim = LocalSimulator::new(ExecutorConfig {
            seed: Some(1),
            max_registers: 3,
        });
        let experiment = Fragment::new(4).measure_all();
        let err = sim.execute(&experiment, 10).unwrap_err();
        assert_eq!(
            err,
            Error::RegisterOverflow {
                registers: 4,
                max: 3
            }
        );
    }

    #[test]
    fn execute_many_preserves_order() {
        let sim = seeded();
        let experiments = vec![
            Fragment::new(1).measure_all(),
            Fragment::new(1).x(0).measure_all(),
        ];
        let tables = sim.execute_many(&experiments, 50).unwrap();
        assert_eq!(tables[0].count("0"), 50);
        assert_eq!(tables[1].count("1"), 50);
    }

    #[test]
    fn seeded_runs_reproduce() {
        let experiment = Fragment::new(1).h(0).measure_all();
        let a = seeded().execute(&experiment, 1000).unwrap();
        let b = seeded().execute(&experiment, 1000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn phase_gates_cancel() {
        // S then S† then T then T† is the identity: |+> stays |+> under H-basis readout.
        let sim = seeded();
        let experiment = Fragment::new(1)
            .h(0)
            .s(0)
            .sdg(0)
            .t(0)
            .tdg(0)
            .h(0)
            .measure_all();
        let table = sim.execute(&experiment, 400).unwrap();
        assert_eq!(table.count("0"), 400);
    }
}
