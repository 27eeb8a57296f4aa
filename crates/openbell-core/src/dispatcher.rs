//! Experiment dispatch and combinatorial expansion.
//!
//! The [`Dispatcher`] composes a preparation fragment with a pair of
//! measurement fragments into one runnable experiment and delegates execution
//! to an opaque [`Executor`] capability. Three escalating operations:
//! a single experiment, an element-wise list, and the full Cartesian batch.
//!
//! Batch enumeration order is a contract: downstream scoring code indexes
//! results positionally and assumes the exact preps → A-choices → B-choices
//! nesting.

use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::fragment::Fragment;
use crate::outcome::OutcomeTable;

/// Dispatches composed experiments to an executor supplied at construction.
pub struct Dispatcher {
    executor: Box<dyn Executor>,
}

impl Dispatcher {
    pub fn new(executor: Box<dyn Executor>) -> Self {
        Self { executor }
    }

    /// Backend identifier of the underlying executor.
    pub fn executor_name(&self) -> &'static str {
        self.executor.name()
    }

    /// Compose `prep` with both halves of `measurements` and run the result,
    /// sized to the maximum register count among the three fragments.
    ///
    /// A composition with no measurement operations returns the sentinel
    /// table without invoking the executor at all — there is nothing to
    /// decode.
    pub fn run_one(
        &self,
        prep: &Fragment,
        measurements: (&Fragment, &Fragment),
        shots: u32,
    ) -> Result<OutcomeTable> {
        let experiment = compose_experiment(prep, measurements.0, measurements.1);
        if !experiment.has_measurement() {
            return Ok(OutcomeTable::no_measurement());
        }
        self.executor.execute(&experiment, shots)
    }

    /// Element-wise zip of `preps` and `measurements`: one table per index,
    /// in input order. Mismatched lengths are a caller error. Whether the
    /// executor runs elements sequentially or in parallel is its own concern;
    /// the returned order matches the input order either way.
    pub fn run_many(
        &self,
        preps: &[Fragment],
        measurements: &[(Fragment, Fragment)],
        shots: u32,
    ) -> Result<Vec<OutcomeTable>> {
        if preps.len() != measurements.len() {
            return Err(Error::LengthMismatch {
                preps: preps.len(),
                pairs: measurements.len(),
            });
        }

        let composed: Vec<Fragment> = preps
            .iter()
            .zip(measurements)
            .map(|(prep, (meas_a, meas_b))| compose_experiment(prep, meas_a, meas_b))
            .collect();

        // Only measured compositions reach the executor; sentinel tables are
        // merged back positionally afterwards.
        let runnable: Vec<Fragment> = composed
            .iter()
            .filter(|experiment| experiment.has_measurement())
            .cloned()
            .collect();
        let mut executed = self.executor.execute_many(&runnable, shots)?.into_iter();

        composed
            .iter()
            .map(|experiment| {
                if experiment.has_measurement() {
                    executed.next().ok_or_else(|| {
                        Error::Backend("executor returned fewer tables than experiments".into())
                    })
                } else {
                    Ok(OutcomeTable::no_measurement())
                }
            })
            .collect()
    }

    /// Full batch: every combination of preparation and measurement choices,
    /// expanded in row-major nested order — outer loop over `preps`, then
    /// A-side choices, then B-side choices — for
    /// `preps.len() * a_choices.len() * b_choices.len()` experiments total.
    /// Empty inputs yield an empty result list, not an error.
    pub fn run_batch(
        &self,
        preps: &[Fragment],
        choices: (&[Fragment], &[Fragment]),
        shots: u32,
    ) -> Result<Vec<OutcomeTable>> {
        let (a_choices, b_choices) = choices;
        let total = preps.len() * a_choices.len() * b_choices.len();
        let mut expanded_preps = Vec::with_capacity(total);
        let mut expanded_pairs = Vec::with_capacity(total);

        for prep in preps {
            for meas_a in a_choices {
                for meas_b in b_choices {
                    expanded_preps.push(prep.clone());
                    expanded_pairs.push((meas_a.clone(), meas_b.clone()));
                }
            }
        }

        log::debug!(
            "batch expansion: {} preps x {} A-choices x {} B-choices = {} experiments",
            preps.len(),
            a_choices.len(),
            b_choices.len(),
            total
        );

        self.run_many(&expanded_preps, &expanded_pairs, shots)
    }
}

fn compose_experiment(prep: &Fragment, meas_a: &Fragment, meas_b: &Fragment) -> Fragment {
    prep.compose(&meas_a.compose(meas_b))
}
