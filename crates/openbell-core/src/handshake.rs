//! Handshake facade sequencing the device-independent protocols.
//!
//! Thin orchestration over the protocol functions: run each test with the
//! same dispatcher, log the verdicts, and aggregate an overall pass/fail
//! with logical AND. No state is shared between protocol invocations.

use serde::Serialize;

use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::protocols::{self, ProtocolOutcome};

/// Sequences protocol invocations against one dispatcher.
pub struct Handshake {
    dispatcher: Dispatcher,
}

/// One protocol verdict with its name attached.
#[derive(Debug, Clone, Serialize)]
pub struct NamedOutcome {
    pub protocol: String,
    pub passed: bool,
    pub value: f64,
}

/// Aggregated result of running every protocol.
#[derive(Debug, Clone, Serialize)]
pub struct HandshakeReport {
    pub results: Vec<NamedOutcome>,
    /// Logical AND over all protocol verdicts.
    pub all_passed: bool,
}

impl Handshake {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Dimensionality test (success probability within tolerance of 1).
    pub fn dimensionality(&self, tolerance: f64, shots: u32) -> Result<ProtocolOutcome> {
        let outcome = protocols::dimension::run_test(&self.dispatcher, tolerance, shots)?;
        log_outcome("dimensionality", &outcome);
        Ok(outcome)
    }

    /// Measurement-incompatibility test (one-sided facet violation).
    pub fn measurement_incompatibility(
        &self,
        tolerance: f64,
        shots: u32,
    ) -> Result<ProtocolOutcome> {
        let outcome = protocols::incompatibility::run_test(&self.dispatcher, tolerance, shots)?;
        log_outcome("measurement incompatibility", &outcome);
        Ok(outcome)
    }

    /// Entanglement test (CHSH, maximal-violation variant).
    pub fn entanglement(&self, tolerance: f64, shots: u32) -> Result<ProtocolOutcome> {
        let outcome = protocols::entanglement::run_test(&self.dispatcher, tolerance, shots)?;
        log_outcome("entanglement", &outcome);
        Ok(outcome)
    }

    /// Run every protocol and aggregate with logical AND.
    pub fn test_all(&self, tolerance: f64, shots: u32) -> Result<HandshakeReport> {
        let runs: [(&str, ProtocolOutcome); 3] = [
            ("dimensionality", self.dimensionality(tolerance, shots)?),
            (
                "measurement_incompatibility",
                self.measurement_incompatibility(tolerance, shots)?,
            ),
            ("entanglement", self.entanglement(tolerance, shots)?),
        ];

        let results: Vec<NamedOutcome> = runs
            .iter()
            .map(|(name, outcome)| NamedOutcome {
                protocol: (*name).to_string(),
                passed: outcome.passed,
                value: outcome.value,
            })
            .collect();
        let all_passed = results.iter().all(|r| r.passed);
        Ok(HandshakeReport {
            results,
            all_passed,
        })
    }
}

fn log_outcome(name: &str, outcome: &ProtocolOutcome) {
    if outcome.passed {
        log::info!("passed {name} with value {:.4}", outcome.value);
    } else {
        log::warn!("failed {name} with value {:.4}", outcome.value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{ExecutorConfig, LocalSimulator};

    fn handshake(seed: u64) -> Handshake {
        let simulator = LocalSimulator::new(ExecutorConfig {
            seed: Some(seed),
            max_registers: 8,
        });
        Handshake::new(Dispatcher::new(Box::new(simulator)))
    }

    #[test]
    fn test_all_aggregates_with_logical_and() {
        // Tolerance loose enough for every protocol at this shot count.
        let report = handshake(0x5EED).test_all(0.3, 4000).unwrap();
        assert_eq!(report.results.len(), 3);
        assert!(report.all_passed);
        assert!(report.results.iter().all(|r| r.passed));
    }

    #[test]
    fn impossible_tolerance_fails_the_aggregate() {
        // At tolerance zero the CHSH score cannot hit 2√2 exactly at finite
        // shots, so the aggregate fails even though other tests pass.
        let report = handshake(0x5EEE).test_all(0.0, 1000).unwrap();
        assert!(!report.all_passed);
        // Dimensionality is still exact on an ideal simulator.
        assert!(report.results[0].passed);
    }
}
