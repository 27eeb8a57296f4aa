//! # openbell-core
//!
//! **Trust the statistics, not the hardware.**
//!
//! `openbell-core` verifies, statistically, that a pair of quantum devices
//! connected by a physical channel actually behave quantumly — entanglement,
//! measurement incompatibility, effective dimensionality — rather than like a
//! classical hidden-variable system. The verifier never trusts the devices'
//! internal description, only the outcome statistics under chosen settings.
//!
//! ## Quick Start
//!
//! ```
//! use openbell_core::{Dispatcher, ExecutorConfig, Handshake, LocalSimulator};
//!
//! let simulator = LocalSimulator::new(ExecutorConfig {
//!     seed: Some(42),
//!     ..ExecutorConfig::default()
//! });
//! let handshake = Handshake::new(Dispatcher::new(Box::new(simulator)));
//!
//! let report = handshake.test_all(0.3, 1000).unwrap();
//! assert!(report.all_passed);
//! ```
//!
//! ## Architecture
//!
//! Protocol → Dispatcher (combinatorial expansion) → Executor → Outcome
//! Tables → Probability Estimator → Violation Scorer → (passed, value)
//!
//! The [`Dispatcher`] composes preparation and measurement [`Fragment`]s into
//! runnable experiments and expands the full Cartesian batch of settings in a
//! fixed, deterministic order. Execution goes through the opaque [`Executor`]
//! capability — [`LocalSimulator`] in-process, or any remote backend an
//! integrator supplies. [`analysis`] turns outcome counts into conditional
//! probabilities and scores them against known classical bounds.

pub mod analysis;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod fragment;
pub mod handshake;
pub mod outcome;
pub mod protocols;

pub use analysis::{
    BB84_CLASSICAL_BOUND, CHSH_CLASSICAL_BOUND, CHSH_QUANTUM_BOUND, CondProbTable, bell_violation,
    chsh_expectation, chsh_score, conditional_probs, pair_expectation,
};
pub use dispatcher::Dispatcher;
pub use error::{Error, Result};
pub use executor::{Executor, ExecutorConfig, LocalSimulator};
pub use fragment::{Fragment, Gate};
pub use handshake::{Handshake, HandshakeReport, NamedOutcome};
pub use outcome::{OutcomeTable, register_digit};
pub use protocols::ProtocolOutcome;

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
