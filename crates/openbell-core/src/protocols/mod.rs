//! Device-independent test protocols.
//!
//! Each protocol is a pure function of `(dispatcher, tolerance, shots)`:
//! it builds its preparation and measurement fragments, sends the
//! combinatorial layout to the dispatcher, scores the returned outcome
//! tables, and renders a verdict. A score outside the expected range at low
//! shot counts is not an error — it surfaces as an ordinary failed verdict
//! with the computed value attached for inspection.

pub mod dimension;
pub mod entanglement;
pub mod incompatibility;

use serde::Serialize;

/// Verdict of one protocol run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProtocolOutcome {
    /// Whether the statistics passed the protocol's tolerance check.
    pub passed: bool,
    /// The computed score or probability, returned for inspection either way.
    pub value: f64,
}
