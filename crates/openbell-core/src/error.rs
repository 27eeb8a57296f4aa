//! Crate-wide error type.
//!
//! Caller mistakes (mismatched list lengths, invalid settings, oversized
//! experiments) fail fast with a descriptive variant. Backend failures are
//! carried through unmodified in [`Error::Backend`]; the core performs no
//! retry.

use std::fmt;

/// Errors produced by the dispatch and analysis layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// `run_many` was given preparation and measurement lists of different lengths.
    LengthMismatch { preps: usize, pairs: usize },
    /// A protocol setting was outside its allowed values.
    InvalidSetting {
        name: &'static str,
        value: i64,
        allowed: &'static str,
    },
    /// A composed experiment spans more registers than the executor supports.
    RegisterOverflow { registers: usize, max: usize },
    /// Outcome counts do not sum to the shot count used for the experiment.
    ShotCountMismatch { expected: u64, counted: u64 },
    /// An outcome string was not binary or did not match the table's length.
    MalformedOutcome(String),
    /// An outcome table has a different setting count than the scorer expects.
    SettingCountMismatch { expected: usize, got: usize },
    /// Device/job failure reported by the executor, passed through unmodified.
    Backend(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { preps, pairs } => write!(
                f,
                "preparation list ({preps}) and measurement-pair list ({pairs}) differ in length"
            ),
            Self::InvalidSetting {
                name,
                value,
                allowed,
            } => write!(f, "setting {name}={value} is outside {allowed}"),
            Self::RegisterOverflow { registers, max } => write!(
                f,
                "experiment spans {registers} registers, executor supports at most {max}"
            ),
            Self::ShotCountMismatch { expected, counted } => write!(
                f,
                "outcome counts sum to {counted}, expected {expected} shots"
            ),
            Self::MalformedOutcome(outcome) => {
                write!(f, "malformed outcome string {outcome:?}")
            }
            Self::SettingCountMismatch { expected, got } => write!(
                f,
                "outcome strings encode {got} settings, scorer expects {expected}"
            ),
            Self::Backend(msg) => write!(f, "backend failure: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
