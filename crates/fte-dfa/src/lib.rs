//! Canonical deterministic automata for format-transforming encryption.
//!
//! This crate turns an automaton produced by some external compiler into the
//! dense, total, pruned transition table the rank/unrank codec walks. It also
//! reads and writes a compact binary form of that table.
//!
//! # Architecture
//!
//! - [`source`] -- The narrow [`DfaSource`] capability trait and an edge-list implementation
//! - [`regex`] -- DFA extraction from a regular expression (via `regex-automata`)
//! - [`att`] -- AT&T FSM text format reader
//! - [`alphabet`] -- Ordered byte alphabet
//! - [`transition`] -- Dense row-major transition table
//! - [`format`] -- Binary header parsing and validation
//! - [`dfa`] -- The canonical [`Dfa`]: construction, pruning, serialization

pub mod alphabet;
pub mod att;
pub mod dfa;
pub mod format;
pub mod regex;
pub mod source;
pub mod transition;

pub use alphabet::Alphabet;
pub use dfa::{Dfa, START_STATE};
pub use source::{DfaSource, TransitionList};

/// Error type for automaton construction and loading.
#[derive(Debug, thiserror::Error)]
pub enum DfaError {
    #[error("failed to compile pattern: {0}")]
    SpecCompile(String),
    #[error("invalid ATT automaton at line {line}: {reason}")]
    InvalidAtt { line: usize, reason: String },
    #[error("invalid automaton source: {0}")]
    InvalidSource(String),
    #[error("nondeterministic transitions from state {state} on byte {byte:#04x}")]
    Nondeterministic { state: usize, byte: u8 },
    #[error("invalid magic number in DFA header")]
    InvalidMagic,
    #[error("unsupported DFA format version {0}")]
    UnsupportedVersion(u8),
    #[error("data too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("invalid transition table: {0}")]
    InvalidTable(String),
}
