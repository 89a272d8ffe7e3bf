//! Format-transforming encryption.
//!
//! Encrypts byte messages into strings of a regular language and back, by
//! ranking strings of a fixed length against the language's canonical DFA.
//!
//! # Architecture
//!
//! - [`capacity`] -- Memoized counts of accepted strings per (length, state)
//! - [`rank`] -- [`RankCodec`]: the string/integer bijection at a given length
//! - [`cipher`] -- The [`Cipher`] trait and the ChaCha20-Poly1305 default
//! - [`framing`] -- Length prefix and zero padding to fill a bucket exactly
//! - [`format`] -- [`Format`]: a compiled spec and its length-selection rule
//! - [`encoder`] -- [`FormatCipher`]: the encode/decode pipeline
//!
//! ```no_run
//! use fte_codec::{CipherKey, FormatSpec};
//!
//! let spec = FormatSpec::new("[a-zA-Z0-9]+", 1, 256)?;
//! let key = CipherKey::from_bytes([7; 32]);
//! let formatted = fte_codec::encode(b"hello", &spec, &key)?;
//! assert_eq!(fte_codec::decode(&formatted, &spec, &key)?, b"hello");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::Arc;

pub mod capacity;
pub mod cipher;
pub mod encoder;
pub mod format;
pub mod framing;
pub mod rank;

pub use capacity::{CapacitySnapshot, CapacityTable};
pub use cipher::{ChaChaCipher, Cipher, CipherKey};
pub use encoder::FormatCipher;
pub use format::Format;
pub use fte_core::{FormatLibrary, FormatSpec, SpecError};
pub use fte_dfa::{Dfa, DfaError};
pub use rank::RankCodec;

/// Error type for every codec operation.
#[derive(Debug, thiserror::Error)]
pub enum FteError {
    #[error("invalid format: {0}")]
    InvalidSpec(#[from] SpecError),
    #[error("automaton: {0}")]
    Automaton(#[from] DfaError),
    #[error("length {requested} exceeds the capacity table ceiling of {ceiling}")]
    LengthOverflow { requested: usize, ceiling: usize },
    #[error("message needs {needed} bytes but the format carries at most {available}")]
    CapacityExceeded { needed: usize, available: usize },
    #[error("input is not a string of the format")]
    NotAccepted,
    #[error("state {state} is not one of the automaton's {states} states")]
    InvalidState { state: u32, states: usize },
    #[error("rank is out of range for length {length}")]
    RankOutOfRange { length: usize },
    #[error("ciphertext failed authentication")]
    CipherAuth,
    #[error("cipher produced {actual} bytes, expected {expected}")]
    CipherLength { expected: usize, actual: usize },
    #[error("malformed message frame")]
    Padding,
    #[error("invalid key: expected {expected} bytes, got {actual}")]
    InvalidKey { expected: usize, actual: usize },
    #[error("capacity snapshot: {0}")]
    Snapshot(String),
}

/// Compile `spec` and encode `plaintext` under `key` in one call.
///
/// Compiling dominates the cost; callers encoding more than one message
/// should build a [`Format`] once and keep a [`FormatCipher`].
pub fn encode(plaintext: &[u8], spec: &FormatSpec, key: &CipherKey) -> Result<Vec<u8>, FteError> {
    let format = Arc::new(Format::compile(spec.clone())?);
    FormatCipher::new(format, key).encode(plaintext)
}

/// Compile `spec` and decode `formatted` under `key` in one call.
pub fn decode(formatted: &[u8], spec: &FormatSpec, key: &CipherKey) -> Result<Vec<u8>, FteError> {
    let format = Arc::new(Format::compile(spec.clone())?);
    FormatCipher::new(format, key).decode(formatted)
}
