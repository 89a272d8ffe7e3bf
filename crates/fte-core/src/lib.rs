//! Shared types for format-transforming encryption.
//!
//! A *format* is a regular language plus the range of output lengths a
//! formatted message may take. This crate holds the plain-data description of
//! formats; compiling them into automata lives in `fte-dfa` and the codec
//! itself in `fte-codec`.
//!
//! - [`spec`] -- [`FormatSpec`] and its validation rules
//! - [`library`] -- named collections of formats loaded from JSON

pub mod library;
pub mod spec;

pub use library::FormatLibrary;
pub use spec::{FormatSpec, MAX_FORMAT_LENGTH, SpecError};
