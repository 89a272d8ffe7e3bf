// Format specification: a regular-language pattern plus output length bounds.

use serde::{Deserialize, Serialize};

/// Hard ceiling on `max_length` for any format.
///
/// Capacity tables hold one big integer per (state, length) pair, so the
/// longest admissible output bounds both memory and the cost of a single
/// encode or decode call.
pub const MAX_FORMAT_LENGTH: usize = 65_536;

/// Error type for invalid format descriptions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpecError {
    #[error("format regex is empty")]
    EmptyRegex,
    #[error("max_length must be at least 1")]
    ZeroMaxLength,
    #[error("min_length {min} exceeds max_length {max}")]
    InvertedBounds { min: usize, max: usize },
    #[error("max_length {requested} exceeds the ceiling of {ceiling}")]
    LengthCeiling { requested: usize, ceiling: usize },
    #[error("unknown format: {0}")]
    UnknownFormat(String),
    #[error("invalid format library: {0}")]
    Library(String),
}

fn default_min_length() -> usize {
    1
}

/// A format: the language formatted messages are drawn from and the range of
/// lengths they may have.
///
/// The pattern is matched against the *whole* output (full-match semantics)
/// and is interpreted byte-wise, so `.` and classes range over single bytes.
///
/// Both peers must agree on every field: the decoder derives which capacity
/// bucket a message used from the received length alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatSpec {
    /// Regular-language pattern.
    pub regex: String,
    /// Shortest output the encoder may produce.
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    /// Longest output the encoder may produce. Also bounds dead-state pruning
    /// and the capacity table.
    pub max_length: usize,
}

impl FormatSpec {
    /// Create and validate a format specification.
    pub fn new(
        regex: impl Into<String>,
        min_length: usize,
        max_length: usize,
    ) -> Result<Self, SpecError> {
        let spec = Self {
            regex: regex.into(),
            min_length,
            max_length,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Check the bounds and pattern for obvious problems.
    ///
    /// This does not compile the pattern; a syntactically broken regex is
    /// reported later, when the automaton is built.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.regex.is_empty() {
            return Err(SpecError::EmptyRegex);
        }
        if self.max_length == 0 {
            return Err(SpecError::ZeroMaxLength);
        }
        if self.min_length > self.max_length {
            return Err(SpecError::InvertedBounds {
                min: self.min_length,
                max: self.max_length,
            });
        }
        if self.max_length > MAX_FORMAT_LENGTH {
            return Err(SpecError::LengthCeiling {
                requested: self.max_length,
                ceiling: MAX_FORMAT_LENGTH,
            });
        }
        Ok(())
    }

    /// Whether an output of `len` bytes falls inside this format's bounds.
    #[inline]
    pub fn admits_length(&self, len: usize) -> bool {
        (self.min_length..=self.max_length).contains(&len)
    }
}
