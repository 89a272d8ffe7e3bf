// A compiled format: the specification, its canonical automaton and the
// shared capacity table, plus the length-selection rule both peers follow.

use std::sync::Arc;

use fte_core::FormatSpec;
use fte_dfa::Dfa;
use num_traits::Zero;

use crate::FteError;
use crate::capacity::CapacityTable;
use crate::framing::LENGTH_PREFIX;
use crate::rank::RankCodec;

/// A [`FormatSpec`] compiled into everything encode and decode need.
///
/// Compiling is the expensive step; a `Format` is meant to be built once and
/// shared (usually behind an `Arc`) by every cipher using that format.
#[derive(Debug, Clone)]
pub struct Format {
    spec: FormatSpec,
    codec: RankCodec,
}

impl Format {
    /// Validate `spec`, compile its regex and set up an empty capacity table.
    pub fn compile(spec: FormatSpec) -> Result<Self, FteError> {
        spec.validate()?;
        let dfa = Dfa::from_regex(&spec.regex, spec.max_length)?;
        tracing::debug!(
            regex = %spec.regex,
            min_length = spec.min_length,
            max_length = spec.max_length,
            states = dfa.state_count(),
            symbols = dfa.alphabet().len(),
            "compiled format"
        );
        Self::from_dfa(spec, Arc::new(dfa))
    }

    /// Use an automaton built elsewhere (ATT text, a binary table) for `spec`.
    /// The regex field of `spec` is kept as a label only.
    pub fn from_dfa(spec: FormatSpec, dfa: Arc<Dfa>) -> Result<Self, FteError> {
        Self::with_table(spec, Arc::new(CapacityTable::new(dfa)))
    }

    /// Use an existing capacity table, e.g. one restored from a snapshot.
    pub fn with_table(spec: FormatSpec, table: Arc<CapacityTable>) -> Result<Self, FteError> {
        spec.validate()?;
        if spec.max_length > table.ceiling() {
            return Err(FteError::LengthOverflow {
                requested: spec.max_length,
                ceiling: table.ceiling(),
            });
        }
        Ok(Self {
            spec,
            codec: RankCodec::new(table),
        })
    }

    pub fn spec(&self) -> &FormatSpec {
        &self.spec
    }

    pub fn codec(&self) -> &RankCodec {
        &self.codec
    }

    pub fn table(&self) -> &Arc<CapacityTable> {
        self.codec.table()
    }

    pub fn dfa(&self) -> &Dfa {
        self.codec.dfa()
    }

    /// Whole bytes of ciphertext a string of `length` symbols can carry:
    /// `floor(log2(capacity) / 8)`, or 0 for an empty bucket.
    ///
    /// Every integer below `256^width` has a rank at this length, so any
    /// `width`-byte ciphertext can be unranked into it.
    pub fn bucket_width(&self, length: usize) -> Result<usize, FteError> {
        let capacity = self.table().capacity_for(length)?;
        if capacity.is_zero() {
            return Ok(0);
        }
        Ok(((capacity.bits() - 1) / 8) as usize)
    }

    /// Shortest admissible output length whose bucket holds `needed` bytes,
    /// with that bucket's width.
    pub fn select_length(&self, needed: usize) -> Result<(usize, usize), FteError> {
        let mut available = 0;
        for length in self.spec.min_length..=self.spec.max_length {
            let width = self.bucket_width(length)?;
            if width >= needed {
                tracing::trace!(needed, length, width, "selected output length");
                return Ok((length, width));
            }
            available = available.max(width);
        }
        Err(FteError::CapacityExceeded { needed, available })
    }

    /// Widest bucket over the admissible lengths.
    pub fn max_bucket_width(&self) -> Result<usize, FteError> {
        let mut widest = 0;
        for length in self.spec.min_length..=self.spec.max_length {
            widest = widest.max(self.bucket_width(length)?);
        }
        Ok(widest)
    }

    /// Longest message that fits when the cipher adds `overhead` bytes.
    pub fn max_payload(&self, overhead: usize) -> Result<usize, FteError> {
        Ok(self
            .max_bucket_width()?
            .saturating_sub(overhead + LENGTH_PREFIX))
    }
}
