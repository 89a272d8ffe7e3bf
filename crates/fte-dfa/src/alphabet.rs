// Ordered byte alphabet: symbol index <-> byte value.

use crate::DfaError;

/// Sentinel in the byte-to-index map for bytes outside the alphabet.
const NO_SYMBOL: u16 = u16::MAX;

/// The alphabet Σ of an automaton, totally ordered by byte value.
///
/// Symbol index `i` is the `i`-th smallest byte in Σ. Rank and unrank both
/// enumerate strings in this order, so it must never change once an
/// automaton is built.
#[derive(Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<u8>,
    index: [u16; 256],
}

impl std::fmt::Debug for Alphabet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shown: String = self
            .symbols
            .iter()
            .flat_map(|&b| std::ascii::escape_default(b))
            .map(char::from)
            .collect();
        f.debug_struct("Alphabet")
            .field("len", &self.symbols.len())
            .field("symbols", &shown)
            .finish()
    }
}

impl Alphabet {
    /// Build an alphabet from any collection of bytes; duplicates are dropped.
    pub fn from_symbols(symbols: impl IntoIterator<Item = u8>) -> Self {
        let mut present = [false; 256];
        for b in symbols {
            present[b as usize] = true;
        }
        let symbols: Vec<u8> = (0..=255u8).filter(|&b| present[b as usize]).collect();
        Self::from_ordered(symbols)
    }

    /// Build an alphabet from bytes that must already be strictly ascending.
    ///
    /// Used when loading a serialized automaton, where a reordered alphabet
    /// would silently change every rank.
    pub fn from_sorted(symbols: &[u8]) -> Result<Self, DfaError> {
        if symbols.windows(2).any(|w| w[0] >= w[1]) {
            return Err(DfaError::InvalidTable(
                "alphabet is not strictly ascending".to_string(),
            ));
        }
        Ok(Self::from_ordered(symbols.to_vec()))
    }

    fn from_ordered(symbols: Vec<u8>) -> Self {
        let mut index = [NO_SYMBOL; 256];
        for (i, &b) in symbols.iter().enumerate() {
            index[b as usize] = i as u16;
        }
        Self { symbols, index }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Byte value of the symbol at `index`.
    #[inline]
    pub fn symbol(&self, index: usize) -> u8 {
        self.symbols[index]
    }

    /// Position of `byte` in Σ, or `None` if it is not a symbol.
    #[inline]
    pub fn index_of(&self, byte: u8) -> Option<usize> {
        match self.index[byte as usize] {
            NO_SYMBOL => None,
            i => Some(i as usize),
        }
    }

    #[inline]
    pub fn contains(&self, byte: u8) -> bool {
        self.index[byte as usize] != NO_SYMBOL
    }

    /// The symbols in order.
    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }
}
