// Rank/unrank: the bijection between accepted strings of one length and the
// integers below that length's capacity.

use std::sync::Arc;

use fte_dfa::Dfa;
use num_bigint::BigUint;
use num_traits::Zero;

use crate::FteError;
use crate::capacity::CapacityTable;

/// Maps accepted strings of length `L` to `[0, capacity(L))` and back, in
/// lexicographic order over the alphabet's symbol order.
///
/// Cloning is cheap; clones share the capacity table.
#[derive(Debug, Clone)]
pub struct RankCodec {
    table: Arc<CapacityTable>,
}

impl RankCodec {
    pub fn new(table: Arc<CapacityTable>) -> Self {
        Self { table }
    }

    /// Build a codec with a fresh capacity table for `dfa`.
    pub fn for_dfa(dfa: Arc<Dfa>) -> Self {
        Self::new(Arc::new(CapacityTable::new(dfa)))
    }

    pub fn table(&self) -> &Arc<CapacityTable> {
        &self.table
    }

    pub fn dfa(&self) -> &Dfa {
        self.table.dfa()
    }

    /// Position of `text` among the accepted strings of its length.
    ///
    /// The walk always runs over the whole input: a byte outside the alphabet
    /// counts every sibling before it and moves to the reject state, so the
    /// work done does not depend on where the input leaves the language.
    ///
    /// Input outside the language fails with [`FteError::NotAccepted`] at any
    /// length; accepted input longer than the table's ceiling fails with
    /// [`FteError::LengthOverflow`].
    pub fn rank(&self, text: &[u8]) -> Result<BigUint, FteError> {
        let length = text.len();
        let dfa = self.table.dfa();
        if length > self.table.ceiling() && !dfa.accepts(text) {
            return Err(FteError::NotAccepted);
        }
        let rows = self.table.rows_through(length)?;
        let alphabet = dfa.alphabet();

        let mut rank = BigUint::zero();
        let mut state = dfa.start();
        for (i, &byte) in text.iter().enumerate() {
            let below = &rows[length - 1 - i];
            let transitions = dfa.row(state);
            let (symbol, next) = match alphabet.index_of(byte) {
                Some(symbol) => (symbol, transitions[symbol]),
                None => (transitions.len(), dfa.reject()),
            };
            for &sibling in &transitions[..symbol] {
                rank += &below[sibling as usize];
            }
            state = next;
        }

        if !dfa.is_accepting(state) {
            return Err(FteError::NotAccepted);
        }
        Ok(rank)
    }

    /// The accepted string of `length` bytes at position `rank`.
    pub fn unrank(&self, rank: &BigUint, length: usize) -> Result<Vec<u8>, FteError> {
        let rows = self.table.rows_through(length)?;
        let dfa = self.table.dfa();
        let alphabet = dfa.alphabet();

        if *rank >= rows[length][dfa.start() as usize] {
            return Err(FteError::RankOutOfRange { length });
        }

        let mut remaining = rank.clone();
        let mut state = dfa.start();
        let mut out = Vec::with_capacity(length);
        for i in 0..length {
            let below = &rows[length - 1 - i];
            let mut chosen = None;
            for (symbol, &next) in dfa.row(state).iter().enumerate() {
                let count = &below[next as usize];
                if remaining < *count {
                    chosen = Some((symbol, next));
                    break;
                }
                remaining -= count;
            }
            // Unreachable while the rank is below the start capacity.
            let (symbol, next) = chosen.ok_or(FteError::RankOutOfRange { length })?;
            out.push(alphabet.symbol(symbol));
            state = next;
        }

        debug_assert!(dfa.is_accepting(state));
        debug_assert!(remaining.is_zero());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fte_dfa::TransitionList;

    fn codec(pattern: &str, max_length: usize) -> RankCodec {
        RankCodec::for_dfa(Arc::new(Dfa::from_regex(pattern, max_length).unwrap()))
    }

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn ab_star() {
        let c = codec("ab*", 4);
        assert_eq!(c.unrank(&big(0), 3).unwrap(), b"abb");
        assert_eq!(c.rank(b"abb").unwrap(), big(0));
        assert_eq!(c.rank(b"a").unwrap(), big(0));
    }

    #[test]
    fn pairs_in_lexicographic_order() {
        let c = codec("(a|b)(a|b)", 2);
        let expected: [&[u8]; 4] = [b"aa", b"ab", b"ba", b"bb"];
        for (i, word) in expected.iter().enumerate() {
            assert_eq!(c.unrank(&big(i as u64), 2).unwrap(), *word);
            assert_eq!(c.rank(word).unwrap(), big(i as u64));
        }
        assert!(matches!(
            c.unrank(&big(4), 2).unwrap_err(),
            FteError::RankOutOfRange { length: 2 }
        ));
    }

    #[test]
    fn every_rank_of_a_small_language() {
        let c = codec("[a-c]{1,2}x?[0-9]", 5);
        for length in 0..=5 {
            let cap = c.table().capacity_for(length).unwrap();
            let mut previous: Option<Vec<u8>> = None;
            let mut r = big(0);
            while r < cap {
                let word = c.unrank(&r, length).unwrap();
                assert_eq!(word.len(), length);
                assert!(c.dfa().accepts(&word));
                assert_eq!(c.rank(&word).unwrap(), r);
                if let Some(prev) = &previous {
                    assert!(prev < &word, "unrank must be increasing");
                }
                previous = Some(word);
                r += 1u32;
            }
        }
    }

    #[test]
    fn rejected_inputs() {
        let c = codec("ab*", 8);
        assert!(matches!(c.rank(b"ba").unwrap_err(), FteError::NotAccepted));
        assert!(matches!(c.rank(b"").unwrap_err(), FteError::NotAccepted));
        // 'z' is outside the alphabet entirely.
        assert!(matches!(c.rank(b"abz").unwrap_err(), FteError::NotAccepted));
        assert!(matches!(c.rank(b"zab").unwrap_err(), FteError::NotAccepted));
    }

    #[test]
    fn zero_length() {
        let c = codec("x*", 4);
        assert_eq!(c.table().capacity_for(0).unwrap(), big(1));
        assert_eq!(c.unrank(&big(0), 0).unwrap(), b"");
        assert_eq!(c.rank(b"").unwrap(), big(0));
    }

    #[test]
    fn empty_bucket_has_no_ranks() {
        let c = codec("ab*", 4);
        assert!(matches!(
            c.unrank(&big(0), 0).unwrap_err(),
            FteError::RankOutOfRange { length: 0 }
        ));
    }

    #[test]
    fn beyond_ceiling() {
        let c = codec("[ab]*", 4);
        assert!(matches!(
            c.unrank(&big(0), 5).unwrap_err(),
            FteError::LengthOverflow { .. }
        ));
        assert!(c.rank(b"abab").is_ok());
        assert!(matches!(
            c.rank(b"ababa").unwrap_err(),
            FteError::LengthOverflow { .. }
        ));
    }

    #[test]
    fn unaccepted_beyond_ceiling() {
        let c = codec("[ab]*", 4);
        assert!(matches!(c.rank(b"ababz").unwrap_err(), FteError::NotAccepted));
        assert!(matches!(c.rank(b"zzzzzzzz").unwrap_err(), FteError::NotAccepted));
        // Nothing was computed for the rejected lengths.
        assert_eq!(c.table().computed_len(), 0);
    }

    #[test]
    fn symbol_order_follows_byte_order() {
        // Edges added out of byte order still rank by byte value.
        let mut list = TransitionList::new(2, 0);
        list.add_transition(0, b'z', 1);
        list.add_transition(0, b'a', 1);
        list.add_transition(0, b'm', 1);
        list.set_accepting(1, true);
        let c = RankCodec::for_dfa(Arc::new(Dfa::build(&list, 1).unwrap()));
        assert_eq!(c.unrank(&big(0), 1).unwrap(), b"a");
        assert_eq!(c.unrank(&big(1), 1).unwrap(), b"m");
        assert_eq!(c.unrank(&big(2), 1).unwrap(), b"z");
    }

    #[test]
    fn shared_table_between_codecs() {
        let a = codec("[a-f0-9]{8}", 8);
        let b = a.clone();
        let word = a.unrank(&big(123_456), 8).unwrap();
        assert_eq!(b.rank(&word).unwrap(), big(123_456));
        assert!(Arc::ptr_eq(a.table(), b.table()));
    }
}
