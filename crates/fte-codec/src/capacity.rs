// Capacity table: number of accepted strings per (state, remaining length).

use std::sync::Arc;

use fte_dfa::{Dfa, START_STATE};
use num_bigint::BigUint;
use num_traits::{One, Zero};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::FteError;

/// Hard ceiling on the lengths any table will compute, whatever the
/// automaton's own bound.
pub const LENGTH_CEILING: usize = fte_core::MAX_FORMAT_LENGTH;

/// One row of the table: the capacity of every state for a single length.
pub type CapacityRow = Arc<[BigUint]>;

/// Exact counts of accepted strings, memoized per (length, state).
///
/// `capacity(s, 0)` is 1 for accepting states and 0 otherwise;
/// `capacity(s, L)` is the sum of `capacity(δ(s, a), L - 1)` over the
/// alphabet. Rows are computed bottom-up on demand and never change once
/// stored, so one table can serve any number of concurrent codecs for the
/// same automaton. New rows are computed outside any lock and appended under a
/// short write section, so lookups of rows that already exist never wait on
/// an extension in progress.
pub struct CapacityTable {
    dfa: Arc<Dfa>,
    ceiling: usize,
    rows: RwLock<Vec<CapacityRow>>,
}

impl std::fmt::Debug for CapacityTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapacityTable")
            .field("state_count", &self.dfa.state_count())
            .field("computed_len", &self.computed_len())
            .field("ceiling", &self.ceiling)
            .finish()
    }
}

impl CapacityTable {
    /// Create a table for `dfa`. The ceiling is the automaton's pruning bound
    /// (capped at [`LENGTH_CEILING`]), since longer lengths were not preserved
    /// by pruning.
    pub fn new(dfa: Arc<Dfa>) -> Self {
        let ceiling = dfa.max_length();
        Self::with_ceiling(dfa, ceiling)
    }

    /// Create a table with a lower ceiling than the automaton allows.
    pub fn with_ceiling(dfa: Arc<Dfa>, ceiling: usize) -> Self {
        let ceiling = ceiling.min(dfa.max_length()).min(LENGTH_CEILING);
        let base = base_row(&dfa);
        Self {
            dfa,
            ceiling,
            rows: RwLock::new(vec![base]),
        }
    }

    pub fn dfa(&self) -> &Arc<Dfa> {
        &self.dfa
    }

    /// Longest length this table will compute.
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Longest length computed so far.
    pub fn computed_len(&self) -> usize {
        self.rows.read().len() - 1
    }

    /// Number of strings of exactly `length` symbols accepted from `state`.
    pub fn capacity_of(&self, state: u32, length: usize) -> Result<BigUint, FteError> {
        let row = self.row(length)?;
        row.get(state as usize).cloned().ok_or(FteError::InvalidState {
            state,
            states: row.len(),
        })
    }

    /// Number of accepted strings of exactly `length` symbols.
    pub fn capacity_for(&self, length: usize) -> Result<BigUint, FteError> {
        self.capacity_of(START_STATE, length)
    }

    /// Number of accepted strings whose length lies in `[min, max]`.
    pub fn words_in_range(&self, min: usize, max: usize) -> Result<BigUint, FteError> {
        if min > max {
            return Ok(BigUint::zero());
        }
        let rows = self.rows_through(max)?;
        Ok(rows[min..=max]
            .iter()
            .map(|row| &row[START_STATE as usize])
            .sum())
    }

    /// The capacities of every state for `length`.
    pub fn row(&self, length: usize) -> Result<CapacityRow, FteError> {
        self.ensure(length)?;
        Ok(Arc::clone(&self.rows.read()[length]))
    }

    /// Rows `0..=length`, for walks that need every shorter length.
    pub fn rows_through(&self, length: usize) -> Result<Vec<CapacityRow>, FteError> {
        self.ensure(length)?;
        Ok(self.rows.read()[..=length].to_vec())
    }

    /// Make sure rows up to `length` exist, extending from the last computed
    /// row if needed.
    fn ensure(&self, length: usize) -> Result<(), FteError> {
        if length > self.ceiling {
            return Err(FteError::LengthOverflow {
                requested: length,
                ceiling: self.ceiling,
            });
        }
        let (from, last) = {
            let rows = self.rows.read();
            if length < rows.len() {
                return Ok(());
            }
            (rows.len(), Arc::clone(&rows[rows.len() - 1]))
        };

        let mut computed = Vec::with_capacity(length + 1 - from);
        let mut prev = last;
        for _ in from..=length {
            let next = next_row(&self.dfa, &prev);
            computed.push(Arc::clone(&next));
            prev = next;
        }

        let mut rows = self.rows.write();
        // Another writer may have appended some or all of these rows meanwhile;
        // rows are deterministic, so keep theirs and add only the tail.
        let have = rows.len();
        if have <= length {
            rows.extend(computed.into_iter().skip(have - from));
            tracing::trace!(from = have - 1, to = length, "extended capacity table");
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    /// Copy out every computed row, tagged with the automaton digest.
    pub fn snapshot(&self) -> CapacitySnapshot {
        let rows = self.rows.read();
        CapacitySnapshot {
            digest: self.dfa.digest(),
            rows: rows.iter().map(|row| row.to_vec()).collect(),
        }
    }

    /// Rebuild a table from a snapshot taken for the same automaton.
    ///
    /// The digest, row widths, row count and base row are checked; the other
    /// rows are trusted once those match.
    pub fn restore(dfa: Arc<Dfa>, snapshot: CapacitySnapshot) -> Result<Self, FteError> {
        if snapshot.digest != dfa.digest() {
            return Err(FteError::Snapshot(
                "snapshot was taken for a different automaton".to_string(),
            ));
        }
        let table = Self::new(dfa);
        let Some(base) = snapshot.rows.first() else {
            return Err(FteError::Snapshot("snapshot has no rows".to_string()));
        };
        if base.as_slice() != &*table.rows.read()[0] {
            return Err(FteError::Snapshot("base row does not match automaton".to_string()));
        }
        if snapshot.rows.len() - 1 > table.ceiling {
            return Err(FteError::Snapshot(format!(
                "snapshot holds {} lengths, ceiling is {}",
                snapshot.rows.len() - 1,
                table.ceiling
            )));
        }
        let width = table.dfa.state_count();
        if let Some(row) = snapshot.rows.iter().find(|row| row.len() != width) {
            return Err(FteError::Snapshot(format!(
                "row of width {} for an automaton with {width} states",
                row.len()
            )));
        }

        *table.rows.write() = snapshot.rows.into_iter().map(CapacityRow::from).collect();
        Ok(table)
    }
}

/// Serializable copy of a [`CapacityTable`]'s computed rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacitySnapshot {
    /// [`Dfa::digest`] of the automaton the rows belong to.
    pub digest: [u8; 32],
    /// `rows[length][state]`.
    pub rows: Vec<Vec<BigUint>>,
}

fn base_row(dfa: &Dfa) -> CapacityRow {
    (0..dfa.state_count() as u32)
        .map(|s| {
            if dfa.is_accepting(s) {
                BigUint::one()
            } else {
                BigUint::zero()
            }
        })
        .collect()
}

fn next_row(dfa: &Dfa, prev: &[BigUint]) -> CapacityRow {
    (0..dfa.state_count() as u32)
        .map(|s| {
            dfa.row(s).iter().fold(BigUint::zero(), |mut acc, &t| {
                acc += &prev[t as usize];
                acc
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pattern: &str, max_length: usize) -> CapacityTable {
        CapacityTable::new(Arc::new(Dfa::from_regex(pattern, max_length).unwrap()))
    }

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn ab_star_capacities() {
        let t = table("ab*", 4);
        assert_eq!(t.capacity_for(0).unwrap(), big(0));
        for length in 1..=4 {
            assert_eq!(t.capacity_for(length).unwrap(), big(1), "length {length}");
        }
    }

    #[test]
    fn two_symbol_pairs() {
        let t = table("(a|b)(a|b)", 2);
        assert_eq!(t.capacity_for(2).unwrap(), big(4));
        assert_eq!(t.capacity_for(1).unwrap(), big(0));
    }

    #[test]
    fn base_row_is_zero_or_one() {
        let t = table("[a-c]+x?", 8);
        let dfa = Arc::clone(t.dfa());
        for s in 0..dfa.state_count() as u32 {
            let c = t.capacity_of(s, 0).unwrap();
            assert_eq!(c, if dfa.is_accepting(s) { big(1) } else { big(0) });
        }
        assert_eq!(t.capacity_of(dfa.reject(), 5).unwrap(), big(0));
    }

    #[test]
    fn exceeds_native_integers() {
        let t = table("[\\x00-\\xff]*", 64);
        let expected = BigUint::one() << (8 * 64);
        assert_eq!(t.capacity_for(64).unwrap(), expected);
    }

    #[test]
    fn lazy_growth() {
        let t = table("[ab]*", 32);
        assert_eq!(t.computed_len(), 0);
        assert_eq!(t.capacity_for(10).unwrap(), big(1024));
        assert_eq!(t.computed_len(), 10);
        // Shorter lengths reuse stored rows.
        assert_eq!(t.capacity_for(3).unwrap(), big(8));
        assert_eq!(t.computed_len(), 10);
        assert_eq!(t.capacity_for(11).unwrap(), big(2048));
        assert_eq!(t.computed_len(), 11);
    }

    #[test]
    fn length_overflow() {
        let t = table("[ab]*", 16);
        assert_eq!(t.ceiling(), 16);
        assert!(t.capacity_for(16).is_ok());
        assert!(matches!(
            t.capacity_for(17).unwrap_err(),
            FteError::LengthOverflow {
                requested: 17,
                ceiling: 16
            }
        ));
        // A failed request must not grow the table.
        assert_eq!(t.computed_len(), 16);
    }

    #[test]
    fn explicit_ceiling() {
        let dfa = Arc::new(Dfa::from_regex("[ab]*", 64).unwrap());
        let t = CapacityTable::with_ceiling(dfa, 8);
        assert_eq!(t.ceiling(), 8);
        assert!(t.capacity_for(9).is_err());
    }

    #[test]
    fn words_in_range_sums_lengths() {
        let t = table("[ab]*", 8);
        // 1 + 2 + 4 + 8
        assert_eq!(t.words_in_range(0, 3).unwrap(), big(15));
        assert_eq!(t.words_in_range(2, 2).unwrap(), big(4));
        assert_eq!(t.words_in_range(3, 2).unwrap(), big(0));
    }

    #[test]
    fn concurrent_growth_matches_sequential() {
        let shared = Arc::new(table("[a-f]{2,}x*", 96));
        std::thread::scope(|scope| {
            for length in [96, 40, 95, 7, 64, 96] {
                let shared = Arc::clone(&shared);
                scope.spawn(move || shared.capacity_for(length).unwrap());
            }
        });
        let sequential = table("[a-f]{2,}x*", 96);
        for length in 0..=96 {
            assert_eq!(
                shared.capacity_for(length).unwrap(),
                sequential.capacity_for(length).unwrap()
            );
        }
    }

    #[test]
    fn unknown_state_is_an_error() {
        let t = table("[ab]*", 8);
        let states = t.dfa().state_count();
        assert!(matches!(
            t.capacity_of(states as u32, 2).unwrap_err(),
            FteError::InvalidState { state, states: n } if state as usize == n
        ));
        assert!(t.capacity_of(u32::MAX, 0).is_err());
        assert!(t.capacity_of(t.dfa().reject(), 2).is_ok());
    }

    #[test]
    fn memoized_lookups_during_extension() {
        let shared = Arc::new(table("[\\x00-\\xff]*", 512));
        shared.capacity_for(16).unwrap();
        std::thread::scope(|scope| {
            for length in [512, 300, 511] {
                let shared = Arc::clone(&shared);
                scope.spawn(move || shared.capacity_for(length).unwrap());
            }
            for _ in 0..4 {
                let shared = Arc::clone(&shared);
                scope.spawn(move || {
                    for length in 0..=16 {
                        let expected = BigUint::one() << (8 * length);
                        assert_eq!(shared.capacity_for(length).unwrap(), expected);
                    }
                });
            }
        });
        assert_eq!(shared.computed_len(), 512);
        for length in [0, 17, 299, 300, 301, 512] {
            let row = shared.row(length).unwrap();
            assert_eq!(row.len(), shared.dfa().state_count());
        }
        assert_eq!(
            shared.capacity_for(512).unwrap(),
            table("[\\x00-\\xff]*", 512).capacity_for(512).unwrap()
        );
    }

    #[test]
    fn snapshot_restore() {
        let t = table("[a-c]{1,4}-[0-9]+", 24);
        t.capacity_for(24).unwrap();
        let snapshot = t.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored = CapacityTable::restore(
            Arc::clone(t.dfa()),
            serde_json::from_str(&json).unwrap(),
        )
        .unwrap();
        assert_eq!(restored.computed_len(), 24);
        assert_eq!(restored.capacity_for(24).unwrap(), t.capacity_for(24).unwrap());
    }

    #[test]
    fn snapshot_for_other_automaton_is_rejected() {
        let a = table("[ab]*", 8);
        let b = table("[abc]*", 8);
        let err = CapacityTable::restore(Arc::clone(b.dfa()), a.snapshot()).unwrap_err();
        assert!(matches!(err, FteError::Snapshot(_)));
    }

    #[test]
    fn snapshot_with_bad_rows_is_rejected() {
        let t = table("[ab]*", 8);
        t.capacity_for(4).unwrap();

        let mut empty = t.snapshot();
        empty.rows.clear();
        assert!(CapacityTable::restore(Arc::clone(t.dfa()), empty).is_err());

        let mut narrow = t.snapshot();
        narrow.rows[2].pop();
        assert!(CapacityTable::restore(Arc::clone(t.dfa()), narrow).is_err());

        let mut wrong_base = t.snapshot();
        wrong_base.rows[0][0] = big(7);
        assert!(CapacityTable::restore(Arc::clone(t.dfa()), wrong_base).is_err());
    }
}
