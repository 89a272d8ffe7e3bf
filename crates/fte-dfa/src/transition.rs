// Dense row-major transition table.

use crate::DfaError;

/// Total transition function `δ: State × Σ → State`.
///
/// Stored as one `u32` target per (state, symbol index) pair, row-major by
/// state, so a step is a single indexed load. Symbol indices refer to
/// positions in the automaton's [`Alphabet`](crate::Alphabet), not to byte
/// values.
#[derive(Clone, PartialEq, Eq)]
pub struct TransitionTable {
    state_count: usize,
    symbol_count: usize,
    targets: Vec<u32>,
}

impl std::fmt::Debug for TransitionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionTable")
            .field("state_count", &self.state_count)
            .field("symbol_count", &self.symbol_count)
            .finish()
    }
}

impl TransitionTable {
    /// Create a table with every transition pointing at `fill`.
    pub fn new(state_count: usize, symbol_count: usize, fill: u32) -> Self {
        Self {
            state_count,
            symbol_count,
            targets: vec![fill; state_count * symbol_count],
        }
    }

    #[inline]
    pub fn state_count(&self) -> usize {
        self.state_count
    }

    #[inline]
    pub fn symbol_count(&self) -> usize {
        self.symbol_count
    }

    /// Target of the transition from `state` on the symbol at `symbol` index.
    #[inline]
    pub fn next(&self, state: u32, symbol: usize) -> u32 {
        self.targets[state as usize * self.symbol_count + symbol]
    }

    #[inline]
    pub fn set(&mut self, state: u32, symbol: usize, target: u32) {
        self.targets[state as usize * self.symbol_count + symbol] = target;
    }

    /// All targets leaving `state`, in alphabet order.
    #[inline]
    pub fn row(&self, state: u32) -> &[u32] {
        let start = state as usize * self.symbol_count;
        &self.targets[start..start + self.symbol_count]
    }

    /// Size in bytes of the serialized table.
    pub fn byte_len(&self) -> usize {
        self.targets.len() * size_of::<u32>()
    }

    /// Serialize the targets as little-endian `u32`s.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let le: Vec<u32> = self.targets.iter().map(|t| t.to_le()).collect();
        bytemuck::cast_slice::<u32, u8>(&le).to_vec()
    }

    /// Load a table from little-endian `u32` targets.
    ///
    /// The data is copied into an owned, aligned `Vec<u32>`; the source slice
    /// may sit at any offset of the file. Every target is checked against
    /// `state_count`.
    pub fn from_le_bytes(
        data: &[u8],
        state_count: usize,
        symbol_count: usize,
    ) -> Result<Self, DfaError> {
        let cells = state_count
            .checked_mul(symbol_count)
            .ok_or_else(|| DfaError::InvalidTable("table dimensions overflow".to_string()))?;
        let byte_len = cells
            .checked_mul(size_of::<u32>())
            .ok_or_else(|| DfaError::InvalidTable("table dimensions overflow".to_string()))?;
        if data.len() < byte_len {
            return Err(DfaError::TooShort {
                expected: byte_len,
                actual: data.len(),
            });
        }

        let mut targets = vec![0u32; cells];
        bytemuck::cast_slice_mut::<u32, u8>(&mut targets).copy_from_slice(&data[..byte_len]);
        for target in &mut targets {
            *target = u32::from_le(*target);
            if *target as usize >= state_count {
                return Err(DfaError::InvalidTable(format!(
                    "transition target {target} out of range for {state_count} states"
                )));
            }
        }

        Ok(Self {
            state_count,
            symbol_count,
            targets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_table_is_filled() {
        let table = TransitionTable::new(3, 2, 2);
        for state in 0..3 {
            assert_eq!(table.row(state), &[2, 2]);
        }
    }

    #[test]
    fn set_and_next() {
        let mut table = TransitionTable::new(3, 2, 2);
        table.set(0, 1, 1);
        assert_eq!(table.next(0, 0), 2);
        assert_eq!(table.next(0, 1), 1);
        assert_eq!(table.row(0), &[2, 1]);
    }

    #[test]
    fn zero_symbol_table() {
        let table = TransitionTable::new(2, 0, 1);
        assert!(table.row(0).is_empty());
        assert_eq!(table.byte_len(), 0);
    }

    #[test]
    fn le_bytes_layout() {
        let mut table = TransitionTable::new(2, 2, 1);
        table.set(0, 0, 0);
        let bytes = table.to_le_bytes();
        assert_eq!(
            bytes,
            [
                0x00, 0x00, 0x00, 0x00, // (0, 0) -> 0
                0x01, 0x00, 0x00, 0x00, // (0, 1) -> 1
                0x01, 0x00, 0x00, 0x00, // (1, 0) -> 1
                0x01, 0x00, 0x00, 0x00, // (1, 1) -> 1
            ]
        );
        let loaded = TransitionTable::from_le_bytes(&bytes, 2, 2).unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn reject_short_data() {
        let err = TransitionTable::from_le_bytes(&[0u8; 7], 1, 2).unwrap_err();
        assert!(matches!(err, DfaError::TooShort { expected: 8, actual: 7 }));
    }

    #[test]
    fn reject_out_of_range_target() {
        let bytes = [0x05, 0x00, 0x00, 0x00];
        let err = TransitionTable::from_le_bytes(&bytes, 1, 1).unwrap_err();
        assert!(matches!(err, DfaError::InvalidTable(_)));
    }
}
