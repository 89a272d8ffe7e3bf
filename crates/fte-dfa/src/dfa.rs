// Canonical total DFA: construction from a source, pruning, binary form.

use std::collections::VecDeque;

use hashbrown::HashMap;
use sha2::{Digest, Sha256};

use crate::DfaError;
use crate::alphabet::Alphabet;
use crate::att;
use crate::format::{self, HEADER_SIZE};
use crate::regex;
use crate::source::DfaSource;
use crate::transition::TransitionTable;

/// Index of the start state in every canonical automaton.
pub const START_STATE: u32 = 0;

/// Marks a source state that did not survive pruning.
const UNMAPPED: u32 = u32::MAX;

/// Size of the fixed body prefix after the header: symbol count (u16),
/// state count (u32), max length (u32).
const BODY_PREFIX_SIZE: usize = 10;

/// A canonical, total, deterministic automaton over an ordered byte alphabet.
///
/// Invariants, established by [`Dfa::build`] and checked by
/// [`Dfa::from_bytes`]:
/// - states are `0..state_count()`, the start state is [`START_STATE`];
/// - the last state is the reject sink: non-accepting, every symbol loops;
/// - δ is total over the alphabet;
/// - every state except the start and the reject sink reaches an accepting
///   state within `max_length()` symbols.
///
/// A `Dfa` is immutable once built and is meant to be shared (e.g. behind an
/// `Arc`) by every codec using the same format.
#[derive(Clone, PartialEq, Eq)]
pub struct Dfa {
    alphabet: Alphabet,
    table: TransitionTable,
    accepting: Vec<bool>,
    max_length: usize,
}

impl std::fmt::Debug for Dfa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dfa")
            .field("state_count", &self.state_count())
            .field("accepting_count", &self.accepting.iter().filter(|&&a| a).count())
            .field("alphabet", &self.alphabet)
            .field("max_length", &self.max_length)
            .finish()
    }
}

impl Dfa {
    /// Compile a regular expression and canonicalize the result.
    ///
    /// See [`regex::compile_regex`] for the matching semantics.
    pub fn from_regex(pattern: &str, max_length: usize) -> Result<Self, DfaError> {
        let source = regex::compile_regex(pattern)?;
        Self::build(&source, max_length)
    }

    /// Parse an AT&T FSM text automaton and canonicalize it.
    pub fn from_att(text: &str, max_length: usize) -> Result<Self, DfaError> {
        let source = att::parse_att(text)?;
        Self::build(&source, max_length)
    }

    /// Build the canonical automaton for `source`.
    ///
    /// States unreachable from the start, and states that cannot reach an
    /// accepting state within `max_length` symbols, are removed; moves into
    /// them go to the reject sink instead. This keeps every string of length
    /// at most `max_length` that `source` accepts. Longer strings may be lost,
    /// so capacities above `max_length` are not meaningful.
    ///
    /// Equivalent surviving states are merged, and the result is numbered
    /// breadth-first from the start following symbols in byte order. Two
    /// sources for the same language therefore build identical automata,
    /// whatever their own state numbering.
    pub fn build<S: DfaSource + ?Sized>(source: &S, max_length: usize) -> Result<Self, DfaError> {
        let n = source.state_count();
        if n == 0 {
            return Err(DfaError::InvalidSource("automaton has no states".to_string()));
        }
        if n >= UNMAPPED as usize {
            return Err(DfaError::InvalidSource(format!("too many states: {n}")));
        }
        if u32::try_from(max_length).is_err() {
            return Err(DfaError::InvalidSource(format!("max_length {max_length} too large")));
        }
        let start = source.start();
        if start >= n {
            return Err(DfaError::InvalidSource(format!(
                "start state {start} out of range for {n} states"
            )));
        }

        let edges = collect_edges(source, n)?;
        let reachable = forward_reachable(&edges, start);
        let distance = distance_to_accept(source, &edges, max_length);

        let keep: Vec<bool> = (0..n)
            .map(|s| s == start || (reachable[s] && distance[s] <= max_length))
            .collect();

        // Renumber breadth-first over kept edges only; a kept state reachable
        // only through pruned states is dropped here as well.
        let mut renumber = vec![UNMAPPED; n];
        let mut order: Vec<usize> = Vec::new();
        let mut queue = VecDeque::new();
        renumber[start] = START_STATE;
        order.push(start);
        queue.push_back(start);
        while let Some(s) = queue.pop_front() {
            for &(_, t) in &edges[s] {
                if keep[t] && renumber[t] == UNMAPPED {
                    renumber[t] = order.len() as u32;
                    order.push(t);
                    queue.push_back(t);
                }
            }
        }

        let alphabet = Alphabet::from_symbols(order.iter().flat_map(|&s| {
            edges[s]
                .iter()
                .filter(|&&(_, t)| renumber[t] != UNMAPPED)
                .map(|&(b, _)| b)
        }));

        let reject = order.len() as u32;
        let state_count = order.len() + 1;
        let mut table = TransitionTable::new(state_count, alphabet.len(), reject);
        let mut accepting = vec![false; state_count];
        for (new, &old) in order.iter().enumerate() {
            accepting[new] = source.is_accepting(old);
            for &(b, t) in &edges[old] {
                if renumber[t] != UNMAPPED {
                    // Every byte on a surviving edge is in the alphabet.
                    if let Some(symbol) = alphabet.index_of(b) {
                        table.set(new as u32, symbol, renumber[t]);
                    }
                }
            }
        }

        let (table, accepting) = minimize(&table, &accepting);

        tracing::debug!(
            source_states = n,
            kept = order.len(),
            pruned = n - order.len(),
            states = accepting.len(),
            symbols = alphabet.len(),
            max_length,
            "built canonical automaton"
        );

        Ok(Self {
            alphabet,
            table,
            accepting,
            max_length,
        })
    }

    /// The start state (always [`START_STATE`]).
    #[inline]
    pub fn start(&self) -> u32 {
        START_STATE
    }

    /// The reject sink (always the last state).
    #[inline]
    pub fn reject(&self) -> u32 {
        (self.accepting.len() - 1) as u32
    }

    /// Number of states, including the reject sink.
    #[inline]
    pub fn state_count(&self) -> usize {
        self.accepting.len()
    }

    #[inline]
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// The length bound used for pruning.
    #[inline]
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    #[inline]
    pub fn is_accepting(&self, state: u32) -> bool {
        self.accepting[state as usize]
    }

    /// δ(state, symbol) where `symbol` is an alphabet index.
    #[inline]
    pub fn next(&self, state: u32, symbol: usize) -> u32 {
        self.table.next(state, symbol)
    }

    /// Targets of `state` in alphabet order.
    #[inline]
    pub fn row(&self, state: u32) -> &[u32] {
        self.table.row(state)
    }

    /// One step on a raw byte; bytes outside the alphabet lead to the reject
    /// sink.
    #[inline]
    pub fn step_byte(&self, state: u32, byte: u8) -> u32 {
        match self.alphabet.index_of(byte) {
            Some(symbol) => self.table.next(state, symbol),
            None => self.reject(),
        }
    }

    /// Run the automaton over all of `input` and return the final state.
    ///
    /// The walk never stops early: once in the reject sink it keeps stepping,
    /// so the work done depends only on the input length.
    pub fn walk(&self, input: &[u8]) -> u32 {
        input
            .iter()
            .fold(self.start(), |state, &b| self.step_byte(state, b))
    }

    /// Whether the automaton accepts `input`.
    pub fn accepts(&self, input: &[u8]) -> bool {
        self.is_accepting(self.walk(input))
    }

    // -----------------------------------------------------------------------
    // Binary form
    // -----------------------------------------------------------------------

    /// Serialize to the binary DFA layout.
    ///
    /// Layout after the 16-byte header: symbol count (u16 LE), state count
    /// (u32 LE), max length (u32 LE), the alphabet bytes, one accepting flag
    /// byte per state, zero padding to a 4-byte boundary, then the transition
    /// table as row-major u32 LE targets.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            HEADER_SIZE + BODY_PREFIX_SIZE + self.alphabet.len() + self.state_count() + 3
                + self.table.byte_len(),
        );
        format::write_header(&mut out);
        out.extend_from_slice(&(self.alphabet.len() as u16).to_le_bytes());
        out.extend_from_slice(&(self.state_count() as u32).to_le_bytes());
        out.extend_from_slice(&(self.max_length as u32).to_le_bytes());
        out.extend_from_slice(self.alphabet.symbols());
        out.extend(self.accepting.iter().map(|&a| u8::from(a)));
        let partial = out.len() % 4;
        if partial > 0 {
            out.resize(out.len() + (4 - partial), 0);
        }
        out.extend_from_slice(&self.table.to_le_bytes());
        out
    }

    /// Load an automaton written by [`Dfa::to_bytes`], re-checking every
    /// structural invariant that can be checked locally.
    pub fn from_bytes(data: &[u8]) -> Result<Self, DfaError> {
        format::parse_header(data)?;

        let mut pos = HEADER_SIZE;
        let prefix = take(data, pos, BODY_PREFIX_SIZE)?;
        let symbol_count = u16::from_le_bytes([prefix[0], prefix[1]]) as usize;
        let state_count = u32::from_le_bytes([prefix[2], prefix[3], prefix[4], prefix[5]]) as usize;
        let max_length = u32::from_le_bytes([prefix[6], prefix[7], prefix[8], prefix[9]]) as usize;
        pos += BODY_PREFIX_SIZE;

        if symbol_count > 256 {
            return Err(DfaError::InvalidTable(format!(
                "alphabet of {symbol_count} symbols exceeds the byte range"
            )));
        }
        if state_count < 2 {
            return Err(DfaError::InvalidTable(
                "automaton needs a start state and a reject state".to_string(),
            ));
        }

        let alphabet = Alphabet::from_sorted(take(data, pos, symbol_count)?)?;
        pos += symbol_count;

        let flags = take(data, pos, state_count)?;
        let accepting = flags
            .iter()
            .map(|&f| match f {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(DfaError::InvalidTable(format!("invalid accepting flag {other}"))),
            })
            .collect::<Result<Vec<bool>, DfaError>>()?;
        pos += state_count;

        let partial = pos % 4;
        if partial > 0 {
            pos += 4 - partial;
        }
        if pos > data.len() {
            return Err(DfaError::TooShort {
                expected: pos,
                actual: data.len(),
            });
        }
        let table = TransitionTable::from_le_bytes(&data[pos..], state_count, symbol_count)?;

        let dfa = Self {
            alphabet,
            table,
            accepting,
            max_length,
        };
        let reject = dfa.reject();
        if dfa.is_accepting(reject) || dfa.row(reject).iter().any(|&t| t != reject) {
            return Err(DfaError::InvalidTable(
                "last state is not a non-accepting sink".to_string(),
            ));
        }
        Ok(dfa)
    }

    /// SHA-256 of the binary form.
    ///
    /// Identifies the automaton for anything derived from it (such as a saved
    /// capacity table).
    pub fn digest(&self) -> [u8; 32] {
        Sha256::digest(self.to_bytes()).into()
    }
}

/// Merge equivalent states by Moore partition refinement.
///
/// Classes start as accepting / non-accepting and are split by the classes
/// of their successors until nothing changes. The quotient is renumbered
/// breadth-first from the start, with the reject class placed last. External
/// compilers often emit equivalent states (for instance a state that records
/// "a match just ended" next to one that does not); merging them makes the
/// result depend only on the language.
fn minimize(table: &TransitionTable, accepting: &[bool]) -> (TransitionTable, Vec<bool>) {
    let n = accepting.len();
    let reject = n - 1;

    let mut class: Vec<u32> = accepting.iter().map(|&a| u32::from(a)).collect();
    let mut class_count: usize = if accepting.iter().any(|&a| a) { 2 } else { 1 };
    loop {
        let mut ids: HashMap<Vec<u32>, u32> = HashMap::new();
        let mut refined = Vec::with_capacity(n);
        for s in 0..n {
            let mut signature = Vec::with_capacity(table.symbol_count() + 1);
            signature.push(class[s]);
            signature.extend(table.row(s as u32).iter().map(|&t| class[t as usize]));
            let fresh = ids.len() as u32;
            refined.push(*ids.entry(signature).or_insert(fresh));
        }
        let count = ids.len();
        class = refined;
        if count == class_count {
            break;
        }
        class_count = count;
    }

    let mut representative = vec![UNMAPPED; class_count];
    for (s, &c) in class.iter().enumerate().rev() {
        representative[c as usize] = s as u32;
    }

    let reject_class = class[reject];
    let start_class = class[START_STATE as usize];
    let mut index = vec![UNMAPPED; class_count];
    let mut order: Vec<u32> = vec![START_STATE];
    if start_class != reject_class {
        index[start_class as usize] = 0;
    }
    let mut cursor = 0;
    while cursor < order.len() {
        let s = order[cursor];
        cursor += 1;
        for &t in table.row(s) {
            let c = class[t as usize];
            if c != reject_class && index[c as usize] == UNMAPPED {
                index[c as usize] = order.len() as u32;
                order.push(representative[c as usize]);
            }
        }
    }
    let new_reject = order.len() as u32;
    index[reject_class as usize] = new_reject;

    let state_count = order.len() + 1;
    let mut merged = TransitionTable::new(state_count, table.symbol_count(), new_reject);
    let mut merged_accepting = vec![false; state_count];
    for (new, &s) in order.iter().enumerate() {
        merged_accepting[new] = accepting[s as usize];
        for (symbol, &t) in table.row(s).iter().enumerate() {
            merged.set(new as u32, symbol, index[class[t as usize] as usize]);
        }
    }
    (merged, merged_accepting)
}

/// Read, sort and validate the edges of every source state.
fn collect_edges<S: DfaSource + ?Sized>(
    source: &S,
    n: usize,
) -> Result<Vec<Vec<(u8, usize)>>, DfaError> {
    let mut edges = Vec::with_capacity(n);
    for state in 0..n {
        let mut out = source.transitions(state);
        out.sort_unstable();
        out.dedup();
        for pair in out.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(DfaError::Nondeterministic {
                    state,
                    byte: pair[0].0,
                });
            }
        }
        if let Some(&(_, t)) = out.iter().find(|&&(_, t)| t >= n) {
            return Err(DfaError::InvalidSource(format!(
                "transition from state {state} targets state {t}, out of range for {n} states"
            )));
        }
        edges.push(out);
    }
    Ok(edges)
}

fn forward_reachable(edges: &[Vec<(u8, usize)>], start: usize) -> Vec<bool> {
    let mut seen = vec![false; edges.len()];
    let mut queue = VecDeque::new();
    seen[start] = true;
    queue.push_back(start);
    while let Some(s) = queue.pop_front() {
        for &(_, t) in &edges[s] {
            if !seen[t] {
                seen[t] = true;
                queue.push_back(t);
            }
        }
    }
    seen
}

/// Shortest number of symbols from each state to an accepting state, found by
/// a backward breadth-first search that stops at `max_length`. States further
/// away (or with no path at all) get `usize::MAX`.
fn distance_to_accept<S: DfaSource + ?Sized>(
    source: &S,
    edges: &[Vec<(u8, usize)>],
    max_length: usize,
) -> Vec<usize> {
    let n = edges.len();
    let mut reverse: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (s, out) in edges.iter().enumerate() {
        for &(_, t) in out {
            reverse[t].push(s);
        }
    }

    let mut distance = vec![usize::MAX; n];
    let mut queue = VecDeque::new();
    for s in 0..n {
        if source.is_accepting(s) {
            distance[s] = 0;
            queue.push_back(s);
        }
    }
    while let Some(t) = queue.pop_front() {
        let d = distance[t];
        if d >= max_length {
            continue;
        }
        for &s in &reverse[t] {
            if distance[s] == usize::MAX {
                distance[s] = d + 1;
                queue.push_back(s);
            }
        }
    }
    distance
}

fn take(data: &[u8], pos: usize, len: usize) -> Result<&[u8], DfaError> {
    data.get(pos..pos + len).ok_or(DfaError::TooShort {
        expected: pos + len,
        actual: data.len(),
    })
}
