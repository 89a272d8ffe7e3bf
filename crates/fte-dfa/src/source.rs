// Automaton sources: the narrow interface external DFA producers implement.

/// Anything that can describe a deterministic automaton over bytes.
///
/// This is the only capability [`Dfa::build`](crate::Dfa::build) needs from
/// an external compiler: numbered states, a start state, an accepting set and
/// the defined transitions of each state. Missing transitions are allowed and
/// mean "reject". Determinism is checked during the build.
pub trait DfaSource {
    /// Number of states; states are numbered `0..state_count()`.
    fn state_count(&self) -> usize;

    /// Index of the start state.
    fn start(&self) -> usize;

    /// Whether the automaton accepts when the input ends in `state`.
    fn is_accepting(&self, state: usize) -> bool;

    /// Defined transitions leaving `state`, as `(byte, target)` pairs in any
    /// order.
    fn transitions(&self, state: usize) -> Vec<(u8, usize)>;
}

/// An explicit edge-list automaton.
///
/// Produced by the regex and ATT front ends, and convenient for building
/// automata by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionList {
    start: usize,
    accepting: Vec<bool>,
    edges: Vec<Vec<(u8, usize)>>,
}

impl TransitionList {
    /// Create a list with `state_count` states and no transitions.
    pub fn new(state_count: usize, start: usize) -> Self {
        Self {
            start,
            accepting: vec![false; state_count],
            edges: vec![Vec::new(); state_count],
        }
    }

    /// Append a fresh state and return its index.
    pub fn add_state(&mut self) -> usize {
        self.accepting.push(false);
        self.edges.push(Vec::new());
        self.accepting.len() - 1
    }

    /// Add the transition `from --byte--> to`, growing the state set if
    /// either endpoint is new.
    pub fn add_transition(&mut self, from: usize, byte: u8, to: usize) {
        self.ensure_state(from.max(to));
        self.edges[from].push((byte, to));
    }

    pub fn set_accepting(&mut self, state: usize, accepting: bool) {
        self.ensure_state(state);
        self.accepting[state] = accepting;
    }

    pub fn set_start(&mut self, state: usize) {
        self.ensure_state(state);
        self.start = state;
    }

    /// Total number of transitions.
    pub fn transition_count(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    fn ensure_state(&mut self, state: usize) {
        if state >= self.accepting.len() {
            self.accepting.resize(state + 1, false);
            self.edges.resize(state + 1, Vec::new());
        }
    }
}

impl DfaSource for TransitionList {
    fn state_count(&self) -> usize {
        self.accepting.len()
    }

    fn start(&self) -> usize {
        self.start
    }

    fn is_accepting(&self, state: usize) -> bool {
        self.accepting.get(state).copied().unwrap_or(false)
    }

    fn transitions(&self, state: usize) -> Vec<(u8, usize)> {
        self.edges.get(state).cloned().unwrap_or_default()
    }
}
