// DFA extraction from a regular expression.
//
// The pattern is compiled by `regex-automata` into a dense DFA and the
// reachable part of that DFA is copied out state by state into an edge list.

use std::collections::VecDeque;

use hashbrown::HashMap;
use regex_automata::dfa::{Automaton, StartKind, dense};
use regex_automata::nfa::thompson;
use regex_automata::util::primitives::StateID;
use regex_automata::util::syntax;
use regex_automata::{Anchored, Input, MatchKind};

use crate::DfaError;
use crate::source::{DfaSource, TransitionList};

/// Upper bound on the memory the regex compiler may spend on one pattern.
const DFA_SIZE_LIMIT: usize = 64 << 20;

/// Compile `pattern` into an explicit edge list.
///
/// Matching is byte-oriented (Unicode classes and UTF-8 validation are off,
/// so `.` and `[^x]` range over single bytes) and whole-string: a string is
/// accepted only if the pattern matches all of it from the first byte.
pub fn compile_regex(pattern: &str) -> Result<TransitionList, DfaError> {
    let dfa = dense::Builder::new()
        .configure(
            dense::DFA::config()
                .start_kind(StartKind::Anchored)
                .match_kind(MatchKind::All)
                .dfa_size_limit(Some(DFA_SIZE_LIMIT))
                .determinize_size_limit(Some(DFA_SIZE_LIMIT)),
        )
        .syntax(syntax::Config::new().unicode(false).utf8(false))
        .thompson(thompson::Config::new().utf8(false))
        .build(pattern)
        .map_err(|e| DfaError::SpecCompile(e.to_string()))?;

    let list = explore(&dfa)?;
    tracing::trace!(
        pattern,
        states = list.state_count(),
        transitions = list.transition_count(),
        "extracted DFA from pattern"
    );
    Ok(list)
}

/// Breadth-first copy of every state reachable from the anchored start.
///
/// `regex-automata` reports matches one byte late, so a state accepts iff its
/// end-of-input transition lands in a match state. Dead and quit states are
/// dropped; the canonical build routes those moves to its reject state.
fn explore<A: Automaton>(dfa: &A) -> Result<TransitionList, DfaError> {
    let input = Input::new("").anchored(Anchored::Yes);
    let start = dfa
        .start_state_forward(&input)
        .map_err(|e| DfaError::SpecCompile(e.to_string()))?;

    let mut list = TransitionList::default();
    let mut ids: HashMap<StateID, usize> = HashMap::new();
    let mut queue: VecDeque<StateID> = VecDeque::new();

    ids.insert(start, list.add_state());
    queue.push_back(start);

    while let Some(id) = queue.pop_front() {
        let from = ids[&id];
        if dfa.is_match_state(dfa.next_eoi_state(id)) {
            list.set_accepting(from, true);
        }
        for byte in 0..=255u8 {
            let next = dfa.next_state(id, byte);
            if dfa.is_dead_state(next) || dfa.is_quit_state(next) {
                continue;
            }
            let to = match ids.get(&next) {
                Some(&index) => index,
                None => {
                    let index = list.add_state();
                    ids.insert(next, index);
                    queue.push_back(next);
                    index
                }
            };
            list.add_transition(from, byte, to);
        }
    }

    list.set_start(0);
    Ok(list)
}
