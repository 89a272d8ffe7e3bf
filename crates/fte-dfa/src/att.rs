// AT&T FSM text format reader.
//
// Each non-empty line is either a transition or a final state:
//
//   src dst in out [weight]     transition on input byte `in` (0..=255)
//   state [weight]              `state` is accepting
//
// Fields are whitespace-separated (the usual form is tab-separated). The
// start state is the source of the first transition. An empty line ends the
// automaton; anything after it is ignored.

use hashbrown::HashMap;

use crate::DfaError;
use crate::source::TransitionList;

/// Parse an ATT text automaton into an edge list.
///
/// State labels may be any non-negative integers; they are renumbered densely
/// in order of first appearance. The output label and weights are read for
/// validation only.
pub fn parse_att(text: &str) -> Result<TransitionList, DfaError> {
    let mut list = TransitionList::default();
    let mut labels: HashMap<u64, usize> = HashMap::new();
    let mut start: Option<usize> = None;

    let mut intern = |list: &mut TransitionList, label: u64| -> usize {
        *labels.entry(label).or_insert_with(|| list.add_state())
    };

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        if line.trim().is_empty() {
            break;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.len() {
            4 | 5 => {
                let src = parse_state(fields[0], line_no)?;
                let dst = parse_state(fields[1], line_no)?;
                let byte = parse_symbol(fields[2], line_no)?;
                parse_symbol(fields[3], line_no)?;
                if let Some(weight) = fields.get(4) {
                    parse_weight(weight, line_no)?;
                }
                let from = intern(&mut list, src);
                let to = intern(&mut list, dst);
                start.get_or_insert(from);
                list.add_transition(from, byte, to);
            }
            1 | 2 => {
                let state = parse_state(fields[0], line_no)?;
                if let Some(weight) = fields.get(1) {
                    parse_weight(weight, line_no)?;
                }
                let state = intern(&mut list, state);
                list.set_accepting(state, true);
            }
            n => {
                return Err(DfaError::InvalidAtt {
                    line: line_no,
                    reason: format!("expected 1, 2, 4 or 5 fields, found {n}"),
                });
            }
        }
    }

    if list.transition_count() == 0 && labels.is_empty() {
        return Err(DfaError::InvalidSource("ATT automaton has no states".to_string()));
    }
    // Without transitions the only meaningful start is the first state listed.
    list.set_start(start.unwrap_or(0));
    Ok(list)
}

fn parse_state(field: &str, line: usize) -> Result<u64, DfaError> {
    field.parse::<u64>().map_err(|_| DfaError::InvalidAtt {
        line,
        reason: format!("invalid state label {field:?}"),
    })
}

fn parse_symbol(field: &str, line: usize) -> Result<u8, DfaError> {
    field.parse::<u8>().map_err(|_| DfaError::InvalidAtt {
        line,
        reason: format!("symbol {field:?} is not in the range 0..=255"),
    })
}

fn parse_weight(field: &str, line: usize) -> Result<(), DfaError> {
    field.parse::<f64>().map(|_| ()).map_err(|_| DfaError::InvalidAtt {
        line,
        reason: format!("invalid weight {field:?}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::DfaSource;

    #[test]
    fn parse_ab_star() {
        // 0 -a-> 1, 1 -b-> 1, 1 final
        let text = "0\t1\t97\t97\n1\t1\t98\t98\n1\n";
        let list = parse_att(text).unwrap();
        assert_eq!(list.state_count(), 2);
        assert_eq!(list.start(), 0);
        assert!(list.is_accepting(1));
        assert!(!list.is_accepting(0));
        assert_eq!(list.transitions(0), vec![(b'a', 1)]);
        assert_eq!(list.transitions(1), vec![(b'b', 1)]);
    }

    #[test]
    fn labels_are_renumbered_by_first_appearance() {
        let text = "7 3 97 97\n3 9 98 98\n9\n";
        let list = parse_att(text).unwrap();
        assert_eq!(list.state_count(), 3);
        assert_eq!(list.start(), 0);
        assert_eq!(list.transitions(0), vec![(b'a', 1)]);
        assert_eq!(list.transitions(1), vec![(b'b', 2)]);
        assert!(list.is_accepting(2));
    }

    #[test]
    fn weights_are_accepted() {
        let text = "0 1 97 97 0.5\n1 0.0\n";
        let list = parse_att(text).unwrap();
        assert!(list.is_accepting(1));
    }

    #[test]
    fn empty_line_ends_automaton() {
        let text = "0 1 97 97\n1\n\ngarbage that is never read\n";
        assert!(parse_att(text).is_ok());
    }

    #[test]
    fn reject_bad_field_count() {
        let err = parse_att("0 1 97\n").unwrap_err();
        assert!(matches!(err, DfaError::InvalidAtt { line: 1, .. }));
    }

    #[test]
    fn reject_symbol_out_of_range() {
        let err = parse_att("0 1 97 97\n1 2 300 300\n").unwrap_err();
        assert!(matches!(err, DfaError::InvalidAtt { line: 2, .. }));
    }

    #[test]
    fn reject_bad_state_label() {
        let err = parse_att("zero 1 97 97\n").unwrap_err();
        assert!(matches!(err, DfaError::InvalidAtt { line: 1, .. }));
    }

    #[test]
    fn reject_empty_input() {
        assert!(matches!(parse_att("").unwrap_err(), DfaError::InvalidSource(_)));
    }

    #[test]
    fn final_only_automaton_accepts_empty_string() {
        let list = parse_att("5\n").unwrap();
        assert_eq!(list.state_count(), 1);
        assert_eq!(list.start(), 0);
        assert!(list.is_accepting(0));
    }
}
