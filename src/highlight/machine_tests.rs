use super::*;

/// A toy two-state "string" syntax: `default` recognizes a `"` and
/// switches into `string`, which eats everything up to the next `"`.
/// Mirrors SPEC_FULL.md §8 scenario S3.
fn quote_syntax() -> HLStateMachine {
    const DEFAULT_COLOR: ColorRef = 0;
    const QUOTE_COLOR: ColorRef = 1;
    const STRING_COLOR: ColorRef = 2;

    let mut quote_set = ByteSet::new();
    quote_set.set(b'"');

    let default_state = State::new("default", Action { color: DEFAULT_COLOR, dest: 0 })
        .with_condition(Condition::Char(quote_set.clone()), Action { color: QUOTE_COLOR, dest: 1 });
    let string_state = State::new("string", Action { color: STRING_COLOR, dest: 1 })
        .with_condition(Condition::Char(quote_set), Action { color: QUOTE_COLOR, dest: 0 });

    HLStateMachine::new(vec![default_state, string_state], 0)
}

#[test]
fn quote_syntax_colors_default_and_string_runs() {
    let hl = quote_syntax();
    let (colors, end_state) = hl.line_hl(hl.start_state(), b"x\"y\"z");
    assert_eq!(colors, vec![0, 1, 2, 1, 0]);
    assert_eq!(end_state, hl.start_state());
}

#[test]
fn empty_line_is_a_no_op() {
    let hl = quote_syntax();
    let (colors, end_state) = hl.line_hl(hl.start_state(), b"");
    assert!(colors.is_empty());
    assert_eq!(end_state, hl.start_state());
}

#[test]
fn unterminated_string_carries_state_to_next_line() {
    let hl = quote_syntax();
    let (_, end_state) = hl.line_hl(hl.start_state(), b"x\"y");
    assert_eq!(end_state, 1, "entering a string with no closing quote stays in the string state");
}

#[test]
fn char_class_starts_a_run_without_resetting_sidx() {
    // A CharClass condition that keeps matching the same class should
    // accumulate into one run instead of restarting sidx each byte.
    let mut digits = ByteSet::from_range(b'0', b'9');
    let word_end = digits.clone();
    digits.set(b'.');
    let number_state = State::new("number", Action { color: 9, dest: 0 });
    let default_state = State::new("default", Action { color: 0, dest: 0 })
        .with_condition(Condition::CharClass(digits), Action { color: 1, dest: 1 });
    let number_state = number_state
        .with_condition(Condition::BufferIs { s: b"007".to_vec(), icase: false }, Action { color: 7, dest: 0 })
        .with_condition(Condition::CharClass(word_end), Action { color: 1, dest: 1 });

    let hl = HLStateMachine::new(vec![default_state, number_state], 0);
    let (colors, _) = hl.line_hl(0, b"007x");
    // "007" recolors retroactively once BufferIs fires, "x" falls back to default.
    assert_eq!(colors, vec![7, 7, 7, 0]);
}

#[test]
fn recolor_back_repaints_trailing_bytes_without_changing_state() {
    let state = State::new("s", Action { color: 0, dest: 0 })
        .with_condition(Condition::RecolorBack(2), Action { color: 5, dest: 0 });
    let hl = HLStateMachine::new(vec![state], 0);
    let (colors, end_state) = hl.line_hl(0, b"ab");
    // RecolorBack fires at every byte position without consuming input or
    // switching states, so it recolors in place as i advances via the
    // default action.
    assert_eq!(end_state, 0);
    assert_eq!(colors.len(), 2);
}

#[test]
fn noeat_state_transitions_without_consuming_input() {
    // State 0 never matches anything and has noeat set, so it immediately
    // hands off to state 1 without painting; state 1 consumes normally.
    let passthrough = State::new("noeat", Action { color: 0, dest: 1 }).noeat();
    let consume = State::new("consume", Action { color: 3, dest: 1 });
    let hl = HLStateMachine::new(vec![passthrough, consume], 0);
    let (colors, end_state) = hl.line_hl(0, b"ab");
    assert_eq!(colors, vec![3, 3]);
    assert_eq!(end_state, 1);
}
