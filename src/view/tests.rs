use super::*;
use crate::buffer::Buffer;

#[test]
fn fresh_view_starts_at_zero_with_no_selection() {
    let buf = Buffer::from_bytes(b"hello");
    let view = View::new(&buf);
    assert_eq!(view.cursor_offset(), 0);
    assert!(!view.selection().is_active());
}

#[test]
fn move_right_and_left_walk_codepoints() {
    let buf = Buffer::from_bytes("ab\u{00e9}c".as_bytes());
    let mut view = View::new(&buf);
    view.move_right(false);
    assert_eq!(view.cursor_offset(), 1);
    view.move_right(false);
    assert_eq!(view.cursor_offset(), 2);
    // é is 2 bytes in UTF-8.
    view.move_right(false);
    assert_eq!(view.cursor_offset(), 4);
    view.move_left(false);
    assert_eq!(view.cursor_offset(), 2);
}

#[test]
fn move_right_at_end_of_buffer_is_a_no_op() {
    let buf = Buffer::from_bytes(b"ab");
    let mut view = View::new(&buf);
    view.move_eof(false);
    let at_end = view.cursor_offset();
    view.move_right(false);
    assert_eq!(view.cursor_offset(), at_end);
}

#[test]
fn move_bol_and_eol_clamp_to_line_boundaries() {
    let buf = Buffer::from_bytes(b"first\nsecond\nthird");
    let mut view = View::new(&buf);
    view.move_right(false);
    view.move_right(false);
    view.move_right(false); // offset 3, mid "first"
    view.move_bol(false);
    assert_eq!(view.cursor_offset(), 0);
    view.move_eol(false);
    assert_eq!(view.cursor_offset(), 5);
}

#[test]
fn move_bof_and_eof_jump_to_extremes() {
    let buf = Buffer::from_bytes(b"abc\ndef");
    let mut view = View::new(&buf);
    view.move_eof(false);
    assert_eq!(view.cursor_offset(), 7);
    view.move_bof(false);
    assert_eq!(view.cursor_offset(), 0);
}

#[test]
fn move_word_forward_skips_word_then_trailing_whitespace() {
    let buf = Buffer::from_bytes(b"foo   bar");
    let mut view = View::new(&buf);
    view.move_word_forward(false);
    assert_eq!(view.cursor_offset(), 6, "lands on the start of the next word");
}

#[test]
fn move_word_backward_from_mid_word_goes_to_its_start() {
    let buf = Buffer::from_bytes(b"foo bar");
    let mut view = View::new(&buf);
    view.move_eof(false);
    view.move_word_backward(false);
    assert_eq!(view.cursor_offset(), 4);
    view.move_word_backward(false);
    assert_eq!(view.cursor_offset(), 0);
}

#[test]
fn extending_a_movement_grows_a_char_selection() {
    let buf = Buffer::from_bytes(b"hello");
    let mut view = View::new(&buf);
    view.move_right(true);
    view.move_right(true);
    let sel = view.selection();
    assert!(sel.is_active());
    assert_eq!(sel.range(), (0, 2));
}

#[test]
fn non_extending_movement_after_selection_clears_it() {
    let buf = Buffer::from_bytes(b"hello world");
    let mut view = View::new(&buf);
    view.move_right(true);
    view.move_right(true);
    assert!(view.selection().is_active());
    view.move_right(false);
    assert!(!view.selection().is_active(), "plain movement cancels a pending selection");
}

#[test]
fn select_lines_snaps_to_line_boundaries() {
    let buf = Buffer::from_bytes(b"one\ntwo\nthree");
    let mut view = View::new(&buf);
    view.move_right(false);
    view.move_right(false);
    view.move_right(false);
    view.move_right(false);
    view.move_right(false); // land inside "two"
    view.select(SelectionKind::Lines, false);
    let sel = view.selection();
    assert_eq!(sel.kind, SelectionKind::Lines);
    assert_eq!(sel.range(), (4, 8));
}

#[test]
fn select_lines_on_last_line_without_trailing_newline_ends_at_buffer_len() {
    let buf = Buffer::from_bytes(b"only");
    let mut view = View::new(&buf);
    view.select(SelectionKind::Lines, false);
    assert_eq!(view.selection().range(), (0, 4));
}
