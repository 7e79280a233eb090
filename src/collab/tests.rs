use super::*;

#[test]
fn captures_whole_match_reports_span_at_index_zero() {
    let caps = Captures::whole_match(3, 7);
    assert_eq!(caps.get(0), Some((3, 7)));
    assert_eq!(caps.get(1), None);
}

#[test]
fn unicode_width_table_handles_wide_and_zero_width_chars() {
    let table = UnicodeWidthTable;
    assert_eq!(table.width('a'), 1);
    assert_eq!(table.str_width("ab"), 2);
}

#[test]
fn noop_terminal_controller_always_succeeds() {
    let mut ctl = NoopTerminalController;
    assert!(ctl.yield_to_child().is_ok());
    assert!(ctl.resume().is_ok());
}

#[test]
fn vec_message_store_records_pushed_messages() {
    let mut store = VecMessageStore::default();
    store.push(Message::plain("hello"));
    store.push(Message { text: "boom".into(), file: Some("a.rs".into()), line: Some(3), column: Some(1) });
    assert_eq!(store.messages.len(), 2);
    assert_eq!(store.messages[0].text, "hello");
    assert_eq!(store.messages[1].line, Some(3));
}
