//! Trait boundaries for everything this crate deliberately doesn't own:
//! regex matching, terminal column widths, command evaluation, message
//! sinks, and terminal hand-off to child processes. The core only ever
//! consumes these as trait objects; it never implements them itself.
//!
//! A feature-gated default [`RegexMatcher`] adapter over `monster-regex`
//! is provided for tests and benches behind `monster_regex_adapter`;
//! production callers are expected to supply their own collaborators.

use crate::error::Result;

#[cfg(feature = "monster_regex_adapter")]
mod regex_adapter;
#[cfg(feature = "monster_regex_adapter")]
pub use regex_adapter::MonsterRegexMatcher;

/// Byte-offset span(s) of one match. Index 0 is always the whole match;
/// further indices are sub-capture groups when the underlying engine
/// supports them.
#[derive(Debug, Clone, Default)]
pub struct Captures {
    groups: Vec<Option<(usize, usize)>>,
}

impl Captures {
    pub fn whole_match(start: usize, end: usize) -> Self {
        Captures { groups: vec![Some((start, end))] }
    }

    pub fn get(&self, index: usize) -> Option<(usize, usize)> {
        self.groups.get(index).copied().flatten()
    }
}

/// Compiles and runs regular expressions over raw bytes. Used by search
/// (outside this crate's scope) and by the Pipeline's compiler-error
/// parsing (`ErrorFormat`, §4.7). This crate carries no regex engine of
/// its own — that is an explicit non-goal.
pub trait RegexMatcher {
    type Pattern;

    fn compile(&self, pattern: &str, icase: bool) -> Result<Self::Pattern>;

    fn find(&self, pattern: &Self::Pattern, haystack: &[u8]) -> Option<Captures>;
}

/// Column width of a single character, for terminal rendering. The core
/// never computes this itself (`View`'s motions are purely codepoint-
/// level); callers that need on-screen column math supply this.
pub trait WidthTable {
    fn width(&self, c: char) -> usize;

    fn str_width(&self, s: &str) -> usize {
        s.chars().map(|c| self.width(c)).sum()
    }
}

/// Default [`WidthTable`] backed by the Unicode East Asian Width tables.
pub struct UnicodeWidthTable;

impl WidthTable for UnicodeWidthTable {
    fn width(&self, c: char) -> usize {
        unicode_width::UnicodeWidthChar::width(c).unwrap_or(0)
    }
}

/// Runs a single editor command string, e.g. for `ExecRouter`'s `Eval`
/// action (output of a child process fed back in as commands).
pub trait CommandEvaluator {
    fn run(&mut self, command: &str) -> Result<()>;
}

/// One diagnostic or status line destined for the user, produced by the
/// `Msg`/`Tag`/`ErrMsg` ExecRouter actions or by compiler-error parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub file: Option<String>,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl Message {
    pub fn plain(text: impl Into<String>) -> Self {
        Message { text: text.into(), file: None, line: None, column: None }
    }
}

/// Sink for messages the core produces but has no UI to render. The
/// `dump`/`activate` pair backs the `exec` module's `Msg` action (§4.8):
/// `dump` serializes the store for a child's stdin, `activate` jumps to
/// the 0-based index the child's reply names, mirroring `dte`'s
/// `dump_messages`/`activate_message`. Both have no-op defaults so a
/// minimal sink (like [`VecMessageStore`] in tests that don't exercise
/// `Msg`) isn't forced to implement them.
pub trait MessageStore {
    fn push(&mut self, message: Message);

    fn dump(&self) -> Vec<u8> {
        Vec::new()
    }

    fn activate(&mut self, index: usize) {
        let _ = index;
    }
}

/// Hands the terminal to and from a spawned child (Pipeline's `Tty`
/// mode). The core never touches terminal modes directly; it only calls
/// these two hooks around a spawn that needs the real terminal.
pub trait TerminalController {
    fn yield_to_child(&mut self) -> Result<()>;
    fn resume(&mut self) -> Result<()>;
}

/// No-op controller for headless use and tests: there is no terminal to
/// hand off, so both hooks succeed trivially.
pub struct NoopTerminalController;

impl TerminalController for NoopTerminalController {
    fn yield_to_child(&mut self) -> Result<()> {
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory [`MessageStore`] for tests: just records everything pushed.
/// `dump` writes one line per message (`text`, tab-separated from
/// `file:line:col` when present); `activate` records the index in
/// `activated` rather than doing anything UI-visible.
#[derive(Debug, Default)]
pub struct VecMessageStore {
    pub messages: Vec<Message>,
    pub activated: Option<usize>,
}

impl MessageStore for VecMessageStore {
    fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    fn dump(&self) -> Vec<u8> {
        let mut out = String::new();
        for m in &self.messages {
            if let Some(file) = &m.file {
                out.push_str(file);
                out.push(':');
                out.push_str(&m.line.unwrap_or(0).to_string());
                out.push(':');
                out.push_str(&m.column.unwrap_or(0).to_string());
                out.push(':');
                out.push(' ');
            }
            out.push_str(&m.text);
            out.push('\n');
        }
        out.into_bytes()
    }

    fn activate(&mut self, index: usize) {
        self.activated = Some(index);
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
