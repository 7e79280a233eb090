//! The loaded syntax definition and the per-line highlighting pass.
//!
//! This is a direct port of `dte`'s `hl.c` state machine: a small set of
//! named [`State`]s, each with an ordered list of [`Condition`]s tested
//! against the byte at the cursor (plus, for the buffer-matching
//! conditions, the run of bytes since the last reset). The first
//! condition to match fires its [`Action`]; if none match, the state's
//! default action fires. [`HLStateMachine::line_hl`] is a total function:
//! every byte of every line gets painted exactly once, regardless of
//! content.

use super::ColorRef;

pub type StateId = usize;

/// A 256-bit membership set over raw bytes, used for `CharClass`/`Char`
/// conditions. Plain array instead of a bitset crate — 256 bits is cheap
/// enough as `[u8; 32]` and the hot loop only needs one shift-and-mask.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteSet {
    bitmap: [u8; 32],
}

impl ByteSet {
    pub fn new() -> Self {
        ByteSet::default()
    }

    pub fn set(&mut self, b: u8) {
        self.bitmap[(b / 8) as usize] |= 1 << (b % 8);
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut s = ByteSet::new();
        for &b in bytes {
            s.set(b);
        }
        s
    }

    pub fn from_range(lo: u8, hi: u8) -> Self {
        let mut s = ByteSet::new();
        for b in lo..=hi {
            s.set(b);
        }
        s
    }

    pub fn contains(&self, b: u8) -> bool {
        self.bitmap[(b / 8) as usize] & (1 << (b % 8)) != 0
    }
}

fn bytes_match(haystack: &[u8], needle: &[u8], icase: bool) -> bool {
    if haystack.len() != needle.len() {
        return false;
    }
    if icase {
        haystack.eq_ignore_ascii_case(needle)
    } else {
        haystack == needle
    }
}

fn list_contains(list: &[Vec<u8>], needle: &[u8], icase: bool) -> bool {
    list.iter().any(|s| bytes_match(s, needle, icase))
}

/// One rule inside a [`State`]'s condition list, evaluated in declaration
/// order. See the module doc and SPEC_FULL.md §4.5 for the exact
/// match/side-effect semantics of each variant.
#[derive(Debug, Clone)]
pub enum Condition {
    /// Matches `bitmap[line[i]]`; starts (but never ends) a buffered run.
    CharClass(ByteSet),
    /// Matches `bitmap[line[i]]`; always ends any buffered run.
    Char(ByteSet),
    /// Matches when a buffered run equals `s` exactly.
    BufferIs { s: Vec<u8>, icase: bool },
    /// Matches when a buffered run equals one of `list`.
    InList { list: Vec<Vec<u8>>, icase: bool },
    /// Same semantics as `InList`; intended for large keyword sets. This
    /// crate has no need for `hl.c`'s open-chained hash table (a `Vec`
    /// linear scan is fine at in-memory syntax-table sizes) but keeps the
    /// variant distinct since it is a documented condition kind in its
    /// own right, not just an alias for `InList`.
    InHash { list: Vec<Vec<u8>>, icase: bool },
    /// Matches a fixed literal starting at `i`.
    Str(Vec<u8>),
    /// Case-insensitive variant of `Str`.
    StrICase(Vec<u8>),
    /// Unconditional: recolors the last `n` bytes already emitted.
    RecolorBack(usize),
    /// Unconditional if a buffered run is active: recolors it.
    RecolorBuffer,
}

/// What happens when a [`Condition`] fires, or when a [`State`]'s default
/// action fires.
#[derive(Debug, Clone, Copy)]
pub struct Action {
    pub color: ColorRef,
    pub dest: StateId,
}

/// One node of the loaded state machine.
#[derive(Debug, Clone)]
pub struct State {
    pub name: String,
    pub conditions: Vec<(Condition, Action)>,
    pub default_action: Action,
    /// When no condition matches, transition to `default_action.dest`
    /// without consuming the current byte (no paint happens either).
    pub noeat: bool,
}

impl State {
    pub fn new(name: impl Into<String>, default_action: Action) -> Self {
        State { name: name.into(), conditions: Vec::new(), default_action, noeat: false }
    }

    pub fn with_condition(mut self, cond: Condition, action: Action) -> Self {
        self.conditions.push((cond, action));
        self
    }

    pub fn noeat(mut self) -> Self {
        self.noeat = true;
        self
    }
}

/// Immutable once loaded: the set of [`State`]s making up one syntax.
#[derive(Debug, Clone)]
pub struct HLStateMachine {
    states: Vec<State>,
    start: StateId,
}

impl HLStateMachine {
    pub fn new(states: Vec<State>, start: StateId) -> Self {
        assert!(start < states.len(), "start state must be a valid index");
        HLStateMachine { states, start }
    }

    pub fn start_state(&self) -> StateId {
        self.start
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id]
    }

    /// Run the state machine over one line of bytes, starting from
    /// `state_in`. Returns the per-byte colors and the state to carry
    /// into the next line. `line` should include its trailing `\n` when
    /// one exists, so end-of-line conditions can see it; this function
    /// places no requirement on that and is total regardless.
    pub fn line_hl(&self, state_in: StateId, line: &[u8]) -> (Vec<ColorRef>, StateId) {
        let len = line.len();
        let mut colors = vec![0 as ColorRef; len];
        let mut state = state_in;
        let mut i = 0usize;
        let mut sidx: Option<usize> = None;

        'outer: loop {
            if i == len {
                break;
            }
            let ch = line[i];
            let conditions = &self.state(state).conditions;
            let mut ci = 0usize;
            while ci < conditions.len() {
                let (cond, action) = &conditions[ci];
                match cond {
                    Condition::CharClass(set) => {
                        if set.contains(ch) {
                            if sidx.is_none() {
                                sidx = Some(i);
                            }
                            colors[i] = action.color;
                            i += 1;
                            state = action.dest;
                            continue 'outer;
                        }
                    }
                    Condition::Char(set) => {
                        if set.contains(ch) {
                            colors[i] = action.color;
                            i += 1;
                            sidx = None;
                            state = action.dest;
                            continue 'outer;
                        }
                    }
                    Condition::BufferIs { s, icase } => {
                        if let Some(s0) = sidx {
                            if bytes_match(&line[s0..i], s, *icase) {
                                for c in colors.iter_mut().take(i).skip(s0) {
                                    *c = action.color;
                                }
                                sidx = None;
                                state = action.dest;
                                continue 'outer;
                            }
                        }
                    }
                    Condition::InList { list, icase } | Condition::InHash { list, icase } => {
                        if let Some(s0) = sidx {
                            if list_contains(list, &line[s0..i], *icase) {
                                for c in colors.iter_mut().take(i).skip(s0) {
                                    *c = action.color;
                                }
                                sidx = None;
                                state = action.dest;
                                continue 'outer;
                            }
                        }
                    }
                    Condition::Str(s) => {
                        let end = i + s.len();
                        if end <= len && &line[i..end] == s.as_slice() {
                            for c in colors.iter_mut().take(end).skip(i) {
                                *c = action.color;
                            }
                            i = end;
                            sidx = None;
                            state = action.dest;
                            continue 'outer;
                        }
                    }
                    Condition::StrICase(s) => {
                        let end = i + s.len();
                        if end <= len && line[i..end].eq_ignore_ascii_case(s) {
                            for c in colors.iter_mut().take(end).skip(i) {
                                *c = action.color;
                            }
                            i = end;
                            sidx = None;
                            state = action.dest;
                            continue 'outer;
                        }
                    }
                    Condition::RecolorBack(n) => {
                        // Unconditional; doesn't restart the condition
                        // scan (no state/i change) — matches hl.c's
                        // COND_RECOLOR, which falls through to the next
                        // condition in the same state instead of
                        // `goto top`.
                        let start = i.saturating_sub(*n);
                        for c in colors.iter_mut().take(i).skip(start) {
                            *c = action.color;
                        }
                    }
                    Condition::RecolorBuffer => {
                        if let Some(s0) = sidx {
                            for c in colors.iter_mut().take(i).skip(s0) {
                                *c = action.color;
                            }
                            sidx = None;
                        }
                    }
                }
                ci += 1;
            }

            let st = self.state(state);
            if !st.noeat {
                colors[i] = st.default_action.color;
                i += 1;
            }
            sidx = None;
            state = st.default_action.dest;
        }

        (colors, state)
    }
}

#[cfg(test)]
#[path = "machine_tests.rs"]
mod tests;
