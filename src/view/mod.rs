//! Cursor and selection state pointing into a [`Buffer`](crate::buffer::Buffer).
//!
//! `View` owns nothing but a cursor position and a selection descriptor; all
//! of the actual text lives in the buffer it borrows. Motions are purely
//! codepoint-level (grounded in the teacher's buffer movement suite and
//! `dte`'s `move.c`): there is deliberately no `move_up`/`move_down` here,
//! since those require column-width accounting that belongs to the external
//! terminal/width collaborator, not the core.

use crate::block::BlockIter;
use crate::buffer::Buffer;

#[cfg(test)]
#[path = "tests.rs"]
mod tests;

/// What a selection spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    None,
    Chars,
    Lines,
}

/// A selection over `[so, eo)` byte offsets. For `kind == Lines`, `so`/`eo`
/// are snapped to line boundaries: `so` to the start of its line, `eo` to
/// the start of the line after the selection's last line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub kind: SelectionKind,
    pub so: usize,
    pub eo: usize,
}

impl Selection {
    fn none() -> Self {
        Selection { kind: SelectionKind::None, so: 0, eo: 0 }
    }

    pub fn is_active(&self) -> bool {
        self.kind != SelectionKind::None
    }

    /// Half-open byte range, `so <= eo` regardless of which end the cursor
    /// was anchored to.
    pub fn range(&self) -> (usize, usize) {
        if self.so <= self.eo { (self.so, self.eo) } else { (self.eo, self.so) }
    }
}

fn classify(c: char) -> u8 {
    if c.is_whitespace() {
        0
    } else if c.is_alphanumeric() || c == '_' {
        1
    } else {
        2
    }
}

/// Cursor + selection into one buffer. `View`s outlive no `Buffer`.
pub struct View<'a> {
    buffer: &'a Buffer,
    cursor: BlockIter,
    selection: Selection,
    preferred_col: usize,
    vx: usize,
    vy: usize,
    next_movement_cancels_selection: bool,
    force_center: bool,
}

impl<'a> View<'a> {
    pub fn new(buffer: &'a Buffer) -> Self {
        View {
            buffer,
            cursor: buffer.store().iter_at(0),
            selection: Selection::none(),
            preferred_col: 0,
            vx: 0,
            vy: 0,
            next_movement_cancels_selection: false,
            force_center: false,
        }
    }

    pub fn cursor_offset(&self) -> usize {
        self.cursor.byte_offset(self.buffer.store())
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Directly installs a selection, bypassing the anchor/extend rules
    /// `select`/movement apply. Used to restore a selection a caller
    /// computed itself (e.g. re-applying one saved before an `exec` call).
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
        self.next_movement_cancels_selection = selection.is_active();
    }

    pub fn set_preferred_col(&mut self, col: usize) {
        self.preferred_col = col;
    }

    pub fn preferred_col(&self) -> usize {
        self.preferred_col
    }

    pub fn viewport_origin(&self) -> (usize, usize) {
        (self.vx, self.vy)
    }

    pub fn set_viewport_origin(&mut self, vx: usize, vy: usize) {
        self.vx = vx;
        self.vy = vy;
    }

    pub fn force_center(&self) -> bool {
        self.force_center
    }

    pub fn set_force_center(&mut self, force: bool) {
        self.force_center = force;
    }

    /// Places the cursor directly at `offset`, bypassing the incremental
    /// `next_codepoint`/`prev_codepoint` motions. Used to re-seat the
    /// cursor after an out-of-band buffer mutation the view didn't drive
    /// itself (e.g. `exec`'s `Buffer` output action, §4.8).
    pub fn goto_offset(&mut self, offset: usize, extend: bool) {
        let dest = self.buffer.iter_at(offset);
        self.move_to(dest, extend);
    }

    fn move_to(&mut self, dest: BlockIter, extend: bool) {
        let before = self.cursor_offset();
        self.cursor = dest;
        let after = dest.byte_offset(self.buffer.store());
        if extend {
            if !self.selection.is_active() {
                self.selection = Selection { kind: SelectionKind::Chars, so: before, eo: before };
            }
            self.selection.eo = after;
        } else {
            if self.next_movement_cancels_selection {
                self.selection = Selection::none();
            }
            self.next_movement_cancels_selection = false;
            return;
        }
        self.next_movement_cancels_selection = true;
    }

    pub fn move_left(&mut self, extend: bool) {
        if let Some((_, prev)) = self.cursor.prev_codepoint(self.buffer.store()) {
            self.move_to(prev, extend);
        }
    }

    pub fn move_right(&mut self, extend: bool) {
        if let Some((_, next)) = self.cursor.next_codepoint(self.buffer.store()) {
            self.move_to(next, extend);
        }
    }

    pub fn move_bol(&mut self, extend: bool) {
        let dest = self.cursor.bol(self.buffer.store());
        self.move_to(dest, extend);
    }

    pub fn move_eol(&mut self, extend: bool) {
        let dest = self.cursor.eol(self.buffer.store());
        self.move_to(dest, extend);
    }

    pub fn move_bof(&mut self, extend: bool) {
        let dest = self.buffer.store().iter_at(0);
        self.move_to(dest, extend);
    }

    pub fn move_eof(&mut self, extend: bool) {
        let dest = self.buffer.store().iter_at(self.buffer.store().len());
        self.move_to(dest, extend);
    }

    /// Advance to the start of the next word, skipping any run of the
    /// current class followed by any run of whitespace (`dte`'s
    /// `word_fwd`).
    pub fn move_word_forward(&mut self, extend: bool) {
        let store = self.buffer.store();
        let mut cur = self.cursor;
        let start_class = match cur.next_codepoint(store) {
            Some((c, _)) => classify(c),
            None => {
                self.move_to(cur, extend);
                return;
            }
        };
        if start_class != 0 {
            while let Some((c, next)) = cur.next_codepoint(store) {
                if classify(c) != start_class {
                    break;
                }
                cur = next;
            }
        }
        while let Some((c, next)) = cur.next_codepoint(store) {
            if classify(c) != 0 {
                break;
            }
            cur = next;
        }
        self.move_to(cur, extend);
    }

    /// Retreat to the start of the previous word (`dte`'s `word_bwd`).
    pub fn move_word_backward(&mut self, extend: bool) {
        let store = self.buffer.store();
        let mut cur = self.cursor;
        while let Some((c, prev)) = cur.prev_codepoint(store) {
            if classify(c) != 0 {
                break;
            }
            cur = prev;
        }
        if let Some((c, _)) = cur.prev_codepoint(store) {
            let class = classify(c);
            while let Some((c, prev)) = cur.prev_codepoint(store) {
                if classify(c) != class {
                    break;
                }
                cur = prev;
            }
        }
        self.move_to(cur, extend);
    }

    /// Selects the current line (`kind = Lines`) or, for `Chars`, just
    /// anchors a zero-width selection at the cursor. `extend` keeps an
    /// already-active selection's anchor.
    pub fn select(&mut self, kind: SelectionKind, extend: bool) {
        let store = self.buffer.store();
        match kind {
            SelectionKind::None => self.selection = Selection::none(),
            SelectionKind::Chars => {
                let at = self.cursor_offset();
                if !extend || !self.selection.is_active() {
                    self.selection = Selection { kind, so: at, eo: at };
                } else {
                    self.selection.kind = kind;
                }
            }
            SelectionKind::Lines => {
                let so = self.cursor.bol(store).byte_offset(store);
                let eo = match self.cursor.next_line(store) {
                    Some(next) => next.byte_offset(store),
                    None => store.len(),
                };
                self.selection = Selection { kind, so, eo };
            }
        }
        self.next_movement_cancels_selection = self.selection.is_active();
    }

    /// Byte range of the cursor's line, including its trailing `\n` when
    /// present — the same span `Buffer`'s highlighter line source feeds to
    /// the state machine. Used by `exec`'s `Line` input action.
    pub fn current_line_range(&self) -> (usize, usize) {
        let store = self.buffer.store();
        let bol = self.cursor.bol(store);
        let eol = bol.eol(store);
        let end = match eol.next_byte(store) {
            Some((b'\n', after)) => after,
            _ => eol,
        };
        (bol.byte_offset(store), end.byte_offset(store))
    }

    /// Byte range of the whole buffer. Used by `exec`'s `Buffer` input
    /// action when there is no active selection.
    pub fn buffer_range(&self) -> (usize, usize) {
        (0, self.buffer.store().len())
    }

    /// Byte range of the word touching the cursor, or `None` if the
    /// cursor sits on whitespace/punctuation with nothing to select
    /// (`dte`'s `view_do_get_word_under_cursor`). Prefers the word the
    /// cursor is inside; falls back to the word immediately after it.
    pub fn word_under_cursor(&self) -> Option<(usize, usize)> {
        let store = self.buffer.store();
        let mut start = self.cursor;
        loop {
            match start.prev_codepoint(store) {
                Some((c, prev)) if classify(c) == 1 => start = prev,
                _ => break,
            }
        }
        let mut end = self.cursor;
        loop {
            match end.next_codepoint(store) {
                Some((c, next)) if classify(c) == 1 => end = next,
                _ => break,
            }
        }
        let so = start.byte_offset(store);
        let eo = end.byte_offset(store);
        if so == eo {
            None
        } else {
            Some((so, eo))
        }
    }
}
