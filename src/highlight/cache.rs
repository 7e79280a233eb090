//! Per-line start-state memoization with hole repair.
//!
//! A [`LineColorCache`] remembers, for each line, the state the highlight
//! state machine was in just before rendering that line. Re-highlighting
//! after an edit only needs to touch the lines actually affected; the
//! rest is repaired lazily, one hole at a time, the next time a line past
//! the hole is actually queried (`hl_fill_start_states` in `hl.c`).

use super::machine::{HLStateMachine, StateId};
use super::ColorRef;

/// Supplies the raw bytes of an arbitrary line so [`Highlighter`] can walk
/// forward through lines it hasn't cached yet while repairing a hole.
/// Implemented by whatever owns the buffer's bytes (`Buffer` via a small
/// adapter); the highlighter itself never inspects storage directly.
pub trait LineSource {
    fn line_count(&self) -> usize;
    /// Bytes of `line_nr`, including the trailing `\n` unless it's the
    /// last line and the buffer doesn't end in one.
    fn line_bytes(&self, line_nr: usize) -> Vec<u8>;
}

/// Resizable per-line start-state array plus the `first_hole` pointer.
///
/// `first_hole` is a monotonic *hint*, not a tight bound (SPEC_FULL.md §9
/// open question): every caller re-checks `slots[i]` rather than assuming
/// the slot at `first_hole` itself is a hole. Invariants I1-I4 (module
/// doc of `highlight`) are upheld by `on_insert`/`on_delete` below and by
/// [`Highlighter::fill_holes`].
#[derive(Debug, Clone)]
pub struct LineColorCache {
    slots: Vec<Option<StateId>>,
    first_hole: usize,
}

impl LineColorCache {
    pub fn new(start_state: StateId) -> Self {
        LineColorCache { slots: vec![Some(start_state)], first_hole: 1 }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn first_hole(&self) -> usize {
        self.first_hole
    }

    pub fn slot(&self, line_nr: usize) -> Option<StateId> {
        self.slots.get(line_nr).copied().flatten()
    }

    /// Called after `inserted_newlines` newlines were inserted starting
    /// at `first_line`. Mirrors `hl_insert()`.
    pub fn on_insert(&mut self, first_line: usize, inserted_newlines: usize) {
        let len = self.slots.len();
        if first_line >= len {
            return;
        }
        if first_line + inserted_newlines + 1 >= len {
            self.slots.truncate(first_line + 1);
            self.first_hole = self.first_hole.min(self.slots.len());
            return;
        }
        if inserted_newlines > 0 {
            let at = first_line + 1;
            self.slots.splice(at..at, std::iter::repeat(None).take(inserted_newlines));
        }
        self.first_hole = self.first_hole.min(first_line + 1);
    }

    /// Called after `deleted_newlines` newlines were removed starting at
    /// `first_line`. Mirrors `hl_delete()`.
    pub fn on_delete(&mut self, first_line: usize, deleted_newlines: usize) {
        let len = self.slots.len();
        if len == 1 {
            return;
        }
        if first_line >= len {
            return;
        }
        if first_line + deleted_newlines + 1 >= len {
            self.slots.truncate(len.saturating_sub(deleted_newlines));
            self.first_hole = self.first_hole.min(self.slots.len());
            return;
        }
        if deleted_newlines > 0 {
            let from = first_line + 1;
            let to = (first_line + 1 + deleted_newlines).min(self.slots.len());
            self.slots.drain(from..to);
        }
        self.first_hole = self.first_hole.min(first_line + 1);
    }
}

/// Runs [`HLStateMachine::line_hl`] over individual lines and drives
/// [`LineColorCache`]'s hole repair when a query needs start states the
/// cache doesn't have yet.
pub struct Highlighter {
    machine: std::sync::Arc<HLStateMachine>,
}

impl Highlighter {
    pub fn new(machine: std::sync::Arc<HLStateMachine>) -> Self {
        Highlighter { machine }
    }

    pub fn machine(&self) -> &HLStateMachine {
        &self.machine
    }

    /// Colors for `line_nr`, filling any cache holes up to and including
    /// it first. Idempotent.
    pub fn colors_for_line(
        &self,
        cache: &mut LineColorCache,
        source: &dyn LineSource,
        line_nr: usize,
    ) -> Vec<ColorRef> {
        self.fill_holes(cache, source, line_nr);
        let state_in = cache
            .slot(line_nr)
            .expect("fill_holes guarantees slots[line_nr] is populated for line_nr < line_count");
        let line = source.line_bytes(line_nr);
        self.machine.line_hl(state_in, &line).0
    }

    /// Fills `cache.slots[first_hole..=target]`, following `hl.c`'s
    /// `hl_fill_start_states` exactly: walk forward from the line before
    /// the first hole, recomputing each hole's successor state. When a
    /// recomputed state matches what was already cached there, that hole
    /// is closed and `first_hole` re-seats at the next one — but the loop
    /// keeps going rather than returning, since an earlier edit can have
    /// left more than one hole before `target`.
    fn fill_holes(&self, cache: &mut LineColorCache, source: &dyn LineSource, target: usize) {
        while cache.first_hole <= target {
            let i = cache.first_hole - 1;
            if i >= source.line_count() {
                break;
            }
            let state_in = cache.slots[i].expect("invariant I3: slot before first_hole is Some");
            let line = source.line_bytes(i);
            let (_, s_next) = self.machine.line_hl(state_in, &line);

            if i + 1 == cache.slots.len() {
                cache.slots.push(Some(s_next));
                cache.first_hole = cache.slots.len();
            } else if cache.slots[i + 1].is_none() {
                cache.slots[i + 1] = Some(s_next);
                cache.first_hole = i + 2;
            } else if cache.slots[i + 1] == Some(s_next) {
                let mut pos = i + 2;
                while pos < cache.slots.len() && cache.slots[pos].is_some() {
                    pos += 1;
                }
                cache.first_hole = pos;
                // This hole is closed, but other holes further out may
                // still sit at or before `target` (`hl_fill_start_states`
                // only stops once `first_hole > line_nr`) — keep going
                // rather than returning early.
            } else {
                cache.slots[i + 1] = Some(s_next);
                cache.first_hole = i + 2;
            }
        }
    }

    pub fn on_insert(&self, cache: &mut LineColorCache, first_line: usize, inserted_newlines: usize) {
        cache.on_insert(first_line, inserted_newlines);
    }

    pub fn on_delete(&self, cache: &mut LineColorCache, first_line: usize, deleted_newlines: usize) {
        cache.on_delete(first_line, deleted_newlines);
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
