//! Default [`RegexMatcher`] implementation over `monster-regex`, behind
//! the `monster_regex_adapter` feature. Grounded in the teacher's own
//! `search` module, which wraps the same crate's linear/backtracking
//! engine split behind one `RiftRegex`-style enum.

use super::{Captures, RegexMatcher};
use crate::error::{ErrorType, Result, RiftError};
use monster_regex::Flags;
use std::sync::Arc;

/// Thin wrapper so callers don't need to pick an engine themselves;
/// `monster-regex` exposes linear and backtracking engines as distinct
/// types, so this enum picks linear when possible and falls back to
/// backtracking for patterns the linear engine can't represent (the
/// same fallback the teacher's `compile_regex` performs).
enum CompiledPattern {
    Linear(Arc<monster_regex::Regex<monster_regex::engine::linear::LinearRegexEngine>>),
    Backtracking(Arc<monster_regex::Regex<monster_regex::engine::backtracking::BacktrackingRegexEngine>>),
}

pub struct MonsterRegexMatcher;

impl RegexMatcher for MonsterRegexMatcher {
    type Pattern = CompiledPattern;

    fn compile(&self, pattern: &str, _icase: bool) -> Result<Self::Pattern> {
        // `monster-regex`'s `Flags` fields aren't part of this crate's
        // grounding corpus beyond `Flags::default()`; case-folding is
        // left to the pattern itself (e.g. `(?i)`) until a caller needs
        // more than the default here.
        let flags = Flags::default();

        match monster_regex::Regex::new_linear(pattern, flags.clone()) {
            Ok(re) => Ok(CompiledPattern::Linear(Arc::new(re))),
            Err(_) => {
                let re = monster_regex::Regex::new(pattern, flags).map_err(|e| {
                    RiftError::new(ErrorType::Parse, "BAD_REGEX", e.to_string())
                })?;
                Ok(CompiledPattern::Backtracking(Arc::new(re)))
            }
        }
    }

    fn find(&self, pattern: &Self::Pattern, haystack: &[u8]) -> Option<Captures> {
        let text = std::str::from_utf8(haystack).ok()?;
        // `monster_regex::Regex<E>` itself only exposes `find(&str)`; the
        // teacher's own `RiftRegex::find_at` (search/mod.rs) is a thin
        // wrapper around exactly this call, so it's inlined here rather
        // than pulled in as a dependency on that editor-only type.
        let m = match pattern {
            CompiledPattern::Linear(re) => re.find(text),
            CompiledPattern::Backtracking(re) => re.find(text),
        }?;
        Some(Captures::whole_match(m.start, m.end))
    }
}
