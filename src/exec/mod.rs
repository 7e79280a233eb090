//! Maps a symbolic exec action table to concrete [`Pipeline`](crate::pipeline)
//! wiring, feeding a child's input from a [`Buffer`]/[`View`] region and
//! routing its output back as a buffer substitution, a message, a list of
//! filenames, a tag, or evaluated commands.
//!
//! Grounded in `dte`'s `exec.c` (`handle_exec`,
//! `spawn_action_from_exec_action`, `parse_and_activate_message`,
//! `parse_and_goto_tag`, `open_files_from_string`): this module keeps that
//! function's exact action table and ordering, split into a validation
//! step (§4.8's legal-combination table) and an execution step.
//!
//! One deliberate omission: `dte`'s `parse_and_goto_tag` also parses the
//! ctags line format and resolves it against the tags file. That belongs
//! to the tags-file-reader collaborator this crate treats as out of
//! scope (spec.md §1) — [`ExecOutput::Tag`] hands back the raw first
//! line for that collaborator to interpret.

use crate::buffer::Buffer;
use crate::collab::{CommandEvaluator, Message, MessageStore, TerminalController};
use crate::error::{ErrorType, Result, RiftError};
use crate::pipeline::{self, SpawnAction, SpawnContext, SpawnFlags};
use crate::view::View;


/// One entry of the three-fd action table (§4.8). The same enum is used
/// for all three positions; [`validate`] rejects combinations a given
/// position doesn't support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecAction {
    Buffer,
    Line,
    Word,
    Msg,
    Open,
    Tag,
    Eval,
    ErrMsg,
    Null,
    Tty,
}

impl ExecAction {
    fn to_spawn_action(self) -> SpawnAction {
        match self {
            ExecAction::Null => SpawnAction::Null,
            ExecAction::Tty => SpawnAction::Tty,
            _ => SpawnAction::Pipe,
        }
    }

    fn valid_as_input(self) -> bool {
        matches!(
            self,
            ExecAction::Buffer
                | ExecAction::Line
                | ExecAction::Word
                | ExecAction::Msg
                | ExecAction::Null
                | ExecAction::Tty
        )
    }

    fn valid_as_output(self) -> bool {
        matches!(
            self,
            ExecAction::Buffer
                | ExecAction::Msg
                | ExecAction::Open
                | ExecAction::Tag
                | ExecAction::Eval
                | ExecAction::Null
                | ExecAction::Tty
        )
    }

    fn valid_as_err(self) -> bool {
        matches!(self, ExecAction::ErrMsg | ExecAction::Null | ExecAction::Tty)
    }
}

/// Rejects action combinations §4.8's table doesn't define a role for,
/// matching the `BUG("unhandled action")` guards in `handle_exec`'s two
/// switch statements (promoted here to a regular, user-visible error).
pub fn validate(actions: [ExecAction; 3]) -> Result<()> {
    if !actions[0].valid_as_input() {
        return Err(RiftError::new(
            ErrorType::Validation,
            "BAD_EXEC_INPUT",
            format!("{:?} cannot be used as an exec input action", actions[0]),
        ));
    }
    if !actions[1].valid_as_output() {
        return Err(RiftError::new(
            ErrorType::Validation,
            "BAD_EXEC_OUTPUT",
            format!("{:?} cannot be used as an exec output action", actions[1]),
        ));
    }
    if !actions[2].valid_as_err() {
        return Err(RiftError::new(
            ErrorType::Validation,
            "BAD_EXEC_ERR",
            format!("{:?} cannot be used as an exec stderr action", actions[2]),
        ));
    }
    Ok(())
}

/// What the output action produced, for the caller to apply. `Buffer`
/// substitution and selection-clearing already happened by the time this
/// is returned; the rest name data the core has no UI/collaborator to
/// act on itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutput {
    /// Output action was `Null`/`Tty`, or input-only (`Line`/`Word`).
    None,
    /// `Buffer` output: the cursor offset after the substitution.
    BufferReplaced { cursor: usize },
    /// `Msg` output: the 1-based message index parsed from the first
    /// line, already applied via [`MessageStore::activate`] if valid.
    MessageIndex(Option<usize>),
    /// `Open` output: non-empty lines of the child's stdout, in order.
    Filenames(Vec<String>),
    /// `Tag` output: the raw first line (ctags-line-or-tag-name parsing
    /// is left to the tags-file collaborator).
    Tag(String),
    /// `Eval` output: commands were handed to the [`CommandEvaluator`].
    Evaluated,
}

/// One call to [`run`]'s worth of wiring, grouped the way `handle_exec`
/// groups its `SpawnContext`.
pub struct ExecRequest<'a> {
    pub argv: Vec<String>,
    pub env: Option<Vec<(String, String)>>,
    pub actions: [ExecAction; 3],
    pub flags: SpawnFlags,
    /// Strip a single trailing `\n` (and a preceding `\r`) from the
    /// child's stdout before it is used, but only when the output action
    /// is `Buffer` — matches `handle_exec`'s `strip_trailing_newline` gate.
    pub strip_trailing_newline: bool,
    pub messages: &'a mut dyn MessageStore,
    pub evaluator: &'a mut dyn CommandEvaluator,
}

fn gather_input(view: &View, action: ExecAction) -> (usize, usize) {
    let selection = view.selection();
    if selection.is_active() {
        return selection.range();
    }
    match action {
        ExecAction::Line => view.current_line_range(),
        ExecAction::Buffer => view.buffer_range(),
        ExecAction::Word => view.word_under_cursor().unwrap_or((view.cursor_offset(), view.cursor_offset())),
        _ => (view.cursor_offset(), view.cursor_offset()),
    }
}

fn dump_messages(store: &dyn MessageStore) -> Vec<u8> {
    store.dump()
}

fn strip_newline(mut bytes: Vec<u8>) -> Vec<u8> {
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
    }
    bytes
}

fn first_line(bytes: &[u8]) -> Option<&[u8]> {
    let end = bytes.iter().position(|&b| b == b'\n').unwrap_or(bytes.len());
    if end == 0 {
        None
    } else {
        Some(&bytes[..end])
    }
}

fn non_empty_lines(bytes: &[u8]) -> Vec<String> {
    bytes
        .split(|&b| b == b'\n')
        .filter(|line| !line.is_empty())
        .map(|line| String::from_utf8_lossy(line).into_owned())
        .collect()
}

/// Runs one `exec` invocation: reads input out of `buffer` at `cursor`/
/// `selection` per `req.actions[0]`, spawns `req.argv` through
/// [`pipeline::spawn`] wired per §4.8, then routes the captured stdout
/// per `req.actions[1]` and any captured stderr per `req.actions[2]`.
///
/// `cursor`/`selection` are passed as plain values, not a live `&View`:
/// `View` holds a `&Buffer` internally, so a caller couldn't pass both
/// `&mut Buffer` and `&View` into one call without the borrow checker
/// rejecting the aliasing. A short-lived `View` is built internally,
/// purely to reuse its motion helpers, and dropped before `buffer` is
/// mutated. Any `Buffer` mutation happens directly on `buffer` and is
/// reported back as
/// [`ExecOutput::BufferReplaced { cursor }`](ExecOutput::BufferReplaced)
/// rather than applied to a view in place. On success with a `Buffer`
/// output action, the caller is expected to call
/// `view.goto_offset(cursor, false)` and
/// `view.select(SelectionKind::None, false)` on its own long-lived view
/// afterward, matching `handle_exec`'s `unselect(view)` on that path. On
/// error, the caller's view is untouched, matching `handle_exec`'s
/// `view->cursor = saved_cursor` restoration (nothing here ever moved it).
pub fn run(
    buffer: &mut Buffer,
    cursor: usize,
    selection: crate::view::Selection,
    req: ExecRequest<'_>,
    term: &mut impl TerminalController,
) -> Result<(pipeline::ExitOutcome, ExecOutput)> {
    validate(req.actions)?;

    let (input_start, input_end) = {
        let mut view = View::new(&*buffer);
        view.goto_offset(cursor, false);
        view.set_selection(selection);
        match req.actions[0] {
            ExecAction::Msg | ExecAction::Null | ExecAction::Tty => (cursor, cursor),
            other => gather_input(&view, other),
        }
    };

    let mut ctx = SpawnContext::new(req.argv);
    ctx.env = req.env;
    ctx.flags = req.flags;
    ctx.input = match req.actions[0] {
        ExecAction::Msg => dump_messages(req.messages),
        ExecAction::Null | ExecAction::Tty => Vec::new(),
        _ => buffer.store().bytes_in(input_start..input_end),
    };

    let spawn_actions =
        [req.actions[0].to_spawn_action(), req.actions[1].to_spawn_action(), req.actions[2].to_spawn_action()];

    // Captured as a `Result` rather than `?`-propagated immediately: a
    // nonzero exit still needs its stderr routed to `ErrMsg` before the
    // error reaches the caller (S6), the same way `handle_exec` calls
    // `show_spawn_error_msg(&ctx.outputs[1], err)` on the failure path.
    let spawn_result = pipeline::spawn(&mut ctx, spawn_actions, term);

    if req.actions[2] == ExecAction::ErrMsg && !ctx.stderr_output.is_empty() {
        let text = String::from_utf8_lossy(&ctx.stderr_output).into_owned();
        req.messages.push(Message::plain(text));
    }

    let outcome = spawn_result?;

    let output_to_buffer = req.actions[1] == ExecAction::Buffer;
    if req.strip_trailing_newline && output_to_buffer {
        ctx.output = strip_newline(ctx.output);
    }

    let result = match req.actions[1] {
        ExecAction::Buffer => {
            // When the input action ignored the selection (`Null`/`Tty`
            // input with an active selection still present), fall back to
            // replacing the selection rather than inserting at point —
            // matches `exec.c`'s `prepare_selection(view)` fallback when
            // `del_count == 0` and a selection is active.
            let (repl_start, repl_end) = if input_end > input_start {
                (input_start, input_end)
            } else if selection.is_active() {
                selection.range()
            } else {
                (input_start, input_start)
            };
            let del_count = repl_end - repl_start;
            let cursor = buffer.replace_bytes(repl_start, del_count, &ctx.output)?;
            ExecOutput::BufferReplaced { cursor }
        }
        ExecAction::Msg => {
            let parsed = first_line(&ctx.output)
                .and_then(|l| std::str::from_utf8(l).ok())
                .and_then(|s| s.trim().parse::<usize>().ok())
                .filter(|&x| x > 0);
            if let Some(x) = parsed {
                req.messages.activate(x - 1);
            }
            ExecOutput::MessageIndex(parsed)
        }
        ExecAction::Open => ExecOutput::Filenames(non_empty_lines(&ctx.output)),
        ExecAction::Tag => {
            let line = first_line(&ctx.output).ok_or_else(|| {
                RiftError::new(ErrorType::Internal, "NO_MATCH", "child produced no output")
            })?;
            ExecOutput::Tag(String::from_utf8_lossy(line).into_owned())
        }
        ExecAction::Eval => {
            let text = String::from_utf8_lossy(&ctx.output).into_owned();
            req.evaluator.run(&text)?;
            ExecOutput::Evaluated
        }
        ExecAction::Null | ExecAction::Tty => ExecOutput::None,
        ExecAction::Line | ExecAction::Word | ExecAction::ErrMsg => {
            unreachable!("rejected by validate()")
        }
    };

    Ok((outcome, result))
}
