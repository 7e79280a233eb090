//! Reversible edit tree backing undo/redo.
//!
//! Every mutation a [`crate::buffer::Buffer`] makes is recorded as a
//! [`ChangeOp`] in a [`ChangeGraph`]: a rooted tree of nodes kept in a flat
//! arena and addressed by integer [`ChangeId`], so "current" is a plain
//! value rather than a borrowed reference. Undo walks to the parent and
//! applies the inverse op; redo follows the designated current child (or
//! an explicit branch) back down.

use crate::error::{ErrorType, Result, RiftError};


pub type ChangeId = usize;

/// One reversible edit: bytes inserted at `offset`, bytes removed from
/// `offset` (kept here so undo can restore them), or both at once — a
/// `Buffer::replace_bytes` call whose delete and insert sides are both
/// non-empty records as a single `Replace` node rather than two separate
/// undo steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOp {
    Insert { offset: usize, bytes: Vec<u8> },
    Delete { offset: usize, bytes: Vec<u8> },
    Replace { offset: usize, deleted: Vec<u8>, inserted: Vec<u8> },
}

impl ChangeOp {
    pub fn inverse(&self) -> ChangeOp {
        match self {
            ChangeOp::Insert { offset, bytes } => ChangeOp::Delete {
                offset: *offset,
                bytes: bytes.clone(),
            },
            ChangeOp::Delete { offset, bytes } => ChangeOp::Insert {
                offset: *offset,
                bytes: bytes.clone(),
            },
            ChangeOp::Replace { offset, deleted, inserted } => ChangeOp::Replace {
                offset: *offset,
                deleted: inserted.clone(),
                inserted: deleted.clone(),
            },
        }
    }
}

fn can_coalesce(existing: &ChangeOp, incoming: &ChangeOp) -> bool {
    matches!(
        (existing, incoming),
        (
            ChangeOp::Insert { offset: o1, bytes: b1 },
            ChangeOp::Insert { offset: o2, .. },
        ) if *o2 == o1 + b1.len()
    )
}

fn merge_ops(existing: &mut ChangeOp, incoming: ChangeOp) {
    match (existing, incoming) {
        (ChangeOp::Insert { bytes: eb, .. }, ChangeOp::Insert { bytes: ib, .. }) => {
            eb.extend_from_slice(&ib);
        }
        _ => unreachable!("merge_ops called on a non-coalescable pair"),
    }
}

#[derive(Debug, Clone)]
pub struct ChangeNode {
    pub op: ChangeOp,
    pub parent: Option<ChangeId>,
    pub children: Vec<ChangeId>,
    /// Index into `children` that `redo()` follows when no explicit
    /// branch is requested.
    pub current_child: Option<usize>,
    pub cursor_before: usize,
    pub cursor_after: usize,
    pub group_id: Option<u64>,
}

/// Arena-backed tree of [`ChangeNode`]s. Node 0 is an inert root standing
/// in for "the buffer before any edits"; it is never applied or reversed.
#[derive(Debug, Clone)]
pub struct ChangeGraph {
    nodes: Vec<ChangeNode>,
    current: ChangeId,
    saved: ChangeId,
}

impl Default for ChangeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeGraph {
    pub fn new() -> Self {
        let root = ChangeNode {
            op: ChangeOp::Insert { offset: 0, bytes: Vec::new() },
            parent: None,
            children: Vec::new(),
            current_child: None,
            cursor_before: 0,
            cursor_after: 0,
            group_id: None,
        };
        ChangeGraph { nodes: vec![root], current: 0, saved: 0 }
    }

    pub fn current_id(&self) -> ChangeId {
        self.current
    }

    pub fn node(&self, id: ChangeId) -> &ChangeNode {
        &self.nodes[id]
    }

    pub fn mark_saved(&mut self) {
        self.saved = self.current;
    }

    pub fn modified(&self) -> bool {
        self.current != self.saved
    }

    pub fn can_undo(&self) -> bool {
        self.current != 0
    }

    pub fn can_redo(&self) -> bool {
        self.nodes[self.current].current_child.is_some()
    }

    pub fn branch_count(&self) -> usize {
        self.nodes[self.current].children.len()
    }

    /// Record a new edit as a child of the current node, coalescing into
    /// the current node in place when `group_id` matches and the ops are
    /// contiguous plain inserts.
    pub fn record(
        &mut self,
        op: ChangeOp,
        cursor_before: usize,
        cursor_after: usize,
        group_id: Option<u64>,
    ) -> ChangeId {
        if let Some(gid) = group_id {
            if self.current != 0 {
                let mergeable = {
                    let cur = &self.nodes[self.current];
                    cur.group_id == Some(gid) && can_coalesce(&cur.op, &op)
                };
                if mergeable {
                    let cur = &mut self.nodes[self.current];
                    merge_ops(&mut cur.op, op);
                    cur.cursor_after = cursor_after;
                    return self.current;
                }
            }
        }

        let id = self.nodes.len();
        self.nodes.push(ChangeNode {
            op,
            parent: Some(self.current),
            children: Vec::new(),
            current_child: None,
            cursor_before,
            cursor_after,
            group_id,
        });
        let parent = &mut self.nodes[self.current];
        parent.children.push(id);
        parent.current_child = Some(parent.children.len() - 1);
        self.current = id;
        id
    }

    /// Returns the inverse op to apply to the buffer, and the cursor
    /// position to restore afterward.
    pub fn undo(&mut self) -> Result<(ChangeOp, usize)> {
        if self.current == 0 {
            return Err(RiftError::new(ErrorType::Internal, "AT_ROOT", "nothing to undo"));
        }
        let node = &self.nodes[self.current];
        let inverse = node.op.inverse();
        let cursor = node.cursor_before;
        self.current = node.parent.expect("non-root node always has a parent");
        Ok((inverse, cursor))
    }

    /// Reapplies the designated (or explicitly chosen) child's op.
    pub fn redo(&mut self, child_id: Option<ChangeId>) -> Result<(ChangeOp, usize)> {
        let node = &self.nodes[self.current];
        let target = match child_id {
            Some(cid) => {
                if !node.children.contains(&cid) {
                    return Err(RiftError::new(
                        ErrorType::Internal,
                        "NO_SUCH_CHILD",
                        "requested branch is not a child of the current change",
                    ));
                }
                cid
            }
            None => {
                let idx = node.current_child.ok_or_else(|| {
                    RiftError::new(ErrorType::Internal, "AT_LEAF", "nothing to redo")
                })?;
                node.children[idx]
            }
        };

        let parent_id = self.current;
        let child_idx = self.nodes[parent_id]
            .children
            .iter()
            .position(|&c| c == target)
            .expect("target was validated as a child above");
        self.nodes[parent_id].current_child = Some(child_idx);
        self.current = target;

        let applied = self.nodes[target].op.clone();
        let cursor = self.nodes[target].cursor_after;
        Ok((applied, cursor))
    }
}
