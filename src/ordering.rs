//! Ordering engine: pure planners for board position mutations.
//!
//! Every operation takes a snapshot of one team's tasks and returns the
//! list of `(id, status, position)` tuples that changed. The caller applies
//! the whole list as a single atomic replace. Nothing here performs I/O.
//!
//! Invariant: within any (`team_id`, `status`) group the set of positions is
//! exactly `{0..n-1}`. The planners re-derive positions from list order, so
//! the invariant holds after any sequence of operations.

use crate::error::{BoardError, Result};
use crate::types::{Task, TaskChange};
use std::collections::HashSet;

/// Ordered ids of one column, de-duplicated.
///
/// Groups are rebuilt from positions on every call; a duplicate id (which
/// only a corrupted snapshot can produce) keeps its first occurrence by
/// position order.
fn group_ids(tasks: &[Task], status: &str) -> Vec<String> {
    let mut members: Vec<&Task> = tasks.iter().filter(|t| t.status == status).collect();
    members.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));

    let mut seen = HashSet::new();
    members
        .iter()
        .filter(|t| seen.insert(t.id.as_str()))
        .map(|t| t.id.clone())
        .collect()
}

/// Emit changes for every task whose `(status, position)` differs from the
/// re-derived list order of its group.
fn diff_group(tasks: &[Task], status: &str, ordered_ids: &[String], out: &mut Vec<TaskChange>) {
    for (index, id) in ordered_ids.iter().enumerate() {
        let position = index as i64;
        let current = tasks.iter().find(|t| &t.id == id);
        let unchanged = current
            .map(|t| t.status == status && t.position == position)
            .unwrap_or(false);
        if !unchanged {
            out.push(TaskChange {
                id: id.clone(),
                status: status.to_string(),
                position,
            });
        }
    }
}

/// Position for a task appended to a column (`group length`).
pub fn plan_add(tasks: &[Task], status: &str) -> i64 {
    group_ids(tasks, status).len() as i64
}

/// Plan moving `task_id` to `dest_status` at `dest_index`.
///
/// `dest_wip_limit` is the destination column's WIP limit, if any; the
/// same-column case is exempt because the column length is unchanged.
/// `dest_index` counts positions in the destination at insertion time, so
/// `0 ..= destination length` is the valid range.
///
/// Returns an empty list when the move is a no-op (same column, same slot).
pub fn plan_move(
    tasks: &[Task],
    task_id: &str,
    dest_status: &str,
    dest_index: usize,
    dest_wip_limit: Option<usize>,
) -> Result<Vec<TaskChange>> {
    let task = tasks
        .iter()
        .find(|t| t.id == task_id)
        .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;
    let source_status = task.status.clone();
    let same_column = source_status == dest_status;

    let mut source_ids = group_ids(tasks, &source_status);
    source_ids.retain(|id| id != task_id);

    let mut dest_ids = if same_column {
        source_ids.clone()
    } else {
        group_ids(tasks, dest_status)
    };

    if dest_index > dest_ids.len() {
        return Err(BoardError::InvalidDestination(format!(
            "index {} out of bounds for column '{}' of length {}",
            dest_index,
            dest_status,
            dest_ids.len()
        )));
    }

    if !same_column {
        if let Some(limit) = dest_wip_limit {
            if dest_ids.len() + 1 > limit {
                return Err(BoardError::LimitExceeded {
                    status: dest_status.to_string(),
                    limit,
                });
            }
        }
    }

    dest_ids.insert(dest_index, task_id.to_string());

    let mut changes = Vec::new();
    if !same_column {
        diff_group(tasks, &source_status, &source_ids, &mut changes);
    }
    diff_group(tasks, dest_status, &dest_ids, &mut changes);
    Ok(changes)
}

/// Plan reordering `task_id` within its own column. No status change, no
/// WIP check.
pub fn plan_reorder(tasks: &[Task], task_id: &str, dest_index: usize) -> Result<Vec<TaskChange>> {
    let task = tasks
        .iter()
        .find(|t| t.id == task_id)
        .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;
    let status = task.status.clone();
    plan_move(tasks, task_id, &status, dest_index, None)
}

/// Plan the compaction changes after deleting `task_id`: every source-group
/// sibling above the removed position shifts down one. The deletion itself
/// is the caller's to perform in the same atomic step.
pub fn plan_remove(tasks: &[Task], task_id: &str) -> Result<Vec<TaskChange>> {
    let task = tasks
        .iter()
        .find(|t| t.id == task_id)
        .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;
    let status = task.status.clone();

    let mut remaining = group_ids(tasks, &status);
    remaining.retain(|id| id != task_id);

    let mut changes = Vec::new();
    diff_group(tasks, &status, &remaining, &mut changes);
    Ok(changes)
}

/// Apply a change list to an in-memory snapshot (optimistic application).
pub fn apply_changes(tasks: &mut [Task], changes: &[TaskChange]) {
    for change in changes {
        if let Some(task) = tasks.iter_mut().find(|t| t.id == change.id) {
            task.status = change.status.clone();
            task.position = change.position;
        }
    }
}
