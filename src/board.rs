//! Board model: grouping of tasks into ordered status columns.

use crate::types::Task;
use std::collections::HashMap;

/// A read-only indexed view over one team's tasks, grouped by column and
/// ordered by position.
///
/// The view borrows the underlying slice; it is rebuilt after every
/// mutation rather than maintained incrementally.
#[derive(Debug)]
pub struct BoardView<'a> {
    groups: HashMap<String, Vec<&'a Task>>,
}

impl<'a> BoardView<'a> {
    /// Build a view over `tasks`. Tasks are grouped by `status` and each
    /// group is sorted by `position` (ties broken by id for stability).
    pub fn new(tasks: &'a [Task]) -> Self {
        let mut groups: HashMap<String, Vec<&'a Task>> = HashMap::new();
        for task in tasks {
            groups.entry(task.status.clone()).or_default().push(task);
        }
        for group in groups.values_mut() {
            group.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        }
        Self { groups }
    }

    /// The ordered tasks in one column. Empty for unknown columns.
    pub fn column(&self, status: &str) -> &[&'a Task] {
        self.groups.get(status).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of tasks in one column.
    pub fn column_len(&self, status: &str) -> usize {
        self.column(status).len()
    }

    /// Locate a task: its column id and its index within the column.
    pub fn locate(&self, task_id: &str) -> Option<(&str, usize)> {
        for (status, group) in &self.groups {
            if let Some(index) = group.iter().position(|t| t.id == task_id) {
                return Some((status.as_str(), index));
            }
        }
        None
    }

    /// Column ids present in the view (tasks only; empty configured columns
    /// do not appear).
    pub fn statuses(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }
}
