//! Task persistence.

use super::{now_ms, Database};
use crate::error::{BoardError, Result};
use crate::types::{Task, TaskChange};
use chrono::NaiveDate;
use rusqlite::{params, Row};

pub(crate) fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let tags_json: Option<String> = row.get("tags")?;
    let due_date: Option<String> = row.get("due_date")?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: row.get("status")?,
        position: row.get("position")?,
        team_id: row.get("team_id")?,
        sprint_id: row.get("sprint_id")?,
        assignee_id: row.get("assignee_id")?,
        priority: row.get("priority")?,
        tags: tags_json
            .map(|s| serde_json::from_str(&s).unwrap_or_default())
            .unwrap_or_default(),
        estimated_effort: row.get("estimated_effort")?,
        actual_effort: row.get("actual_effort")?,
        due_date: due_date.and_then(|s| s.parse::<NaiveDate>().ok()),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl Database {
    /// Insert a task row as-is. The caller is responsible for the append
    /// position (`plan_add`).
    pub fn insert_task(&self, task: &Task) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (id, title, description, status, position, team_id,
                                    sprint_id, assignee_id, priority, tags,
                                    estimated_effort, actual_effort, due_date,
                                    created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    task.id,
                    task.title,
                    task.description,
                    task.status,
                    task.position,
                    task.team_id,
                    task.sprint_id,
                    task.assignee_id,
                    task.priority,
                    serde_json::to_string(&task.tags).unwrap_or_else(|_| "[]".to_string()),
                    task.estimated_effort,
                    task.actual_effort,
                    task.due_date.map(|d| d.to_string()),
                    task.created_at,
                    task.updated_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;
            match stmt.query_row(params![task_id], parse_task_row) {
                Ok(task) => Ok(Some(task)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// One team's tasks, ordered by column and position.
    pub fn tasks_for_team(&self, team_id: &str) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM tasks WHERE team_id = ?1 ORDER BY status, position, id",
            )?;
            let tasks = stmt
                .query_map(params![team_id], parse_task_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
    }

    /// Apply an ordering-engine change list as a single transaction.
    pub fn apply_task_changes(&self, changes: &[TaskChange]) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }
        self.with_conn_mut(|conn| {
            let now = now_ms();
            let tx = conn.transaction()?;
            for change in changes {
                let updated = tx.execute(
                    "UPDATE tasks SET status = ?1, position = ?2, updated_at = ?3 WHERE id = ?4",
                    params![change.status, change.position, now, change.id],
                )?;
                if updated == 0 {
                    return Err(BoardError::TaskNotFound(change.id.clone()));
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// Delete a task and re-compact its group in the same transaction.
    pub fn delete_task(&self, task_id: &str, compaction: &[TaskChange]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let now = now_ms();
            let tx = conn.transaction()?;
            let deleted = tx.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            if deleted == 0 {
                return Err(BoardError::TaskNotFound(task_id.to_string()));
            }
            for change in compaction {
                tx.execute(
                    "UPDATE tasks SET status = ?1, position = ?2, updated_at = ?3 WHERE id = ?4",
                    params![change.status, change.position, now, change.id],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// Point a task at a sprint (or clear the reference). Team agreement is
    /// checked at the service layer.
    pub fn set_task_sprint(&self, task_id: &str, sprint_id: Option<&str>) -> Result<()> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE tasks SET sprint_id = ?1, updated_at = ?2 WHERE id = ?3",
                params![sprint_id, now_ms(), task_id],
            )?;
            if updated == 0 {
                return Err(BoardError::TaskNotFound(task_id.to_string()));
            }
            Ok(())
        })
    }
}
