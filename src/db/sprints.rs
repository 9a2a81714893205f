//! Sprint persistence.

use super::Database;
use crate::error::{BoardError, Result};
use crate::types::{Sprint, SprintStatus, SprintStatusChange};
use chrono::NaiveDate;
use rusqlite::{params, Row};

pub(crate) fn parse_sprint_row(row: &Row) -> rusqlite::Result<Sprint> {
    let start_date: String = row.get("start_date")?;
    let end_date: String = row.get("end_date")?;
    let status: String = row.get("status")?;

    Ok(Sprint {
        id: row.get("id")?,
        name: row.get("name")?,
        goal: row.get("goal")?,
        start_date: start_date.parse::<NaiveDate>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                row.as_ref().column_index("start_date").unwrap_or(0),
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?,
        end_date: end_date.parse::<NaiveDate>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                row.as_ref().column_index("end_date").unwrap_or(0),
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?,
        status: SprintStatus::from_str(&status).unwrap_or(SprintStatus::Planning),
        position: row.get("position")?,
        team_id: row.get("team_id")?,
    })
}

impl Database {
    /// Insert a sprint. The `(team_id, start_date)` unique constraint backs
    /// generation idempotence: an existing window is left untouched.
    /// Returns whether a row was actually inserted.
    pub fn insert_sprint(&self, sprint: &Sprint) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO sprints (id, name, goal, start_date, end_date,
                                                status, position, team_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    sprint.id,
                    sprint.name,
                    sprint.goal,
                    sprint.start_date.to_string(),
                    sprint.end_date.to_string(),
                    sprint.status.as_str(),
                    sprint.position,
                    sprint.team_id,
                ],
            )?;
            Ok(inserted > 0)
        })
    }

    pub fn get_sprint(&self, sprint_id: &str) -> Result<Option<Sprint>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM sprints WHERE id = ?1")?;
            match stmt.query_row(params![sprint_id], parse_sprint_row) {
                Ok(sprint) => Ok(Some(sprint)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// One team's sprints, ordered chronologically.
    pub fn sprints_for_team(&self, team_id: &str) -> Result<Vec<Sprint>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM sprints WHERE team_id = ?1 ORDER BY start_date, id",
            )?;
            let sprints = stmt
                .query_map(params![team_id], parse_sprint_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(sprints)
        })
    }

    /// Persist derived status transitions as a single transaction.
    /// Dates and position are never touched here.
    pub fn apply_sprint_changes(&self, changes: &[SprintStatusChange]) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            for change in changes {
                let updated = tx.execute(
                    "UPDATE sprints SET status = ?1 WHERE id = ?2",
                    params![change.status.as_str(), change.id],
                )?;
                if updated == 0 {
                    return Err(BoardError::SprintNotFound(change.id.clone()));
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// Full-row sprint update, used by the explicit edit operation after
    /// status re-derivation.
    pub fn update_sprint(&self, sprint: &Sprint) -> Result<()> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE sprints SET name = ?1, goal = ?2, start_date = ?3, end_date = ?4,
                                    status = ?5, position = ?6
                 WHERE id = ?7",
                params![
                    sprint.name,
                    sprint.goal,
                    sprint.start_date.to_string(),
                    sprint.end_date.to_string(),
                    sprint.status.as_str(),
                    sprint.position,
                    sprint.id,
                ],
            )?;
            if updated == 0 {
                return Err(BoardError::SprintNotFound(sprint.id.clone()));
            }
            Ok(())
        })
    }
}
