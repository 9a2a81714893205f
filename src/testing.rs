//! Shared fixtures for unit tests.

use crate::types::{Sprint, SprintStatus, Task, PRIORITY_MEDIUM};
use chrono::NaiveDate;

/// A minimal task on team `team-1`.
pub fn make_task(id: &str, status: &str, position: i64) -> Task {
    Task {
        id: id.to_string(),
        title: format!("Task {id}"),
        description: None,
        status: status.to_string(),
        position,
        team_id: "team-1".to_string(),
        sprint_id: None,
        assignee_id: None,
        priority: PRIORITY_MEDIUM,
        tags: Vec::new(),
        estimated_effort: None,
        actual_effort: None,
        due_date: None,
        created_at: 0,
        updated_at: 0,
    }
}

/// A sprint on team `team-1` with the given inclusive date window.
pub fn make_sprint(id: &str, start: NaiveDate, end: NaiveDate, position: i64) -> Sprint {
    Sprint {
        id: id.to_string(),
        name: format!("Sprint {id}"),
        goal: None,
        start_date: start,
        end_date: end,
        status: SprintStatus::Planning,
        position,
        team_id: "team-1".to_string(),
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
