//! Core types for the sprint-board engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Task priority as an integer (higher = more important).
/// Default is 0. Typical range: -100 to 100.
pub type Priority = i32;

/// Priority constants for convenience.
pub const PRIORITY_HIGH: Priority = 1;
pub const PRIORITY_MEDIUM: Priority = 0;
pub const PRIORITY_LOW: Priority = -1;

/// Parse a priority string ("high", "medium", "low") to an integer.
/// Returns 0 (medium) for unrecognized values.
pub fn parse_priority(s: &str) -> Priority {
    match s.to_lowercase().as_str() {
        "high" => PRIORITY_HIGH,
        "medium" => PRIORITY_MEDIUM,
        "low" => PRIORITY_LOW,
        _ => s.parse().unwrap_or(PRIORITY_MEDIUM),
    }
}

/// Convert priority integer to string representation.
pub fn priority_to_str(p: Priority) -> &'static str {
    if p > 0 {
        "high"
    } else if p < 0 {
        "low"
    } else {
        "medium"
    }
}

/// A card on the board.
///
/// `status` is a column id validated against the configured board columns.
/// `position` is the zero-based ordering key within the task's
/// (`team_id`, `status`) group; a group's positions are always exactly
/// `{0..n-1}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub position: i64,
    pub team_id: String,
    pub sprint_id: Option<String>,
    pub assignee_id: Option<String>,
    pub priority: Priority,
    pub tags: Vec<String>,

    // Estimation & tracking (hours)
    pub estimated_effort: Option<f64>,
    pub actual_effort: Option<f64>,
    pub due_date: Option<NaiveDate>,

    pub created_at: i64,
    pub updated_at: i64,
}

/// Lifecycle status of a sprint, derived from wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SprintStatus {
    Planning,
    Active,
    Completed,
}

impl SprintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SprintStatus::Planning => "planning",
            SprintStatus::Active => "active",
            SprintStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "planning" => Some(SprintStatus::Planning),
            "active" => Some(SprintStatus::Active),
            "completed" => Some(SprintStatus::Completed),
            _ => None,
        }
    }
}

/// A sprint period for a team.
///
/// `end_date` is inclusive (the last day of the last week). `position` is
/// the zero-based generation index. `status` is `Planning` at creation and
/// only ever changed by status derivation afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprint {
    pub id: String,
    pub name: String,
    pub goal: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: SprintStatus,
    pub position: i64,
    pub team_id: String,
}

/// A single task mutation produced by the ordering engine.
///
/// The full list returned by a planning call must be applied as one atomic
/// replace; partial application must never be observable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskChange {
    pub id: String,
    pub status: String,
    pub position: i64,
}

/// A sprint status transition emitted by `refresh_statuses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintStatusChange {
    pub id: String,
    pub status: SprintStatus,
}

/// A full-replace view of one team's collections, as delivered by the
/// persistence collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSnapshot {
    pub team_id: String,
    pub tasks: Vec<Task>,
    pub sprints: Vec<Sprint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_roundtrip() {
        assert_eq!(parse_priority("high"), PRIORITY_HIGH);
        assert_eq!(parse_priority("LOW"), PRIORITY_LOW);
        assert_eq!(parse_priority("garbage"), PRIORITY_MEDIUM);
        assert_eq!(parse_priority("42"), 42);
        assert_eq!(priority_to_str(7), "high");
        assert_eq!(priority_to_str(-3), "low");
        assert_eq!(priority_to_str(0), "medium");
    }

    #[test]
    fn sprint_status_strings() {
        for status in [
            SprintStatus::Planning,
            SprintStatus::Active,
            SprintStatus::Completed,
        ] {
            assert_eq!(SprintStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(SprintStatus::from_str("archived"), None);
    }
}
