//! Sprint scheduler: window generation and time-derived lifecycle status.
//!
//! Sprint windows are week-aligned: generation anchors at the first Monday
//! on/after January 1 of the reference year and carves consecutive windows
//! of `duration_weeks`, each ending on the Sunday of its last week
//! (inclusive `end_date`). Status is never stored ahead of time; it is
//! derived from the current date and only persisted when it differs.

use crate::types::{Sprint, SprintStatus, SprintStatusChange};
use chrono::{Datelike, Days, NaiveDate};
use uuid::Uuid;

/// The first Monday on or after the given date.
pub fn first_monday_on_or_after(date: NaiveDate) -> NaiveDate {
    let offset = (7 - date.weekday().num_days_from_monday()) % 7;
    date + Days::new(offset as u64)
}

/// Generate the sprint windows for `reference_year`.
///
/// Windows are carved from the year's first Monday until the next window's
/// end would fall in a later year. A window whose `(team_id, start_date)`
/// already exists in `existing` is skipped silently, so re-running
/// generation is idempotent. `position` is the zero-based window index, so
/// it is stable across runs regardless of how many windows already exist.
pub fn generate_sprints(
    existing: &[Sprint],
    team_id: &str,
    reference_year: i32,
    duration_weeks: u32,
) -> Vec<Sprint> {
    debug_assert!(duration_weeks > 0);
    let jan_first = match NaiveDate::from_ymd_opt(reference_year, 1, 1) {
        Some(date) => date,
        None => return Vec::new(),
    };
    let anchor = first_monday_on_or_after(jan_first);
    let window_days = duration_weeks as u64 * 7;

    let taken: std::collections::HashSet<NaiveDate> = existing
        .iter()
        .filter(|s| s.team_id == team_id)
        .map(|s| s.start_date)
        .collect();

    let mut generated = Vec::new();
    let mut index: u64 = 0;
    loop {
        let start = anchor + Days::new(index * window_days);
        let end = start + Days::new(window_days - 1);
        if end.year() > reference_year {
            break;
        }
        if !taken.contains(&start) {
            generated.push(Sprint {
                id: Uuid::new_v4().to_string(),
                name: format!("Sprint {} ({})", index + 1, start.format("%Y-%m-%d")),
                goal: None,
                start_date: start,
                end_date: end,
                status: SprintStatus::Planning,
                position: index as i64,
                team_id: team_id.to_string(),
            });
        }
        index += 1;
    }
    generated
}

/// Derive a sprint's lifecycle status from the current date.
///
/// `end_date` is inclusive: a sprint is still active on its last day.
pub fn compute_status(sprint: &Sprint, today: NaiveDate) -> SprintStatus {
    if today < sprint.start_date {
        SprintStatus::Planning
    } else if today > sprint.end_date {
        SprintStatus::Completed
    } else {
        SprintStatus::Active
    }
}

/// Recompute every sprint's status and emit a change only where the derived
/// status differs from the stored one. Dates and position are never touched.
pub fn refresh_statuses(sprints: &[Sprint], today: NaiveDate) -> Vec<SprintStatusChange> {
    sprints
        .iter()
        .filter_map(|sprint| {
            let derived = compute_status(sprint, today);
            (derived != sprint.status).then(|| SprintStatusChange {
                id: sprint.id.clone(),
                status: derived,
            })
        })
        .collect()
}

/// The sprint a board should select by default.
///
/// Prefers the currently active sprint; else the earliest upcoming planning
/// sprint; else the chronologically last sprint by `end_date`, so a team
/// with only finished sprints still has a selectable one. Returns `None`
/// only for an empty slice.
pub fn select_default_active(sprints: &[Sprint], today: NaiveDate) -> Option<&Sprint> {
    if let Some(active) = sprints
        .iter()
        .find(|s| compute_status(s, today) == SprintStatus::Active)
    {
        return Some(active);
    }
    if let Some(upcoming) = sprints
        .iter()
        .filter(|s| s.start_date > today)
        .min_by_key(|s| s.start_date)
    {
        return Some(upcoming);
    }
    sprints.iter().max_by_key(|s| s.end_date)
}
