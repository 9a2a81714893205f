//! Integration tests for the board service over the SQLite store.
//!
//! These drive the full stack: pure engines, optimistic reconciler, and the
//! in-memory SQLite database applying change lists transactionally.

use sprint_board::config::{BoardConfig, ColumnConfig};
use sprint_board::db::Database;
use sprint_board::drag::DragTarget;
use sprint_board::error::BoardError;
use sprint_board::service::{BoardService, NewTask, SprintEdit};
use sprint_board::types::{SprintStatus, Task};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn setup() -> BoardService<Database> {
    let db = Database::open_in_memory().expect("failed to create in-memory database");
    BoardService::new(db, BoardConfig::default(), "team-1").expect("failed to build service")
}

fn new_task(title: &str) -> NewTask {
    NewTask {
        title: title.to_string(),
        ..NewTask::default()
    }
}

fn new_task_in(title: &str, status: &str) -> NewTask {
    NewTask {
        title: title.to_string(),
        status: Some(status.to_string()),
        ..NewTask::default()
    }
}

fn column<'a>(tasks: &'a [Task], status: &str) -> Vec<(&'a str, i64)> {
    let mut group: Vec<(&str, i64)> = tasks
        .iter()
        .filter(|t| t.status == status)
        .map(|t| (t.title.as_str(), t.position))
        .collect();
    group.sort_by_key(|(_, p)| *p);
    group
}

mod task_tests {
    use super::*;

    #[test]
    fn add_appends_to_first_column() {
        let mut service = setup();

        let a = service.add_task(new_task("A")).unwrap();
        let b = service.add_task(new_task("B")).unwrap();

        assert_eq!(a.status, "todo");
        assert_eq!(a.position, 0);
        assert_eq!(b.position, 1);
        assert_eq!(a.team_id, "team-1");
    }

    #[test]
    fn add_to_unknown_column_is_rejected() {
        let mut service = setup();
        let result = service.add_task(new_task_in("A", "trash"));
        assert!(matches!(result, Err(BoardError::InvalidDestination(_))));
    }

    #[test]
    fn move_between_columns_updates_both_groups() {
        // TODO=[A(0), B(1)], DOING=[C(0)]; move A to DOING index 0.
        let mut service = setup();
        let a = service.add_task(new_task("A")).unwrap();
        service.add_task(new_task("B")).unwrap();
        service.add_task(new_task_in("C", "doing")).unwrap();

        service.move_task(&a.id, "doing", 0).unwrap();

        let tasks = &service.snapshot().tasks;
        assert_eq!(column(tasks, "doing"), vec![("A", 0), ("C", 1)]);
        assert_eq!(column(tasks, "todo"), vec![("B", 0)]);
    }

    #[test]
    fn move_round_trip_restores_original_order() {
        let mut service = setup();
        service.add_task(new_task("A")).unwrap();
        let b = service.add_task(new_task("B")).unwrap();
        service.add_task(new_task("C")).unwrap();

        service.move_task(&b.id, "doing", 0).unwrap();
        service.move_task(&b.id, "todo", 1).unwrap();

        let tasks = &service.snapshot().tasks;
        assert_eq!(column(tasks, "todo"), vec![("A", 0), ("B", 1), ("C", 2)]);
        assert!(column(tasks, "doing").is_empty());
    }

    #[test]
    fn wip_limit_rejection_leaves_groups_unchanged() {
        let mut service = setup();
        let a = service.add_task(new_task("A")).unwrap();
        for i in 0..5 {
            service
                .add_task(new_task_in(&format!("D{i}"), "doing"))
                .unwrap();
        }

        let err = service.move_task(&a.id, "doing", 0).unwrap_err();
        assert!(matches!(err, BoardError::LimitExceeded { limit: 5, .. }));

        let tasks = &service.snapshot().tasks;
        assert_eq!(column(tasks, "todo"), vec![("A", 0)]);
        assert_eq!(column(tasks, "doing").len(), 5);
    }

    #[test]
    fn remove_closes_the_gap_in_the_database() {
        let mut service = setup();
        let a = service.add_task(new_task("A")).unwrap();
        service.add_task(new_task("B")).unwrap();
        service.add_task(new_task("C")).unwrap();

        service.remove_task(&a.id).unwrap();

        // Positions are contiguous in the reconciled state...
        let tasks = &service.snapshot().tasks;
        assert_eq!(column(tasks, "todo"), vec![("B", 0), ("C", 1)]);

        // ...and in the authoritative store.
        service.refresh_from_store().unwrap();
        let tasks = &service.snapshot().tasks;
        assert_eq!(column(tasks, "todo"), vec![("B", 0), ("C", 1)]);
    }

    #[test]
    fn positions_stay_contiguous_under_mixed_operations() {
        let mut service = setup();
        let ids: Vec<String> = (0..6)
            .map(|i| service.add_task(new_task(&format!("T{i}"))).unwrap().id)
            .collect();

        service.move_task(&ids[2], "doing", 0).unwrap();
        service.move_task(&ids[0], "done", 0).unwrap();
        service.reorder_task(&ids[4], 0).unwrap();
        service.move_task(&ids[2], "done", 1).unwrap();
        service.remove_task(&ids[5]).unwrap();

        service.refresh_from_store().unwrap();
        for status in ["todo", "doing", "done"] {
            let group = column(&service.snapshot().tasks, status);
            let positions: Vec<i64> = group.iter().map(|(_, p)| *p).collect();
            let expected: Vec<i64> = (0..positions.len() as i64).collect();
            assert_eq!(positions, expected, "non-contiguous '{status}'");
        }
    }

    #[test]
    fn in_flight_ids_clear_on_next_snapshot() {
        let mut service = setup();
        let a = service.add_task(new_task("A")).unwrap();

        assert!(service.in_flight().contains(&a.id));
        service.refresh_from_store().unwrap();
        assert!(service.in_flight().is_empty());
    }

    #[test]
    fn snapshot_feed_sees_committed_moves() {
        let mut service = setup();
        let mut rx = service.subscribe();

        let a = service.add_task(new_task("A")).unwrap();
        service.move_task(&a.id, "doing", 0).unwrap();

        let snapshot = rx.borrow_and_update();
        assert_eq!(snapshot.tasks.len(), 1);
        assert_eq!(snapshot.tasks[0].status, "doing");
    }

    #[test]
    fn external_writes_supersede_local_state() {
        let db = Database::open_in_memory().unwrap();
        let mut service =
            BoardService::new(db.clone(), BoardConfig::default(), "team-1").unwrap();
        let a = service.add_task(new_task("A")).unwrap();

        // Another client moved the task; the next snapshot wins wholesale.
        db.apply_task_changes(&[sprint_board::types::TaskChange {
            id: a.id.clone(),
            status: "done".to_string(),
            position: 0,
        }])
        .unwrap();
        service.refresh_from_store().unwrap();

        assert_eq!(service.snapshot().tasks[0].status, "done");
    }
}

mod sprint_tests {
    use super::*;

    #[test]
    fn generation_is_idempotent_through_the_store() {
        let mut service = setup();

        let first = service.generate_sprints(2025, Some(2)).unwrap();
        let second = service.generate_sprints(2025, Some(2)).unwrap();

        assert_eq!(first.len(), 25);
        assert!(second.is_empty());
        assert_eq!(service.snapshot().sprints.len(), 25);

        service.refresh_from_store().unwrap();
        assert_eq!(service.snapshot().sprints.len(), 25);
    }

    #[test]
    fn refresh_persists_derived_statuses() {
        let mut service = setup();
        service.generate_sprints(2025, Some(2)).unwrap();

        let changes = service.refresh_sprint_statuses(date(2025, 1, 10)).unwrap();

        // Exactly one sprint is active on 2025-01-10; the rest stay planning.
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].status, SprintStatus::Active);

        service.refresh_from_store().unwrap();
        let active: Vec<_> = service
            .snapshot()
            .sprints
            .iter()
            .filter(|s| s.status == SprintStatus::Active)
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].start_date, date(2025, 1, 6));

        // Re-running with the same date emits nothing.
        assert!(service.refresh_sprint_statuses(date(2025, 1, 10)).unwrap().is_empty());
    }

    #[test]
    fn default_sprint_prefers_active_then_upcoming() {
        let mut service = setup();
        service.generate_sprints(2025, Some(2)).unwrap();

        let active = service.default_sprint(date(2025, 1, 10)).unwrap();
        assert_eq!(active.start_date, date(2025, 1, 6));

        // Before the year starts, the earliest upcoming sprint is chosen.
        let upcoming = service.default_sprint(date(2025, 1, 1)).unwrap();
        assert_eq!(upcoming.start_date, date(2025, 1, 6));

        // After the year ends, fall back to the chronologically last one.
        let last = service.default_sprint(date(2026, 6, 1)).unwrap();
        assert_eq!(last.position, 24);
    }

    #[test]
    fn edit_rederives_status() {
        let mut service = setup();
        service.generate_sprints(2025, Some(2)).unwrap();
        let sprint = service.default_sprint(date(2025, 1, 10)).unwrap();

        let edited = service
            .edit_sprint(
                &sprint.id,
                SprintEdit {
                    name: Some("Kickoff".to_string()),
                    start_date: Some(date(2025, 3, 3)),
                    end_date: Some(date(2025, 3, 16)),
                    ..SprintEdit::default()
                },
                date(2025, 1, 10),
            )
            .unwrap();

        assert_eq!(edited.name, "Kickoff");
        assert_eq!(edited.status, SprintStatus::Planning);
        assert_eq!(edited.position, sprint.position);

        service.refresh_from_store().unwrap();
        let stored = service
            .snapshot()
            .sprints
            .iter()
            .find(|s| s.id == sprint.id)
            .unwrap()
            .clone();
        assert_eq!(stored.name, "Kickoff");
        assert_eq!(stored.start_date, date(2025, 3, 3));
    }

    #[test]
    fn sprint_assignment_requires_same_team() {
        let db = Database::open_in_memory().unwrap();
        let mut other_team =
            BoardService::new(db.clone(), BoardConfig::default(), "team-2").unwrap();
        let foreign = other_team.generate_sprints(2025, Some(2)).unwrap()[0].clone();

        let mut service = BoardService::new(db, BoardConfig::default(), "team-1").unwrap();
        let task = service.add_task(new_task("A")).unwrap();

        let err = service.assign_sprint(&task.id, Some(&foreign.id)).unwrap_err();
        assert!(matches!(err, BoardError::TeamMismatch { .. }));

        let own = service.generate_sprints(2025, Some(2)).unwrap()[0].clone();
        service.assign_sprint(&task.id, Some(&own.id)).unwrap();
        service.refresh_from_store().unwrap();
        assert_eq!(
            service.snapshot().tasks[0].sprint_id.as_deref(),
            Some(own.id.as_str())
        );

        service.assign_sprint(&task.id, None).unwrap();
        assert!(service.snapshot().tasks[0].sprint_id.is_none());
    }
}

mod drag_tests {
    use super::*;

    #[test]
    fn drag_session_commits_one_move() {
        let mut service = setup();
        let a = service.add_task(new_task("A")).unwrap();
        service.add_task(new_task_in("C", "doing")).unwrap();

        service.drag_begin(&a.id).unwrap();
        assert!(service.is_dragging());
        service.drag_update(DragTarget::Column {
            status: "doing".to_string(),
        });
        let changes = service.drag_end().unwrap();

        assert!(!service.is_dragging());
        assert_eq!(changes.len(), 1);
        assert_eq!(column(&service.snapshot().tasks, "doing"), vec![("C", 0), ("A", 1)]);
    }

    #[test]
    fn drag_cancel_commits_nothing() {
        let mut service = setup();
        let a = service.add_task(new_task("A")).unwrap();

        service.drag_begin(&a.id).unwrap();
        service.drag_update(DragTarget::Column {
            status: "doing".to_string(),
        });
        service.drag_cancel();

        assert_eq!(column(&service.snapshot().tasks, "todo"), vec![("A", 0)]);
        assert!(column(&service.snapshot().tasks, "doing").is_empty());
    }

    #[test]
    fn drag_survives_task_removal_mid_session() {
        let mut service = setup();
        let a = service.add_task(new_task("A")).unwrap();
        service.add_task(new_task("B")).unwrap();

        service.drag_begin(&a.id).unwrap();
        service.remove_task(&a.id).unwrap();
        service.drag_update(DragTarget::Column {
            status: "todo".to_string(),
        });
        let changes = service.drag_end().unwrap();

        assert!(changes.is_empty());
        assert!(!service.is_dragging());
        assert_eq!(column(&service.snapshot().tasks, "todo"), vec![("B", 0)]);
    }

    #[test]
    fn drag_to_unknown_container_cancels() {
        let mut service = setup();
        let a = service.add_task(new_task("A")).unwrap();

        service.drag_begin(&a.id).unwrap();
        service.drag_update(DragTarget::Column {
            status: "trash".to_string(),
        });
        let changes = service.drag_end().unwrap();

        assert!(changes.is_empty());
        assert_eq!(column(&service.snapshot().tasks, "todo"), vec![("A", 0)]);
    }
}

mod persistence_tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn board_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("board.db");

        {
            let db = Database::open(&db_path).unwrap();
            let mut service = BoardService::new(db, BoardConfig::default(), "team-1").unwrap();
            let a = service.add_task(new_task("A")).unwrap();
            service.add_task(new_task("B")).unwrap();
            service.move_task(&a.id, "doing", 0).unwrap();
            service.generate_sprints(2025, Some(2)).unwrap();
        }

        let db = Database::open(&db_path).unwrap();
        let service = BoardService::new(db, BoardConfig::default(), "team-1").unwrap();
        let tasks = &service.snapshot().tasks;
        assert_eq!(column(tasks, "doing"), vec![("A", 0)]);
        assert_eq!(column(tasks, "todo"), vec![("B", 0)]);
        assert_eq!(service.snapshot().sprints.len(), 25);
    }

    #[test]
    fn pipeline_profile_columns_work_end_to_end() {
        let config = BoardConfig {
            columns: vec![
                ColumnConfig::new("backlog", "Backlog"),
                ColumnConfig::new("bid", "Bid").with_wip_limit(2),
                ColumnConfig::new("submitted", "Submitted"),
            ],
            ..BoardConfig::default()
        };
        let db = Database::open_in_memory().unwrap();
        let mut service = BoardService::new(db, config, "pipeline").unwrap();

        let a = service.add_task(new_task_in("Opp A", "backlog")).unwrap();
        let b = service.add_task(new_task_in("Opp B", "backlog")).unwrap();
        let c = service.add_task(new_task_in("Opp C", "backlog")).unwrap();

        service.move_task(&a.id, "bid", 0).unwrap();
        service.move_task(&b.id, "bid", 1).unwrap();
        let err = service.move_task(&c.id, "bid", 0).unwrap_err();
        assert!(matches!(err, BoardError::LimitExceeded { limit: 2, .. }));

        service.move_task(&a.id, "submitted", 0).unwrap();
        let tasks = &service.snapshot().tasks;
        assert_eq!(column(tasks, "bid"), vec![("Opp B", 0)]);
        assert_eq!(column(tasks, "submitted"), vec![("Opp A", 0)]);
    }
}
