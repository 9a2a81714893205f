//! Orchestration layer: repository seams and the per-team board service.
//!
//! The service owns no business rules of its own. It calls the pure
//! engines, persists the returned change lists through the injected store,
//! applies them optimistically to the reconciler, and publishes the working
//! snapshot on the feed. If the store call fails the optimistic state is
//! rolled back; any remaining divergence is corrected by the next
//! authoritative snapshot.

use crate::config::BoardConfig;
use crate::db::{now_ms, Database};
use crate::drag::{DragSession, DragTarget};
use crate::error::{BoardError, Result};
use crate::ordering;
use crate::sprints;
use crate::sync::{Reconciler, SnapshotFeed};
use crate::types::{
    Priority, Sprint, SprintStatusChange, Task, TaskChange, TeamSnapshot,
};
use chrono::NaiveDate;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Task persistence seam.
pub trait TaskStore {
    fn tasks_for_team(&self, team_id: &str) -> Result<Vec<Task>>;
    fn get_task(&self, task_id: &str) -> Result<Option<Task>>;
    fn insert_task(&self, task: &Task) -> Result<()>;
    /// Must apply the whole list atomically.
    fn apply_task_changes(&self, changes: &[TaskChange]) -> Result<()>;
    /// Must delete and apply the compaction atomically.
    fn delete_task(&self, task_id: &str, compaction: &[TaskChange]) -> Result<()>;
    fn set_task_sprint(&self, task_id: &str, sprint_id: Option<&str>) -> Result<()>;
}

/// Sprint persistence seam.
pub trait SprintStore {
    fn sprints_for_team(&self, team_id: &str) -> Result<Vec<Sprint>>;
    fn get_sprint(&self, sprint_id: &str) -> Result<Option<Sprint>>;
    /// Returns whether a row was inserted (an existing window is skipped).
    fn insert_sprint(&self, sprint: &Sprint) -> Result<bool>;
    fn apply_sprint_changes(&self, changes: &[SprintStatusChange]) -> Result<()>;
    fn update_sprint(&self, sprint: &Sprint) -> Result<()>;
}

impl TaskStore for Database {
    fn tasks_for_team(&self, team_id: &str) -> Result<Vec<Task>> {
        Database::tasks_for_team(self, team_id)
    }
    fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        Database::get_task(self, task_id)
    }
    fn insert_task(&self, task: &Task) -> Result<()> {
        Database::insert_task(self, task)
    }
    fn apply_task_changes(&self, changes: &[TaskChange]) -> Result<()> {
        Database::apply_task_changes(self, changes)
    }
    fn delete_task(&self, task_id: &str, compaction: &[TaskChange]) -> Result<()> {
        Database::delete_task(self, task_id, compaction)
    }
    fn set_task_sprint(&self, task_id: &str, sprint_id: Option<&str>) -> Result<()> {
        Database::set_task_sprint(self, task_id, sprint_id)
    }
}

impl SprintStore for Database {
    fn sprints_for_team(&self, team_id: &str) -> Result<Vec<Sprint>> {
        Database::sprints_for_team(self, team_id)
    }
    fn get_sprint(&self, sprint_id: &str) -> Result<Option<Sprint>> {
        Database::get_sprint(self, sprint_id)
    }
    fn insert_sprint(&self, sprint: &Sprint) -> Result<bool> {
        Database::insert_sprint(self, sprint)
    }
    fn apply_sprint_changes(&self, changes: &[SprintStatusChange]) -> Result<()> {
        Database::apply_sprint_changes(self, changes)
    }
    fn update_sprint(&self, sprint: &Sprint) -> Result<()> {
        Database::update_sprint(self, sprint)
    }
}

/// Input for creating a task. The service assigns id, position, and
/// timestamps.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    /// Target column; the board's first column when `None`.
    pub status: Option<String>,
    pub sprint_id: Option<String>,
    pub assignee_id: Option<String>,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub estimated_effort: Option<f64>,
    pub due_date: Option<NaiveDate>,
}

/// Edits applied to an existing sprint. Fields left `None` keep their
/// current value. Status is never an input: it is re-derived after the
/// edit.
#[derive(Debug, Clone, Default)]
pub struct SprintEdit {
    pub name: Option<String>,
    pub goal: Option<Option<String>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Per-team board service over an injected store.
pub struct BoardService<S: TaskStore + SprintStore> {
    store: S,
    config: BoardConfig,
    reconciler: Reconciler,
    feed: SnapshotFeed,
    drag: DragSession,
}

impl<S: TaskStore + SprintStore> BoardService<S> {
    /// Build a service for one team, seeding the reconciler from the store.
    pub fn new(store: S, config: BoardConfig, team_id: &str) -> Result<Self> {
        let mut reconciler = Reconciler::new(team_id);
        let snapshot = TeamSnapshot {
            team_id: team_id.to_string(),
            tasks: store.tasks_for_team(team_id)?,
            sprints: store.sprints_for_team(team_id)?,
        };
        reconciler.ingest(snapshot);
        let feed = SnapshotFeed::new(reconciler.snapshot().clone());
        Ok(Self {
            store,
            config,
            reconciler,
            feed,
            drag: DragSession::new(),
        })
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn team_id(&self) -> &str {
        self.reconciler.team_id()
    }

    /// The current working (optimistic) snapshot.
    pub fn snapshot(&self) -> &TeamSnapshot {
        self.reconciler.snapshot()
    }

    /// Ids of locally-committed-but-unconfirmed operations.
    pub fn in_flight(&self) -> Vec<String> {
        self.reconciler.in_flight().iter().cloned().collect()
    }

    /// Subscribe to the reconciled snapshot feed.
    pub fn subscribe(&self) -> watch::Receiver<TeamSnapshot> {
        self.feed.subscribe()
    }

    /// Re-read the authoritative collections from the store, replacing any
    /// optimistic state. This is the poll half of the subscription feed.
    pub fn refresh_from_store(&mut self) -> Result<()> {
        let team_id = self.team_id().to_string();
        let snapshot = TeamSnapshot {
            team_id: team_id.clone(),
            tasks: self.store.tasks_for_team(&team_id)?,
            sprints: self.store.sprints_for_team(&team_id)?,
        };
        self.reconciler.ingest(snapshot);
        self.publish();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    /// Create a task, appended at the end of its column.
    pub fn add_task(&mut self, input: NewTask) -> Result<Task> {
        let status = input
            .status
            .unwrap_or_else(|| self.config.initial_column().to_string());
        if self.config.find_column(&status).is_none() {
            return Err(BoardError::InvalidDestination(format!(
                "unknown column '{status}'"
            )));
        }
        if let Some(ref sprint_id) = input.sprint_id {
            self.check_sprint_team(sprint_id)?;
        }

        let now = now_ms();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            description: input.description,
            status: status.clone(),
            position: ordering::plan_add(self.reconciler.tasks(), &status),
            team_id: self.team_id().to_string(),
            sprint_id: input.sprint_id,
            assignee_id: input.assignee_id,
            priority: input.priority,
            tags: input.tags,
            estimated_effort: input.estimated_effort,
            actual_effort: None,
            due_date: input.due_date,
            created_at: now,
            updated_at: now,
        };

        self.reconciler.upsert_task(task.clone());
        if let Err(err) = self.store.insert_task(&task) {
            warn!(task_id = %task.id, error = %err, "task insert failed; rolling back");
            self.reconciler.rollback();
            self.publish();
            return Err(err);
        }
        debug!(task_id = %task.id, status = %task.status, position = task.position, "task added");
        self.publish();
        Ok(task)
    }

    /// Move a task to a column at an index, enforcing the column's WIP
    /// limit for cross-column moves.
    pub fn move_task(
        &mut self,
        task_id: &str,
        dest_status: &str,
        dest_index: usize,
    ) -> Result<Vec<TaskChange>> {
        if self.config.find_column(dest_status).is_none() {
            return Err(BoardError::InvalidDestination(format!(
                "unknown column '{dest_status}'"
            )));
        }
        let changes = ordering::plan_move(
            self.reconciler.tasks(),
            task_id,
            dest_status,
            dest_index,
            self.config.wip_limit(dest_status),
        )?;
        self.commit_task_changes(changes)
    }

    /// Reorder a task within its own column.
    pub fn reorder_task(&mut self, task_id: &str, dest_index: usize) -> Result<Vec<TaskChange>> {
        let changes = ordering::plan_reorder(self.reconciler.tasks(), task_id, dest_index)?;
        self.commit_task_changes(changes)
    }

    /// Delete a task and close the gap in its group.
    pub fn remove_task(&mut self, task_id: &str) -> Result<()> {
        let compaction = ordering::plan_remove(self.reconciler.tasks(), task_id)?;
        self.reconciler.remove_task(task_id, &compaction);
        if let Err(err) = self.store.delete_task(task_id, &compaction) {
            warn!(task_id, error = %err, "task delete failed; rolling back");
            self.reconciler.rollback();
            self.publish();
            return Err(err);
        }
        debug!(task_id, shifted = compaction.len(), "task removed");
        self.publish();
        Ok(())
    }

    /// Point a task at a sprint of the same team, or clear the reference.
    pub fn assign_sprint(&mut self, task_id: &str, sprint_id: Option<&str>) -> Result<()> {
        let mut task = self
            .reconciler
            .tasks()
            .iter()
            .find(|t| t.id == task_id)
            .cloned()
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;
        if let Some(sprint_id) = sprint_id {
            self.check_sprint_team(sprint_id)?;
        }

        task.sprint_id = sprint_id.map(str::to_string);
        self.reconciler.upsert_task(task);
        if let Err(err) = self.store.set_task_sprint(task_id, sprint_id) {
            warn!(task_id, error = %err, "sprint assignment failed; rolling back");
            self.reconciler.rollback();
            self.publish();
            return Err(err);
        }
        self.publish();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Sprints
    // ------------------------------------------------------------------

    /// Generate the sprint windows for a year. Existing windows are kept;
    /// re-running is idempotent.
    pub fn generate_sprints(
        &mut self,
        reference_year: i32,
        duration_weeks: Option<u32>,
    ) -> Result<Vec<Sprint>> {
        let weeks = duration_weeks.unwrap_or(self.config.sprint.duration_weeks);
        let team_id = self.team_id().to_string();
        let generated =
            sprints::generate_sprints(self.reconciler.sprints(), &team_id, reference_year, weeks);

        let mut created = Vec::new();
        for sprint in generated {
            if self.store.insert_sprint(&sprint)? {
                self.reconciler.upsert_sprint(sprint.clone());
                created.push(sprint);
            }
        }
        info!(
            %team_id,
            reference_year,
            weeks,
            created = created.len(),
            "sprint generation run"
        );
        self.publish();
        Ok(created)
    }

    /// Derive every sprint's status from `today` and persist the diffs.
    pub fn refresh_sprint_statuses(&mut self, today: NaiveDate) -> Result<Vec<SprintStatusChange>> {
        let changes = sprints::refresh_statuses(self.reconciler.sprints(), today);
        if changes.is_empty() {
            return Ok(changes);
        }
        self.reconciler.apply_sprint_changes(&changes);
        if let Err(err) = self.store.apply_sprint_changes(&changes) {
            warn!(error = %err, "sprint status refresh failed; rolling back");
            self.reconciler.rollback();
            self.publish();
            return Err(err);
        }
        debug!(updated = changes.len(), "sprint statuses refreshed");
        self.publish();
        Ok(changes)
    }

    /// The sprint a board should select by default.
    pub fn default_sprint(&self, today: NaiveDate) -> Option<Sprint> {
        sprints::select_default_active(self.reconciler.sprints(), today).cloned()
    }

    /// Edit a sprint's name/goal/dates. Status is re-derived from `today`
    /// as part of the edit; position is never changed.
    pub fn edit_sprint(
        &mut self,
        sprint_id: &str,
        edit: SprintEdit,
        today: NaiveDate,
    ) -> Result<Sprint> {
        let mut sprint = self
            .reconciler
            .sprints()
            .iter()
            .find(|s| s.id == sprint_id)
            .cloned()
            .ok_or_else(|| BoardError::SprintNotFound(sprint_id.to_string()))?;

        if let Some(name) = edit.name {
            sprint.name = name;
        }
        if let Some(goal) = edit.goal {
            sprint.goal = goal;
        }
        if let Some(start) = edit.start_date {
            sprint.start_date = start;
        }
        if let Some(end) = edit.end_date {
            sprint.end_date = end;
        }
        sprint.status = sprints::compute_status(&sprint, today);

        self.reconciler.upsert_sprint(sprint.clone());
        if let Err(err) = self.store.update_sprint(&sprint) {
            warn!(sprint_id, error = %err, "sprint edit failed; rolling back");
            self.reconciler.rollback();
            self.publish();
            return Err(err);
        }
        self.publish();
        Ok(sprint)
    }

    // ------------------------------------------------------------------
    // Drag session
    // ------------------------------------------------------------------

    /// `begin` command of the drag session.
    pub fn drag_begin(&mut self, task_id: &str) -> Result<()> {
        self.drag.begin(self.reconciler.tasks(), task_id)
    }

    /// `move` command: record the hovered target without mutating anything.
    pub fn drag_update(&mut self, target: DragTarget) {
        self.drag.update(target);
    }

    /// `cancel` command: discard the session.
    pub fn drag_cancel(&mut self) {
        self.drag.cancel();
    }

    /// `end` command: plan exactly one move and commit it atomically. An
    /// empty result means the drop resolved to a no-op or cancelled.
    pub fn drag_end(&mut self) -> Result<Vec<TaskChange>> {
        // The session borrows the task slice only for planning, so take the
        // session out before committing through &mut self.
        let mut session = std::mem::take(&mut self.drag);
        let outcome = session.end(self.reconciler.tasks(), &self.config);
        self.drag = session;
        let changes = outcome?;
        self.commit_task_changes(changes)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    // ------------------------------------------------------------------

    fn commit_task_changes(&mut self, changes: Vec<TaskChange>) -> Result<Vec<TaskChange>> {
        if changes.is_empty() {
            return Ok(changes);
        }
        self.reconciler.apply_task_changes(&changes);
        if let Err(err) = self.store.apply_task_changes(&changes) {
            warn!(error = %err, "task change commit failed; rolling back");
            self.reconciler.rollback();
            self.publish();
            return Err(err);
        }
        debug!(applied = changes.len(), "task changes committed");
        self.publish();
        Ok(changes)
    }

    fn check_sprint_team(&self, sprint_id: &str) -> Result<()> {
        let sprint = self
            .reconciler
            .sprints()
            .iter()
            .find(|s| s.id == sprint_id)
            .cloned()
            .map(Ok)
            .unwrap_or_else(|| {
                self.store
                    .get_sprint(sprint_id)?
                    .ok_or_else(|| BoardError::SprintNotFound(sprint_id.to_string()))
            })?;
        if sprint.team_id != self.team_id() {
            return Err(BoardError::TeamMismatch {
                sprint_id: sprint_id.to_string(),
                sprint_team: sprint.team_id,
                task_team: self.team_id().to_string(),
            });
        }
        Ok(())
    }

    fn publish(&self) {
        self.feed.publish(self.reconciler.snapshot().clone());
    }
}
