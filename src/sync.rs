//! Snapshot reconciliation between optimistic local state and the
//! authoritative persistence feed.
//!
//! The persistence collaborator delivers full-collection snapshots per
//! team. Local mutations are applied optimistically to a working copy and
//! their ids marked in-flight; the next snapshot replaces local state
//! entirely (last full snapshot wins — no field-level merge), superseding
//! anything still in flight. If a persistence call fails before the next
//! snapshot arrives, `rollback` restores the last confirmed state.

use crate::types::{Sprint, SprintStatusChange, Task, TaskChange, TeamSnapshot};
use crate::ordering;
use std::collections::HashSet;
use tokio::sync::watch;

/// Local reconciliation state for one team's board.
#[derive(Debug)]
pub struct Reconciler {
    /// Last authoritative snapshot.
    confirmed: TeamSnapshot,
    /// Confirmed state plus optimistic mutations.
    working: TeamSnapshot,
    /// Ids of locally-committed-but-unconfirmed records.
    in_flight: HashSet<String>,
}

impl Reconciler {
    pub fn new(team_id: impl Into<String>) -> Self {
        let empty = TeamSnapshot {
            team_id: team_id.into(),
            ..TeamSnapshot::default()
        };
        Self {
            confirmed: empty.clone(),
            working: empty,
            in_flight: HashSet::new(),
        }
    }

    /// Replace local state with an authoritative snapshot.
    ///
    /// Tasks are ordered by position within their group and sprints by
    /// start date before the replace. Every in-flight id is cleared: a
    /// full-replace snapshot supersedes whatever the id was waiting on.
    pub fn ingest(&mut self, mut snapshot: TeamSnapshot) {
        snapshot.tasks.sort_by(|a, b| {
            a.status
                .cmp(&b.status)
                .then(a.position.cmp(&b.position))
                .then_with(|| a.id.cmp(&b.id))
        });
        snapshot.sprints.sort_by_key(|s| s.start_date);
        self.confirmed = snapshot.clone();
        self.working = snapshot;
        self.in_flight.clear();
    }

    /// Restore the working copy to the last confirmed snapshot. Called when
    /// the originating persistence call reported failure before the next
    /// snapshot arrived.
    pub fn rollback(&mut self) {
        self.working = self.confirmed.clone();
        self.in_flight.clear();
    }

    /// Apply an ordering-engine change list optimistically.
    pub fn apply_task_changes(&mut self, changes: &[TaskChange]) {
        ordering::apply_changes(&mut self.working.tasks, changes);
        for change in changes {
            self.in_flight.insert(change.id.clone());
        }
    }

    /// Insert or replace a task optimistically.
    pub fn upsert_task(&mut self, task: Task) {
        self.in_flight.insert(task.id.clone());
        if let Some(existing) = self.working.tasks.iter_mut().find(|t| t.id == task.id) {
            *existing = task;
        } else {
            self.working.tasks.push(task);
        }
    }

    /// Remove a task optimistically, applying the compaction change list in
    /// the same step.
    pub fn remove_task(&mut self, task_id: &str, compaction: &[TaskChange]) {
        self.working.tasks.retain(|t| t.id != task_id);
        self.apply_task_changes(compaction);
        self.in_flight.insert(task_id.to_string());
    }

    /// Insert or replace a sprint optimistically.
    pub fn upsert_sprint(&mut self, sprint: Sprint) {
        self.in_flight.insert(sprint.id.clone());
        if let Some(existing) = self.working.sprints.iter_mut().find(|s| s.id == sprint.id) {
            *existing = sprint;
        } else {
            self.working.sprints.push(sprint);
        }
    }

    /// Apply derived sprint status transitions optimistically.
    pub fn apply_sprint_changes(&mut self, changes: &[SprintStatusChange]) {
        for change in changes {
            if let Some(sprint) = self.working.sprints.iter_mut().find(|s| s.id == change.id) {
                sprint.status = change.status;
            }
            self.in_flight.insert(change.id.clone());
        }
    }

    pub fn team_id(&self) -> &str {
        &self.working.team_id
    }

    /// The working (optimistic) view.
    pub fn tasks(&self) -> &[Task] {
        &self.working.tasks
    }

    pub fn sprints(&self) -> &[Sprint] {
        &self.working.sprints
    }

    pub fn snapshot(&self) -> &TeamSnapshot {
        &self.working
    }

    /// Ids of unconfirmed local mutations.
    pub fn in_flight(&self) -> &HashSet<String> {
        &self.in_flight
    }

    pub fn is_in_flight(&self, id: &str) -> bool {
        self.in_flight.contains(id)
    }
}

/// Broadcast feed of reconciled snapshots.
///
/// Receivers can poll synchronously with `borrow` or await `changed` on an
/// async runtime; either way they always observe the latest full snapshot.
#[derive(Debug)]
pub struct SnapshotFeed {
    tx: watch::Sender<TeamSnapshot>,
}

impl SnapshotFeed {
    pub fn new(initial: TeamSnapshot) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn publish(&self, snapshot: TeamSnapshot) {
        // Send only fails with no receivers; the next subscriber will still
        // see the stored value.
        let _ = self.tx.send(snapshot);
    }

    pub fn subscribe(&self) -> watch::Receiver<TeamSnapshot> {
        self.tx.subscribe()
    }
}
