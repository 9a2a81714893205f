//! Drag session controller.
//!
//! A small state machine (`Idle` / `Dragging`) that turns discrete
//! begin/move/end/cancel commands into exactly one ordering-engine call per
//! completed session. The commands can come from pointer events, keyboard
//! events, or a test harness; the controller never mutates the board model
//! itself, it only returns the planned change list at drop time.

use crate::board::BoardView;
use crate::config::BoardConfig;
use crate::error::{BoardError, Result};
use crate::ordering;
use crate::types::{Task, TaskChange};

/// What the pointer (or keyboard focus) is currently over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragTarget {
    /// Hovering another card: the drop takes that card's slot.
    Task { task_id: String },
    /// Hovering a column's empty area: the drop appends to the column.
    Column { status: String },
}

#[derive(Debug, Clone)]
struct ActiveDrag {
    task_id: String,
    source_status: String,
    source_index: usize,
    hover: Option<DragTarget>,
}

/// One drag session per board instance.
#[derive(Debug, Default)]
pub struct DragSession {
    active: Option<ActiveDrag>,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// The id of the card being dragged, if a session is active.
    pub fn active_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.task_id.as_str())
    }

    /// Start a session for `task_id`, capturing its source column and index.
    ///
    /// A pointer-down while a session is active means the previous session
    /// went stale; it is discarded and the new one starts.
    pub fn begin(&mut self, tasks: &[Task], task_id: &str) -> Result<()> {
        let view = BoardView::new(tasks);
        let (status, index) = view
            .locate(task_id)
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;
        self.active = Some(ActiveDrag {
            task_id: task_id.to_string(),
            source_status: status.to_string(),
            source_index: index,
            hover: Some(DragTarget::Task {
                task_id: task_id.to_string(),
            }),
        });
        Ok(())
    }

    /// Record the currently hovered target. Does not mutate the board.
    /// Ignored when no session is active.
    pub fn update(&mut self, target: DragTarget) {
        if let Some(active) = self.active.as_mut() {
            active.hover = Some(target);
        }
    }

    /// Discard the session without any engine call.
    pub fn cancel(&mut self) {
        self.active = None;
    }

    /// Finish the session: resolve the final destination and plan the move.
    ///
    /// Returns the change list to commit atomically; an empty list means
    /// the session resolved to a no-op or was cancelled (unknown container,
    /// no session, out-of-bounds resolution). `LimitExceeded` propagates so
    /// the caller can surface feedback. The session always ends.
    pub fn end(&mut self, tasks: &[Task], config: &BoardConfig) -> Result<Vec<TaskChange>> {
        let Some(active) = self.active.take() else {
            return Ok(Vec::new());
        };

        let Some((dest_status, dest_index)) = resolve_destination(&active, tasks, config) else {
            return Ok(Vec::new());
        };

        match ordering::plan_move(
            tasks,
            &active.task_id,
            &dest_status,
            dest_index,
            config.wip_limit(&dest_status),
        ) {
            Ok(changes) => Ok(changes),
            // An invalid resolved target corrupts nothing: treat as cancel.
            Err(BoardError::InvalidDestination(_)) => Ok(Vec::new()),
            Err(other) => Err(other),
        }
    }
}

/// Resolve the hovered target into a destination column and insertion
/// index (post-removal indexing, as the ordering engine expects).
/// `None` means the target is unknown and the drop must cancel.
fn resolve_destination(
    active: &ActiveDrag,
    tasks: &[Task],
    config: &BoardConfig,
) -> Option<(String, usize)> {
    let view = BoardView::new(tasks);
    // The session can go stale mid-drag: the dragged task may have been
    // removed locally or superseded by a snapshot. Nothing left to drop.
    view.locate(&active.task_id)?;
    match active.hover.as_ref()? {
        DragTarget::Task { task_id } => {
            if *task_id == active.task_id {
                // Dropped on itself: back to the source slot.
                return Some((active.source_status.clone(), active.source_index));
            }
            let (status, _) = view.locate(task_id)?;
            config.find_column(status)?;
            let index = view
                .column(status)
                .iter()
                .filter(|t| t.id != active.task_id)
                .position(|t| t.id == *task_id)?;
            Some((status.to_string(), index))
        }
        DragTarget::Column { status } => {
            config.find_column(status)?;
            // Post-removal length: the dragged task may or may not still
            // sit in this column, so count it out instead of subtracting.
            let len = view
                .column(status)
                .iter()
                .filter(|t| t.id != active.task_id)
                .count();
            Some((status.clone(), len))
        }
    }
}
