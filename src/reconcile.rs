//! Lazy overdue reconciliation.
//!
//! Nothing runs on a timer. Every read path that hands tasks or events to a
//! caller first issues one conditional update that moves stale rows into
//! their overdue state. The update predicate excludes rows that are already
//! settled, so repeated or racing calls are harmless, and no path ever
//! clears an overdue flag or reopens a done task.

use crate::error::{StoreError, StoreResult};
use crate::patch::{EventPatch, TaskPatch};
use crate::store::{EventFilter, RecordStore, TaskFilter};
use crate::types::{EventId, SpaceId, TaskId, TaskStatus, Timestamp};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Statuses the reconciler never rewrites.
const SETTLED: [TaskStatus; 2] = [TaskStatus::Done, TaskStatus::Overdue];

/// Mark every open task in `space_ids` whose deadline has passed as overdue.
/// Returns the number of tasks moved.
pub fn reconcile_tasks<S: RecordStore + ?Sized>(
    store: &S,
    space_ids: &[SpaceId],
    now: Timestamp,
) -> StoreResult<usize> {
    if space_ids.is_empty() {
        return Ok(0);
    }
    let filter = TaskFilter::in_spaces(space_ids)
        .deadline_before(now)
        .status_not_in(&SETTLED);
    let moved = store.update_tasks(&filter, &TaskPatch::mark_overdue())?;
    debug!(spaces = space_ids.len(), moved, "reconciled tasks");
    Ok(moved)
}

/// Single-task form of [`reconcile_tasks`], used by detail reads.
pub fn reconcile_task_by_id<S: RecordStore + ?Sized>(
    store: &S,
    id: TaskId,
    now: Timestamp,
) -> StoreResult<usize> {
    let filter = TaskFilter::by_id(id)
        .deadline_before(now)
        .status_not_in(&SETTLED);
    let moved = store.update_tasks(&filter, &TaskPatch::mark_overdue())?;
    debug!(task_id = id, moved, "reconciled task");
    Ok(moved)
}

/// Flag every event in `space_ids` dated before `now` as overdue.
/// Returns the number of events flagged.
pub fn reconcile_events<S: RecordStore + ?Sized>(
    store: &S,
    space_ids: &[SpaceId],
    now: Timestamp,
) -> StoreResult<usize> {
    if space_ids.is_empty() {
        return Ok(0);
    }
    let filter = EventFilter::in_spaces(space_ids)
        .date_before(now)
        .overdue(false);
    let flagged = store.update_events(&filter, &EventPatch::mark_overdue())?;
    debug!(spaces = space_ids.len(), flagged, "reconciled events");
    Ok(flagged)
}

/// Single-event form of [`reconcile_events`].
pub fn reconcile_event_by_id<S: RecordStore + ?Sized>(
    store: &S,
    id: EventId,
    now: Timestamp,
) -> StoreResult<usize> {
    let filter = EventFilter::by_id(id).date_before(now).overdue(false);
    let flagged = store.update_events(&filter, &EventPatch::mark_overdue())?;
    debug!(event_id = id, flagged, "reconciled event");
    Ok(flagged)
}

/// Which table a reconciliation pass targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileTarget {
    Tasks,
    Events,
}

impl fmt::Display for ReconcileTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileTarget::Tasks => f.write_str("tasks"),
            ReconcileTarget::Events => f.write_str("events"),
        }
    }
}

/// A reconciliation failure demoted to a warning. The read it preceded
/// still went ahead, so the caller may be looking at stale overdue state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileWarning {
    pub target: ReconcileTarget,
    pub message: String,
}

impl fmt::Display for ReconcileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not refresh overdue {}: {}",
            self.target, self.message
        )
    }
}

/// Swallow a reconciliation error, logging it and returning it as a warning.
pub fn soften(target: ReconcileTarget, result: StoreResult<usize>) -> Option<ReconcileWarning> {
    match result {
        Ok(_) => None,
        Err(err) => Some(warning(target, &err)),
    }
}

fn warning(target: ReconcileTarget, err: &StoreError) -> ReconcileWarning {
    warn!(%target, error = %err, "overdue reconciliation failed; serving stale data");
    ReconcileWarning {
        target,
        message: err.to_string(),
    }
}
