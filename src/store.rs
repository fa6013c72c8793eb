//! The record store gateway seam.
//!
//! The board only ever issues predicate-scoped selects and conditional
//! updates against spaces, tasks and events. [`RecordStore`] names exactly
//! those calls so the reconciler and the board can run against any backend;
//! [`crate::db::Database`] is the SQLite implementation.

use crate::error::StoreResult;
use crate::patch::{EventPatch, TaskPatch};
use crate::types::{Event, EventId, Space, SpaceId, Task, TaskId, TaskStatus, Timestamp};

/// Predicate over spaces. All set fields combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpaceFilter {
    pub ids: Option<Vec<SpaceId>>,
    pub owner_id: Option<String>,
}

impl SpaceFilter {
    pub fn by_ids(ids: &[SpaceId]) -> Self {
        Self {
            ids: Some(ids.to_vec()),
            ..Self::default()
        }
    }

    pub fn by_owner(owner_id: &str) -> Self {
        Self {
            owner_id: Some(owner_id.to_string()),
            ..Self::default()
        }
    }
}

/// Predicate over tasks. All set fields combine with AND.
///
/// An empty `space_ids` list matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub space_ids: Option<Vec<SpaceId>>,
    pub id: Option<TaskId>,
    /// Matches tasks with a non-null deadline strictly before this instant.
    pub deadline_before: Option<Timestamp>,
    pub status_not_in: Vec<TaskStatus>,
}

impl TaskFilter {
    pub fn in_spaces(space_ids: &[SpaceId]) -> Self {
        Self {
            space_ids: Some(space_ids.to_vec()),
            ..Self::default()
        }
    }

    pub fn by_id(id: TaskId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn deadline_before(mut self, instant: Timestamp) -> Self {
        self.deadline_before = Some(instant);
        self
    }

    pub fn status_not_in(mut self, statuses: &[TaskStatus]) -> Self {
        self.status_not_in = statuses.to_vec();
        self
    }

    /// Evaluate the predicate against an in-memory task.
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(ref ids) = self.space_ids {
            if !ids.contains(&task.space_id) {
                return false;
            }
        }
        if let Some(id) = self.id {
            if task.id != id {
                return false;
            }
        }
        if let Some(instant) = self.deadline_before {
            if !task.deadline.is_some_and(|d| d < instant) {
                return false;
            }
        }
        !self.status_not_in.contains(&task.status)
    }
}

/// Predicate over events. All set fields combine with AND.
///
/// An empty `space_ids` list matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub space_ids: Option<Vec<SpaceId>>,
    pub id: Option<EventId>,
    /// Matches events dated strictly before this instant.
    pub date_before: Option<Timestamp>,
    pub overdue: Option<bool>,
}

impl EventFilter {
    pub fn in_spaces(space_ids: &[SpaceId]) -> Self {
        Self {
            space_ids: Some(space_ids.to_vec()),
            ..Self::default()
        }
    }

    pub fn by_id(id: EventId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn date_before(mut self, instant: Timestamp) -> Self {
        self.date_before = Some(instant);
        self
    }

    pub fn overdue(mut self, overdue: bool) -> Self {
        self.overdue = Some(overdue);
        self
    }

    /// Evaluate the predicate against an in-memory event.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(ref ids) = self.space_ids {
            if !ids.contains(&event.space_id) {
                return false;
            }
        }
        if let Some(id) = self.id {
            if event.id != id {
                return false;
            }
        }
        if let Some(instant) = self.date_before {
            if event.date >= instant {
                return false;
            }
        }
        match self.overdue {
            Some(flag) => event.overdue == flag,
            None => true,
        }
    }
}

/// Single-field ordering for task selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskOrder {
    /// Newest first.
    #[default]
    CreatedDesc,
    CreatedAsc,
}

impl TaskOrder {
    pub(crate) const fn sql_clause(self) -> &'static str {
        match self {
            TaskOrder::CreatedDesc => "ORDER BY created_at DESC, id DESC",
            TaskOrder::CreatedAsc => "ORDER BY created_at ASC, id ASC",
        }
    }
}

/// Single-field ordering for event selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventOrder {
    /// Soonest first.
    #[default]
    DateAsc,
    DateDesc,
    CreatedDesc,
}

impl EventOrder {
    pub(crate) const fn sql_clause(self) -> &'static str {
        match self {
            EventOrder::DateAsc => "ORDER BY date ASC, id ASC",
            EventOrder::DateDesc => "ORDER BY date DESC, id DESC",
            EventOrder::CreatedDesc => "ORDER BY created_at DESC, id DESC",
        }
    }
}

/// Predicate-based reads and conditional writes against the record store.
///
/// Each call is one blocking round-trip. Implementations must be shareable
/// across threads: task and event reconciliation may run concurrently.
pub trait RecordStore: Send + Sync {
    fn select_spaces(&self, filter: &SpaceFilter) -> StoreResult<Vec<Space>>;

    fn select_tasks(&self, filter: &TaskFilter, order: TaskOrder) -> StoreResult<Vec<Task>>;

    fn select_events(&self, filter: &EventFilter, order: EventOrder) -> StoreResult<Vec<Event>>;

    /// Apply `patch` to every task matching `filter`; returns the affected count.
    fn update_tasks(&self, filter: &TaskFilter, patch: &TaskPatch) -> StoreResult<usize>;

    /// Apply `patch` to every event matching `filter`; returns the affected count.
    fn update_events(&self, filter: &EventFilter, patch: &EventPatch) -> StoreResult<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(status: TaskStatus, deadline: Option<Timestamp>) -> Task {
        Task {
            id: 1,
            space_id: 10,
            name: "t".into(),
            description: None,
            status,
            priority: None,
            deadline,
            created_at: 0,
        }
    }

    #[test]
    fn overdue_predicate_skips_settled_and_undated_tasks() {
        let filter = TaskFilter::in_spaces(&[10])
            .deadline_before(100)
            .status_not_in(&[TaskStatus::Done, TaskStatus::Overdue]);

        assert!(filter.matches(&task(TaskStatus::ToDo, Some(50))));
        assert!(filter.matches(&task(TaskStatus::InProgress, Some(99))));
        assert!(!filter.matches(&task(TaskStatus::ToDo, Some(100))));
        assert!(!filter.matches(&task(TaskStatus::ToDo, None)));
        assert!(!filter.matches(&task(TaskStatus::Done, Some(50))));
        assert!(!filter.matches(&task(TaskStatus::Overdue, Some(50))));
    }

    #[test]
    fn empty_space_set_matches_nothing() {
        let filter = TaskFilter::in_spaces(&[]);
        assert!(!filter.matches(&task(TaskStatus::ToDo, None)));
    }
}
