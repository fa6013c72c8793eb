//! Cross-entity dashboard aggregation.
//!
//! Every function here is a pure computation over already reconciled
//! snapshots. Run reconciliation first, or tasks that are about to expire
//! are counted as still open.

use crate::types::{Event, StatusCounts, Task, Timestamp};
use serde::Serialize;

/// Headline counts for the dashboard cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_tasks: usize,
    pub tasks_by_status: StatusCounts,
    /// Events dated at or after `now`.
    pub upcoming_events: usize,
}

/// Count tasks per status and events still ahead of `now`.
pub fn summarize(tasks: &[Task], events: &[Event], now: Timestamp) -> Summary {
    let mut tasks_by_status = StatusCounts::default();
    for task in tasks {
        tasks_by_status.bump(task.status);
    }

    Summary {
        total_tasks: tasks.len(),
        tasks_by_status,
        upcoming_events: events.iter().filter(|e| e.is_upcoming(now)).count(),
    }
}

/// The newest `limit` tasks, by creation time.
pub fn recent_tasks(tasks: &[Task], limit: usize) -> Vec<Task> {
    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.into_iter().take(limit).cloned().collect()
}

/// The next `limit` events at or after `now`, soonest first.
pub fn upcoming_events(events: &[Event], now: Timestamp, limit: usize) -> Vec<Event> {
    let mut upcoming: Vec<&Event> = events.iter().filter(|e| e.is_upcoming(now)).collect();
    upcoming.sort_by_key(|e| e.date);
    upcoming.into_iter().take(limit).cloned().collect()
}

/// Everything the dashboard page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub summary: Summary,
    pub recent_tasks: Vec<Task>,
    pub upcoming_events: Vec<Event>,
}
