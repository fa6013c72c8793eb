//! Core record types for spaces, tasks and events.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type SpaceId = i64;
pub type TaskId = i64;
pub type EventId = i64;

/// UTC timestamp in epoch milliseconds.
pub type Timestamp = i64;

/// A user-owned container of tasks and events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub id: SpaceId,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

/// Task lifecycle state.
///
/// `Overdue` is only ever entered through the reconciler as time passes;
/// `Done` is never forced back to `Overdue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "to-do")]
    ToDo,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "done")]
    Done,
    #[serde(rename = "overdue")]
    Overdue,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::ToDo,
        TaskStatus::InProgress,
        TaskStatus::Done,
        TaskStatus::Overdue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "to-do",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
            TaskStatus::Overdue => "overdue",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "to-do" => Some(TaskStatus::ToDo),
            "in-progress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            "overdue" => Some(TaskStatus::Overdue),
            _ => None,
        }
    }

    /// Settled states are left untouched by the reconciler.
    pub fn is_settled(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Overdue)
    }

    /// Bucket order used on the space detail view:
    /// overdue < in-progress < to-do < done.
    pub fn bucket_rank(&self) -> u8 {
        match self {
            TaskStatus::Overdue => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::ToDo => 2,
            TaskStatus::Done => 3,
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::ToDo
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority shared by tasks and events.
///
/// A missing priority ranks the same as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    None,
    Low,
    Medium,
    High,
    #[serde(alias = "imidiate")]
    Immediate,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::None => "none",
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Immediate => "immediate",
        }
    }

    /// Parse a stored or user-supplied priority.
    /// Legacy rows spell the top level `imidiate`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Priority::None),
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "immediate" | "imidiate" => Some(Priority::Immediate),
            _ => None,
        }
    }

    pub fn rank(&self) -> u8 {
        match self {
            Priority::None => 0,
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Immediate => 4,
        }
    }

    /// Rank of a nullable priority; null ranks with `None`.
    pub fn rank_of(priority: Option<Priority>) -> u8 {
        priority.map(|p| p.rank()).unwrap_or(0)
    }

    /// Categorical value used by filters: null reads as `None`.
    pub fn or_none(priority: Option<Priority>) -> Priority {
        priority.unwrap_or(Priority::None)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work inside a space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub space_id: SpaceId,
    pub name: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Option<Priority>,
    pub deadline: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Task {
    /// Whether the reconciler would move this task to `Overdue` at `now`.
    pub fn is_stale(&self, now: Timestamp) -> bool {
        !self.status.is_settled() && self.deadline.is_some_and(|d| d < now)
    }
}

/// A dated calendar entry inside a space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub space_id: SpaceId,
    pub name: String,
    pub description: Option<String>,
    pub date: Timestamp,
    pub priority: Option<Priority>,
    pub overdue: bool,
    pub created_at: Timestamp,
}

impl Event {
    /// Whether the reconciler would flag this event as overdue at `now`.
    pub fn is_stale(&self, now: Timestamp) -> bool {
        !self.overdue && self.date < now
    }

    pub fn is_upcoming(&self, now: Timestamp) -> bool {
        self.date >= now
    }
}

/// Input for creating a space.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSpace {
    pub name: String,
    pub description: Option<String>,
}

/// Input for creating a task. Status defaults to `to-do`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub space_id: SpaceId,
    pub name: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub deadline: Option<Timestamp>,
}

/// Input for creating an event. Events start out not overdue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub space_id: SpaceId,
    pub name: String,
    pub description: Option<String>,
    pub date: Timestamp,
    pub priority: Option<Priority>,
}

/// Per-status task counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    #[serde(rename = "to-do")]
    pub to_do: usize,
    #[serde(rename = "in-progress")]
    pub in_progress: usize,
    pub done: usize,
    pub overdue: usize,
}

impl StatusCounts {
    pub fn get(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::ToDo => self.to_do,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Done => self.done,
            TaskStatus::Overdue => self.overdue,
        }
    }

    pub fn bump(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::ToDo => self.to_do += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Done => self.done += 1,
            TaskStatus::Overdue => self.overdue += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_rank_is_total() {
        let ordered = [
            Priority::None,
            Priority::Low,
            Priority::Medium,
            Priority::High,
            Priority::Immediate,
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
        }
        assert_eq!(Priority::rank_of(None), Priority::None.rank());
    }

    #[test]
    fn priority_accepts_legacy_spelling() {
        assert_eq!(Priority::parse("imidiate"), Some(Priority::Immediate));
        assert_eq!(Priority::parse("immediate"), Some(Priority::Immediate));
        assert_eq!(Priority::parse("urgent"), None);
        let parsed: Priority = serde_json::from_str("\"imidiate\"").unwrap();
        assert_eq!(parsed, Priority::Immediate);
    }

    #[test]
    fn status_round_trips_through_wire_names() {
        for status in TaskStatus::ALL {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
    }

    #[test]
    fn done_task_is_never_stale() {
        let task = Task {
            id: 1,
            space_id: 1,
            name: "ship".into(),
            description: None,
            status: TaskStatus::Done,
            priority: None,
            deadline: Some(0),
            created_at: 0,
        };
        assert!(!task.is_stale(1_000));
        let open = Task {
            status: TaskStatus::ToDo,
            ..task
        };
        assert!(open.is_stale(1_000));
        assert!(!open.is_stale(0));
    }
}
