//! Partial updates and the dirty-diff builders that produce them.
//!
//! Edit forms hold a draft of the whole record; saving sends only the fields
//! that differ from what was loaded. Nullable fields use `Option<Option<T>>`:
//! the outer `None` means "unchanged", `Some(None)` clears the column.

use crate::error::InputError;
use crate::types::{Event, Priority, Space, Task, TaskStatus, Timestamp};
use serde::{Deserialize, Serialize};

/// Trim a record name, rejecting blanks.
pub fn normalize_name(name: &str) -> Result<String, InputError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(InputError::missing("name"));
    }
    Ok(trimmed.to_string())
}

/// Trim a description; blank text is stored as null.
pub fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

/// Changed fields of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Option<Priority>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Option<Timestamp>>,
}

impl TaskPatch {
    /// The reconciler's only write.
    pub fn mark_overdue() -> Self {
        Self {
            status: Some(TaskStatus::Overdue),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.deadline.is_none()
    }

    /// Build a patch holding only what `draft` changes relative to `task`.
    pub fn diff(task: &Task, draft: &TaskDraft) -> Result<Self, InputError> {
        let name = normalize_name(&draft.name)?;
        let description = normalize_description(draft.description.as_deref());

        let mut patch = Self::default();
        if name != task.name {
            patch.name = Some(name);
        }
        if description != task.description {
            patch.description = Some(description);
        }
        if draft.status != task.status {
            if draft.status == TaskStatus::Overdue {
                return Err(InputError::derived("status"));
            }
            patch.status = Some(draft.status);
        }
        if draft.priority != task.priority {
            patch.priority = Some(draft.priority);
        }
        if draft.deadline != task.deadline {
            patch.deadline = Some(draft.deadline);
        }
        Ok(patch)
    }
}

/// Edit-form state for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub name: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Option<Priority>,
    pub deadline: Option<Timestamp>,
}

impl From<&Task> for TaskDraft {
    fn from(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
            deadline: task.deadline,
        }
    }
}

/// Changed fields of an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Option<Priority>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overdue: Option<bool>,
}

impl EventPatch {
    pub fn mark_overdue() -> Self {
        Self {
            overdue: Some(true),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.priority.is_none()
            && self.overdue.is_none()
    }

    /// Build a patch holding only what `draft` changes relative to `event`.
    ///
    /// The overdue flag is never part of an edit.
    pub fn diff(event: &Event, draft: &EventDraft) -> Result<Self, InputError> {
        let name = normalize_name(&draft.name)?;
        let description = normalize_description(draft.description.as_deref());

        let mut patch = Self::default();
        if name != event.name {
            patch.name = Some(name);
        }
        if description != event.description {
            patch.description = Some(description);
        }
        if draft.date != event.date {
            patch.date = Some(draft.date);
        }
        if draft.priority != event.priority {
            patch.priority = Some(draft.priority);
        }
        Ok(patch)
    }
}

/// Edit-form state for an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub name: String,
    pub description: Option<String>,
    pub date: Timestamp,
    pub priority: Option<Priority>,
}

impl From<&Event> for EventDraft {
    fn from(event: &Event) -> Self {
        Self {
            name: event.name.clone(),
            description: event.description.clone(),
            date: event.date,
            priority: event.priority,
        }
    }
}

/// Changed fields of a space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpacePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
}

impl SpacePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }

    pub fn diff(space: &Space, draft: &SpaceDraft) -> Result<Self, InputError> {
        let name = normalize_name(&draft.name)?;
        let description = normalize_description(draft.description.as_deref());

        let mut patch = Self::default();
        if name != space.name {
            patch.name = Some(name);
        }
        if description != space.description {
            patch.description = Some(description);
        }
        Ok(patch)
    }
}

/// Edit-form state for a space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceDraft {
    pub name: String,
    pub description: Option<String>,
}

impl From<&Space> for SpaceDraft {
    fn from(space: &Space) -> Self {
        Self {
            name: space.name.clone(),
            description: space.description.clone(),
        }
    }
}
