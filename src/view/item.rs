//! Field accessors that let one projection pipeline serve tasks and events.

use super::spec::Entity;
use crate::types::{Event, Priority, SpaceId, Task, TaskStatus, Timestamp};

/// A record the view engine can filter, sort and group.
pub trait Viewable: Clone {
    const ENTITY: Entity;

    fn space_id(&self) -> SpaceId;

    fn name(&self) -> &str;

    fn description(&self) -> Option<&str>;

    fn priority(&self) -> Option<Priority>;

    fn created_at(&self) -> Timestamp;

    /// The instant the record is due: a task's deadline or an event's date.
    fn due(&self) -> Option<Timestamp>;

    /// Task status; events have none.
    fn status(&self) -> Option<TaskStatus> {
        None
    }

    /// Event overdue flag; tasks carry overdue in their status instead.
    fn overdue_flag(&self) -> Option<bool> {
        None
    }
}

impl Viewable for Task {
    const ENTITY: Entity = Entity::Task;

    fn space_id(&self) -> SpaceId {
        self.space_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn priority(&self) -> Option<Priority> {
        self.priority
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }

    fn due(&self) -> Option<Timestamp> {
        self.deadline
    }

    fn status(&self) -> Option<TaskStatus> {
        Some(self.status)
    }
}

impl Viewable for Event {
    const ENTITY: Entity = Entity::Event;

    fn space_id(&self) -> SpaceId {
        self.space_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn priority(&self) -> Option<Priority> {
        self.priority
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }

    fn due(&self) -> Option<Timestamp> {
        Some(self.date)
    }

    fn overdue_flag(&self) -> Option<bool> {
        Some(self.overdue)
    }
}
