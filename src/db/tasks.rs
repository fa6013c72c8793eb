//! Task CRUD and predicate-scoped task queries.

use super::{now_ms, Database, SqlParts};
use crate::error::{BoardResult, InputError, StoreError, StoreResult};
use crate::patch::{normalize_description, normalize_name, TaskPatch};
use crate::store::{TaskFilter, TaskOrder};
use crate::types::{NewTask, Task, TaskId, TaskStatus, Timestamp};
use rusqlite::{params, Connection, Row};
use tracing::debug;

const TASK_COLUMNS: &str = "id, space_id, name, description, status, priority, deadline, created_at";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        space_id: row.get("space_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        status: row.get("status")?,
        priority: row.get("priority")?,
        deadline: row.get("deadline")?,
        created_at: row.get("created_at")?,
    })
}

/// Translate a task predicate into `WHERE` conditions.
fn push_task_filter(parts: &mut SqlParts, filter: &TaskFilter) {
    if let Some(ref space_ids) = filter.space_ids {
        parts.in_list("space_id", space_ids);
    }
    if let Some(id) = filter.id {
        parts.eq("id", id);
    }
    if let Some(instant) = filter.deadline_before {
        parts.is_not_null("deadline");
        parts.lt("deadline", instant);
    }
    parts.not_in_list("status", &filter.status_not_in);
}

pub(crate) fn select_tasks(
    conn: &Connection,
    filter: &TaskFilter,
    order: TaskOrder,
) -> StoreResult<Vec<Task>> {
    let mut parts = SqlParts::default();
    push_task_filter(&mut parts, filter);

    let sql = format!(
        "SELECT {} FROM tasks{} {}",
        TASK_COLUMNS,
        parts.where_sql(),
        order.sql_clause()
    );
    let mut stmt = conn.prepare(&sql)?;
    let tasks = stmt
        .query_map(parts.params().as_slice(), parse_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tasks)
}

pub(crate) fn update_tasks(
    conn: &Connection,
    filter: &TaskFilter,
    patch: &TaskPatch,
) -> StoreResult<usize> {
    let mut parts = SqlParts::default();
    if let Some(ref name) = patch.name {
        parts.set("name", name.clone());
    }
    if let Some(ref description) = patch.description {
        parts.set("description", description.clone());
    }
    if let Some(status) = patch.status {
        parts.set("status", status);
    }
    if let Some(priority) = patch.priority {
        parts.set("priority", priority);
    }
    if let Some(deadline) = patch.deadline {
        parts.set("deadline", deadline);
    }
    if !parts.has_assignments() {
        return Ok(0);
    }
    push_task_filter(&mut parts, filter);

    let sql = format!("UPDATE tasks SET {}{}", parts.set_sql(), parts.where_sql());
    let affected = conn.execute(&sql, parts.params().as_slice())?;
    Ok(affected)
}

fn get_task_internal(conn: &Connection, id: TaskId) -> StoreResult<Option<Task>> {
    let sql = format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS);
    match conn.query_row(&sql, params![id], parse_task_row) {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Database {
    /// Create a new task. Status defaults to `to-do`.
    pub fn create_task(&self, input: NewTask) -> BoardResult<Task> {
        self.create_task_at(input, now_ms())
    }

    /// Create a task with an explicit creation time.
    pub fn create_task_at(&self, input: NewTask, created_at: Timestamp) -> BoardResult<Task> {
        let name = normalize_name(&input.name)?;
        let description = normalize_description(input.description.as_deref());
        let status = input.status.unwrap_or_default();
        if status == TaskStatus::Overdue {
            return Err(InputError::derived("status").into());
        }

        let task = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (space_id, name, description, status, priority, deadline, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    input.space_id,
                    name,
                    description,
                    status,
                    input.priority,
                    input.deadline,
                    created_at
                ],
            )?;
            Ok(Task {
                id: conn.last_insert_rowid(),
                space_id: input.space_id,
                name,
                description,
                status,
                priority: input.priority,
                deadline: input.deadline,
                created_at,
            })
        })?;

        debug!(task_id = task.id, space_id = task.space_id, "task created");
        Ok(task)
    }

    /// Get a task by ID.
    pub fn get_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, id))
    }

    /// Apply a patch to one task and return the updated record.
    ///
    /// `overdue` cannot be chosen here; only reconciliation sets it.
    pub fn update_task(&self, id: TaskId, patch: &TaskPatch) -> BoardResult<Task> {
        if patch.status == Some(TaskStatus::Overdue) {
            return Err(InputError::derived("status").into());
        }
        let mut patch = patch.clone();
        if let Some(name) = patch.name.take() {
            patch.name = Some(normalize_name(&name)?);
        }
        if let Some(description) = patch.description.take() {
            patch.description = Some(normalize_description(description.as_deref()));
        }

        let task = self.with_conn(|conn| {
            update_tasks(conn, &TaskFilter::by_id(id), &patch)?;
            get_task_internal(conn, id)?.ok_or_else(|| StoreError::not_found("tasks", id))
        })?;
        Ok(task)
    }

    /// Delete a task. Returns false if no such task existed.
    pub fn delete_task(&self, id: TaskId) -> StoreResult<bool> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
            Ok(affected > 0)
        })
    }
}
