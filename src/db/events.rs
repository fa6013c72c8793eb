//! Event CRUD and predicate-scoped event queries.

use super::{now_ms, Database, SqlParts};
use crate::error::{BoardResult, InputError, StoreError, StoreResult};
use crate::patch::{normalize_description, normalize_name, EventPatch};
use crate::store::{EventFilter, EventOrder};
use crate::types::{Event, EventId, NewEvent, Timestamp};
use rusqlite::{params, Connection, Row};
use tracing::debug;

const EVENT_COLUMNS: &str = "id, space_id, name, description, date, priority, overdue, created_at";

pub fn parse_event_row(row: &Row) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get("id")?,
        space_id: row.get("space_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        date: row.get("date")?,
        priority: row.get("priority")?,
        overdue: row.get("overdue")?,
        created_at: row.get("created_at")?,
    })
}

fn push_event_filter(parts: &mut SqlParts, filter: &EventFilter) {
    if let Some(ref space_ids) = filter.space_ids {
        parts.in_list("space_id", space_ids);
    }
    if let Some(id) = filter.id {
        parts.eq("id", id);
    }
    if let Some(instant) = filter.date_before {
        parts.lt("date", instant);
    }
    if let Some(overdue) = filter.overdue {
        parts.eq("overdue", overdue);
    }
}

pub(crate) fn select_events(
    conn: &Connection,
    filter: &EventFilter,
    order: EventOrder,
) -> StoreResult<Vec<Event>> {
    let mut parts = SqlParts::default();
    push_event_filter(&mut parts, filter);

    let sql = format!(
        "SELECT {} FROM events{} {}",
        EVENT_COLUMNS,
        parts.where_sql(),
        order.sql_clause()
    );
    let mut stmt = conn.prepare(&sql)?;
    let events = stmt
        .query_map(parts.params().as_slice(), parse_event_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(events)
}

pub(crate) fn update_events(
    conn: &Connection,
    filter: &EventFilter,
    patch: &EventPatch,
) -> StoreResult<usize> {
    let mut parts = SqlParts::default();
    if let Some(ref name) = patch.name {
        parts.set("name", name.clone());
    }
    if let Some(ref description) = patch.description {
        parts.set("description", description.clone());
    }
    if let Some(date) = patch.date {
        parts.set("date", date);
    }
    if let Some(priority) = patch.priority {
        parts.set("priority", priority);
    }
    if let Some(overdue) = patch.overdue {
        parts.set("overdue", overdue);
    }
    if !parts.has_assignments() {
        return Ok(0);
    }
    push_event_filter(&mut parts, filter);

    let sql = format!("UPDATE events SET {}{}", parts.set_sql(), parts.where_sql());
    let affected = conn.execute(&sql, parts.params().as_slice())?;
    Ok(affected)
}

fn get_event_internal(conn: &Connection, id: EventId) -> StoreResult<Option<Event>> {
    let sql = format!("SELECT {} FROM events WHERE id = ?1", EVENT_COLUMNS);
    match conn.query_row(&sql, params![id], parse_event_row) {
        Ok(event) => Ok(Some(event)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Database {
    /// Create a new event. Events start out not overdue.
    pub fn create_event(&self, input: NewEvent) -> BoardResult<Event> {
        self.create_event_at(input, now_ms())
    }

    /// Create an event with an explicit creation time.
    pub fn create_event_at(&self, input: NewEvent, created_at: Timestamp) -> BoardResult<Event> {
        let name = normalize_name(&input.name)?;
        let description = normalize_description(input.description.as_deref());

        let event = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO events (space_id, name, description, date, priority, overdue, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
                params![
                    input.space_id,
                    name,
                    description,
                    input.date,
                    input.priority,
                    created_at
                ],
            )?;
            Ok(Event {
                id: conn.last_insert_rowid(),
                space_id: input.space_id,
                name,
                description,
                date: input.date,
                priority: input.priority,
                overdue: false,
                created_at,
            })
        })?;

        debug!(event_id = event.id, space_id = event.space_id, "event created");
        Ok(event)
    }

    /// Get an event by ID.
    pub fn get_event(&self, id: EventId) -> StoreResult<Option<Event>> {
        self.with_conn(|conn| get_event_internal(conn, id))
    }

    /// Apply a patch to one event and return the updated record.
    ///
    /// The overdue flag cannot be written here; only reconciliation sets it.
    pub fn update_event(&self, id: EventId, patch: &EventPatch) -> BoardResult<Event> {
        if patch.overdue.is_some() {
            return Err(InputError::derived("overdue").into());
        }
        let mut patch = patch.clone();
        if let Some(name) = patch.name.take() {
            patch.name = Some(normalize_name(&name)?);
        }
        if let Some(description) = patch.description.take() {
            patch.description = Some(normalize_description(description.as_deref()));
        }

        let event = self.with_conn(|conn| {
            update_events(conn, &EventFilter::by_id(id), &patch)?;
            get_event_internal(conn, id)?.ok_or_else(|| StoreError::not_found("events", id))
        })?;
        Ok(event)
    }

    /// Delete an event. Returns false if no such event existed.
    pub fn delete_event(&self, id: EventId) -> StoreResult<bool> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM events WHERE id = ?1", params![id])?;
            Ok(affected > 0)
        })
    }
}
