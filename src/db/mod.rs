//! Database layer: the SQLite-backed record store.

pub mod events;
pub mod spaces;
pub mod tasks;

use crate::error::{StoreError, StoreResult};
use crate::patch::{EventPatch, TaskPatch};
use crate::store::{EventFilter, EventOrder, RecordStore, SpaceFilter, TaskFilter, TaskOrder};
use crate::types::{Event, Priority, Space, Task, TaskStatus};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{Connection, ToSql};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())?;

        // Enable WAL mode for concurrent access
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;
        info!(path = %path.as_ref().display(), "database opened");

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Run database migrations.
    fn run_migrations(&self) -> StoreResult<()> {
        let mut conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let report = embedded::migrations::runner().run(&mut *conn)?;
        for migration in report.applied_migrations() {
            info!(version = migration.version(), name = migration.name(), "migration applied");
        }
        Ok(())
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T>,
    {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&conn)
    }
}

/// Get the current timestamp in milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Incrementally built `SET`/`WHERE` fragments with numbered parameters.
///
/// Parameters are numbered in push order, so assignments must be added
/// before conditions when both appear in one statement.
#[derive(Default)]
pub(crate) struct SqlParts {
    assignments: Vec<String>,
    conditions: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl SqlParts {
    fn bind<V: ToSql + 'static>(&mut self, value: V) -> usize {
        self.params.push(Box::new(value));
        self.params.len()
    }

    pub(crate) fn set<V: ToSql + 'static>(&mut self, column: &str, value: V) {
        let n = self.bind(value);
        self.assignments.push(format!("{} = ?{}", column, n));
    }

    pub(crate) fn eq<V: ToSql + 'static>(&mut self, column: &str, value: V) {
        let n = self.bind(value);
        self.conditions.push(format!("{} = ?{}", column, n));
    }

    pub(crate) fn lt<V: ToSql + 'static>(&mut self, column: &str, value: V) {
        let n = self.bind(value);
        self.conditions.push(format!("{} < ?{}", column, n));
    }

    pub(crate) fn is_not_null(&mut self, column: &str) {
        self.conditions.push(format!("{} IS NOT NULL", column));
    }

    /// `column IN (...)`; an empty list matches no rows.
    pub(crate) fn in_list<V: ToSql + Clone + 'static>(&mut self, column: &str, values: &[V]) {
        if values.is_empty() {
            self.conditions.push("0 = 1".to_string());
            return;
        }
        let placeholders: Vec<String> = values
            .iter()
            .map(|v| format!("?{}", self.bind(v.clone())))
            .collect();
        self.conditions
            .push(format!("{} IN ({})", column, placeholders.join(", ")));
    }

    pub(crate) fn not_in_list<V: ToSql + Clone + 'static>(&mut self, column: &str, values: &[V]) {
        if values.is_empty() {
            return;
        }
        let placeholders: Vec<String> = values
            .iter()
            .map(|v| format!("?{}", self.bind(v.clone())))
            .collect();
        self.conditions
            .push(format!("{} NOT IN ({})", column, placeholders.join(", ")));
    }

    pub(crate) fn has_assignments(&self) -> bool {
        !self.assignments.is_empty()
    }

    pub(crate) fn set_sql(&self) -> String {
        self.assignments.join(", ")
    }

    pub(crate) fn where_sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub(crate) fn params(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|b| b.as_ref()).collect()
    }
}

impl ToSql for TaskStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TaskStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        TaskStatus::parse(raw)
            .ok_or_else(|| FromSqlError::Other(format!("unknown task status '{}'", raw).into()))
    }
}

impl ToSql for Priority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Priority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        Priority::parse(raw)
            .ok_or_else(|| FromSqlError::Other(format!("unknown priority '{}'", raw).into()))
    }
}

impl RecordStore for Database {
    fn select_spaces(&self, filter: &SpaceFilter) -> StoreResult<Vec<Space>> {
        self.with_conn(|conn| spaces::select_spaces(conn, filter))
    }

    fn select_tasks(&self, filter: &TaskFilter, order: TaskOrder) -> StoreResult<Vec<Task>> {
        self.with_conn(|conn| tasks::select_tasks(conn, filter, order))
    }

    fn select_events(&self, filter: &EventFilter, order: EventOrder) -> StoreResult<Vec<Event>> {
        self.with_conn(|conn| events::select_events(conn, filter, order))
    }

    fn update_tasks(&self, filter: &TaskFilter, patch: &TaskPatch) -> StoreResult<usize> {
        self.with_conn(|conn| tasks::update_tasks(conn, filter, patch))
    }

    fn update_events(&self, filter: &EventFilter, patch: &EventPatch) -> StoreResult<usize> {
        self.with_conn(|conn| events::update_events(conn, filter, patch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_parts_number_params_in_push_order() {
        let mut parts = SqlParts::default();
        parts.set("status", TaskStatus::Overdue);
        parts.in_list("space_id", &[4_i64, 5]);
        parts.is_not_null("deadline");
        parts.lt("deadline", 100_i64);

        assert_eq!(parts.set_sql(), "status = ?1");
        assert_eq!(
            parts.where_sql(),
            " WHERE space_id IN (?2, ?3) AND deadline IS NOT NULL AND deadline < ?4"
        );
        assert_eq!(parts.params().len(), 4);
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let mut parts = SqlParts::default();
        parts.in_list::<i64>("space_id", &[]);
        assert_eq!(parts.where_sql(), " WHERE 0 = 1");
    }

    #[test]
    fn unknown_status_column_is_a_conversion_error() {
        let conn = Connection::open_in_memory().unwrap();
        let result: rusqlite::Result<TaskStatus> =
            conn.query_row("SELECT 'blocked'", [], |row| row.get(0));
        assert!(result.is_err());
    }
}
