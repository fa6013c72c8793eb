//! Space CRUD operations.

use super::{now_ms, Database, SqlParts};
use crate::error::{BoardResult, StoreError, StoreResult};
use crate::patch::{normalize_description, normalize_name, SpacePatch};
use crate::store::SpaceFilter;
use crate::types::{NewSpace, Space, SpaceId, Timestamp};
use rusqlite::{params, Connection, Row};
use tracing::debug;

const SPACE_COLUMNS: &str = "id, owner_id, name, description, created_at";

pub fn parse_space_row(row: &Row) -> rusqlite::Result<Space> {
    Ok(Space {
        id: row.get("id")?,
        owner_id: row.get("owner_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
    })
}

pub(crate) fn select_spaces(conn: &Connection, filter: &SpaceFilter) -> StoreResult<Vec<Space>> {
    let mut parts = SqlParts::default();
    if let Some(ref ids) = filter.ids {
        parts.in_list("id", ids);
    }
    if let Some(ref owner_id) = filter.owner_id {
        parts.eq("owner_id", owner_id.clone());
    }

    let sql = format!(
        "SELECT {} FROM spaces{} ORDER BY created_at ASC, id ASC",
        SPACE_COLUMNS,
        parts.where_sql()
    );
    let mut stmt = conn.prepare(&sql)?;
    let spaces = stmt
        .query_map(parts.params().as_slice(), parse_space_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(spaces)
}

fn get_space_internal(conn: &Connection, id: SpaceId) -> StoreResult<Option<Space>> {
    let sql = format!("SELECT {} FROM spaces WHERE id = ?1", SPACE_COLUMNS);
    match conn.query_row(&sql, params![id], parse_space_row) {
        Ok(space) => Ok(Some(space)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Database {
    /// Create a space owned by `owner_id`.
    pub fn create_space(&self, owner_id: &str, input: NewSpace) -> BoardResult<Space> {
        self.create_space_at(owner_id, input, now_ms())
    }

    /// Create a space with an explicit creation time.
    pub fn create_space_at(
        &self,
        owner_id: &str,
        input: NewSpace,
        created_at: Timestamp,
    ) -> BoardResult<Space> {
        let name = normalize_name(&input.name)?;
        let description = normalize_description(input.description.as_deref());

        let space = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO spaces (owner_id, name, description, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![owner_id, name, description, created_at],
            )?;
            Ok(Space {
                id: conn.last_insert_rowid(),
                owner_id: owner_id.to_string(),
                name,
                description,
                created_at,
            })
        })?;

        debug!(space_id = space.id, owner = owner_id, "space created");
        Ok(space)
    }

    /// Get a space by ID.
    pub fn get_space(&self, id: SpaceId) -> StoreResult<Option<Space>> {
        self.with_conn(|conn| get_space_internal(conn, id))
    }

    /// List an owner's spaces, oldest first.
    pub fn list_spaces(&self, owner_id: &str) -> StoreResult<Vec<Space>> {
        self.with_conn(|conn| select_spaces(conn, &SpaceFilter::by_owner(owner_id)))
    }

    /// Apply a patch to a space and return the updated record.
    pub fn update_space(&self, id: SpaceId, patch: &SpacePatch) -> BoardResult<Space> {
        let mut parts = SqlParts::default();
        if let Some(ref name) = patch.name {
            parts.set("name", normalize_name(name)?);
        }
        if let Some(ref description) = patch.description {
            parts.set("description", normalize_description(description.as_deref()));
        }

        let space = self.with_conn(|conn| {
            if parts.has_assignments() {
                parts.eq("id", id);
                let sql = format!("UPDATE spaces SET {}{}", parts.set_sql(), parts.where_sql());
                conn.execute(&sql, parts.params().as_slice())?;
            }
            get_space_internal(conn, id)?.ok_or_else(|| StoreError::not_found("spaces", id))
        })?;
        Ok(space)
    }

    /// Delete a space and, by cascade, its tasks and events.
    /// Returns false if no such space existed.
    pub fn delete_space(&self, id: SpaceId) -> StoreResult<bool> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM spaces WHERE id = ?1", params![id])?;
            Ok(affected > 0)
        })
    }
}
