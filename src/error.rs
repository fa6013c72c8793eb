//! Structured error types for board operations.
//!
//! Three failure families reach callers: the record store failed
//! ([`StoreError`]), a view spec carried a value the engine cannot apply
//! ([`SpecError`]), or a create/update input was rejected ([`InputError`]).
//! [`BoardError`] is their union for the caller-facing API.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic handling of view-spec rejections.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    UnknownSortKey,
    SortKeyNotApplicable,
    UnknownFilterField,
    InvalidFilterValue,
    UnknownGroupBy,
    InvalidPageWindow,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UnknownSortKey => "UNKNOWN_SORT_KEY",
            ErrorCode::SortKeyNotApplicable => "SORT_KEY_NOT_APPLICABLE",
            ErrorCode::UnknownFilterField => "UNKNOWN_FILTER_FIELD",
            ErrorCode::InvalidFilterValue => "INVALID_FILTER_VALUE",
            ErrorCode::UnknownGroupBy => "UNKNOWN_GROUP_BY",
            ErrorCode::InvalidPageWindow => "INVALID_PAGE_WINDOW",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A read or write against the record store failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] refinery::Error),

    #[error("database connection lock poisoned")]
    Poisoned,

    #[error("{table} {id} not found")]
    NotFound { table: &'static str, id: i64 },
}

impl StoreError {
    pub fn not_found(table: &'static str, id: i64) -> Self {
        StoreError::NotFound { table, id }
    }
}

/// An invalid view-spec value, rejected before any filtering happens.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SpecError {
    pub code: ErrorCode,
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub message: String,
}

impl SpecError {
    pub fn new(code: ErrorCode, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            field: field.into(),
            value: None,
            message: message.into(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    // Convenience constructors

    pub fn unknown_sort_key(value: &str) -> Self {
        Self::new(
            ErrorCode::UnknownSortKey,
            "sort_key",
            format!("unknown sort key '{}'", value),
        )
        .with_value(value)
    }

    pub fn sort_key_not_applicable(value: &str, entity: &str) -> Self {
        Self::new(
            ErrorCode::SortKeyNotApplicable,
            "sort_key",
            format!("sort key '{}' does not apply to {}", value, entity),
        )
        .with_value(value)
    }

    pub fn unknown_filter_field(field: &str, entity: &str) -> Self {
        Self::new(
            ErrorCode::UnknownFilterField,
            format!("filters.{}", field),
            format!("{} cannot be filtered by '{}'", entity, field),
        )
    }

    pub fn invalid_filter_value(field: &str, value: &str) -> Self {
        Self::new(
            ErrorCode::InvalidFilterValue,
            format!("filters.{}", field),
            format!("'{}' is not a valid {} filter", value, field),
        )
        .with_value(value)
    }

    pub fn unknown_group_by(value: &str) -> Self {
        Self::new(
            ErrorCode::UnknownGroupBy,
            "group_by",
            format!("unknown group-by key '{}'", value),
        )
        .with_value(value)
    }

    pub fn invalid_page_window(value: usize) -> Self {
        Self::new(
            ErrorCode::InvalidPageWindow,
            "page_window_per_group",
            "page window must be at least 1",
        )
        .with_value(value.to_string())
    }
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.field, self.message)
    }
}

impl std::error::Error for SpecError {}

/// A create or update input was rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {field}: {message}")]
pub struct InputError {
    pub field: &'static str,
    pub message: String,
}

impl InputError {
    pub fn missing(field: &'static str) -> Self {
        Self {
            field,
            message: format!("{} is required", field),
        }
    }

    /// `field` only changes through overdue reconciliation.
    pub fn derived(field: &'static str) -> Self {
        Self {
            field,
            message: format!("{} is set automatically once the due time passes", field),
        }
    }
}

/// Errors surfaced by the caller-facing board API.
///
/// Messages pass through verbatim so the presentation layer can show the
/// underlying cause.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Input(#[from] InputError),
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for board operations.
pub type BoardResult<T> = std::result::Result<T, BoardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_error_names_the_offending_field() {
        let err = SpecError::unknown_sort_key("alphabetical");
        assert_eq!(err.code, ErrorCode::UnknownSortKey);
        assert_eq!(err.field, "sort_key");
        assert_eq!(err.value.as_deref(), Some("alphabetical"));
        assert_eq!(
            err.to_string(),
            "invalid sort_key: unknown sort key 'alphabetical'"
        );
    }

    #[test]
    fn spec_error_serializes_code_in_screaming_case() {
        let err = SpecError::invalid_filter_value("status", "blocked");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "INVALID_FILTER_VALUE");
        assert_eq!(json["field"], "filters.status");
    }

    #[test]
    fn board_error_keeps_store_message_verbatim() {
        let err: BoardError = StoreError::not_found("tasks", 7).into();
        assert_eq!(err.to_string(), "tasks 7 not found");
    }
}
