//! View specs: what the caller asks for, and the validated form the engine runs.

use crate::error::SpecError;
use crate::types::{Priority, SpaceId, TaskStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Filter value that disables a categorical filter.
pub const ALL: &str = "all";

/// Page window used when a spec does not name one.
pub const DEFAULT_PAGE_WINDOW: usize = 50;

/// Record kind a spec is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Task,
    Event,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Task => "tasks",
            Entity::Event => "events",
        }
    }

    /// Filter fields this entity understands.
    pub fn filter_fields(&self) -> &'static [&'static str] {
        match self {
            Entity::Task => &["space", "status", "priority"],
            Entity::Event => &["space", "priority", "overdue"],
        }
    }
}

/// Sort keys. Deadline keys apply to tasks, date keys to events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    CreatedAsc,
    CreatedDesc,
    DeadlineAsc,
    DeadlineDesc,
    DateAsc,
    DateDesc,
    PriorityAsc,
    PriorityDesc,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::CreatedAsc => "created_asc",
            SortKey::CreatedDesc => "created_desc",
            SortKey::DeadlineAsc => "deadline_asc",
            SortKey::DeadlineDesc => "deadline_desc",
            SortKey::DateAsc => "date_asc",
            SortKey::DateDesc => "date_desc",
            SortKey::PriorityAsc => "priority_asc",
            SortKey::PriorityDesc => "priority_desc",
        }
    }

    pub fn applies_to(&self, entity: Entity) -> bool {
        match self {
            SortKey::DeadlineAsc | SortKey::DeadlineDesc => entity == Entity::Task,
            SortKey::DateAsc | SortKey::DateDesc => entity == Entity::Event,
            _ => true,
        }
    }

    pub fn is_descending(&self) -> bool {
        matches!(
            self,
            SortKey::CreatedDesc | SortKey::DeadlineDesc | SortKey::DateDesc | SortKey::PriorityDesc
        )
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created_asc" => Ok(SortKey::CreatedAsc),
            "created_desc" => Ok(SortKey::CreatedDesc),
            "deadline_asc" => Ok(SortKey::DeadlineAsc),
            "deadline_desc" => Ok(SortKey::DeadlineDesc),
            "date_asc" => Ok(SortKey::DateAsc),
            "date_desc" => Ok(SortKey::DateDesc),
            "priority_asc" => Ok(SortKey::PriorityAsc),
            "priority_desc" => Ok(SortKey::PriorityDesc),
            _ => Err(SpecError::unknown_sort_key(s)),
        }
    }
}

/// Grouping applied after sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    #[default]
    Space,
    None,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Space => "space",
            GroupBy::None => "none",
        }
    }
}

impl FromStr for GroupBy {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "space" => Ok(GroupBy::Space),
            "none" => Ok(GroupBy::None),
            _ => Err(SpecError::unknown_group_by(s)),
        }
    }
}

/// A view request as the presentation layer builds it from UI state.
///
/// Values stay stringly typed here; [`CompiledSpec::compile`] validates them
/// and names the offending field on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSpec {
    /// Case-insensitive substring matched against name, description and space name.
    #[serde(default)]
    pub query: String,
    /// Field to value, or `"all"` to leave a field unfiltered.
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
    pub sort_key: String,
    #[serde(default = "default_group_by")]
    pub group_by: String,
    /// Drop items whose deadline or date is already behind `now`.
    #[serde(default)]
    pub hide_past: bool,
    #[serde(default = "default_page_window")]
    pub page_window_per_group: usize,
    /// Order tasks by status bucket before the sort key (space detail view).
    #[serde(default)]
    pub status_buckets: bool,
}

fn default_group_by() -> String {
    GroupBy::Space.as_str().to_string()
}

fn default_page_window() -> usize {
    DEFAULT_PAGE_WINDOW
}

impl ViewSpec {
    pub fn new(sort_key: SortKey) -> Self {
        Self {
            query: String::new(),
            filters: BTreeMap::new(),
            sort_key: sort_key.as_str().to_string(),
            group_by: default_group_by(),
            hide_past: false,
            page_window_per_group: DEFAULT_PAGE_WINDOW,
            status_buckets: false,
        }
    }

    /// Task board default: newest first, grouped by space.
    pub fn tasks() -> Self {
        Self::new(SortKey::CreatedDesc)
    }

    /// Event board default: soonest first, grouped by space.
    pub fn events() -> Self {
        Self::new(SortKey::DateAsc)
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    pub fn sorted_by(mut self, sort_key: impl Into<String>) -> Self {
        self.sort_key = sort_key.into();
        self
    }

    pub fn grouped_by(mut self, group_by: impl Into<String>) -> Self {
        self.group_by = group_by.into();
        self
    }

    pub fn hiding_past(mut self, hide_past: bool) -> Self {
        self.hide_past = hide_past;
        self
    }

    pub fn with_page_window(mut self, window: usize) -> Self {
        self.page_window_per_group = window;
        self
    }

    pub fn with_status_buckets(mut self, enabled: bool) -> Self {
        self.status_buckets = enabled;
        self
    }
}

/// Validated categorical filters. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub space: Option<SpaceId>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub overdue: Option<bool>,
}

/// A [`ViewSpec`] checked against one entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSpec {
    pub entity: Entity,
    /// Lowercased, trimmed query; empty means no text filter.
    pub needle: String,
    pub filters: Filters,
    pub sort_key: SortKey,
    pub group_by: GroupBy,
    pub hide_past: bool,
    pub page_window: usize,
    pub status_buckets: bool,
}

impl CompiledSpec {
    /// Validate every field of `spec` for `entity`. Nothing is applied
    /// unless the whole spec is valid.
    pub fn compile(spec: &ViewSpec, entity: Entity) -> Result<Self, SpecError> {
        let sort_key: SortKey = spec.sort_key.parse()?;
        if !sort_key.applies_to(entity) {
            return Err(SpecError::sort_key_not_applicable(
                &spec.sort_key,
                entity.as_str(),
            ));
        }

        let group_by: GroupBy = spec.group_by.parse()?;

        if spec.page_window_per_group == 0 {
            return Err(SpecError::invalid_page_window(spec.page_window_per_group));
        }

        let mut filters = Filters::default();
        for (field, value) in &spec.filters {
            if !entity.filter_fields().contains(&field.as_str()) {
                return Err(SpecError::unknown_filter_field(field, entity.as_str()));
            }
            let value = value.trim();
            if value.eq_ignore_ascii_case(ALL) {
                continue;
            }
            let invalid = || SpecError::invalid_filter_value(field, value);
            match field.as_str() {
                "space" => filters.space = Some(value.parse().map_err(|_| invalid())?),
                "status" => filters.status = Some(TaskStatus::parse(value).ok_or_else(invalid)?),
                "priority" => filters.priority = Some(Priority::parse(value).ok_or_else(invalid)?),
                "overdue" => filters.overdue = Some(value.parse().map_err(|_| invalid())?),
                _ => return Err(SpecError::unknown_filter_field(field, entity.as_str())),
            }
        }

        Ok(Self {
            entity,
            needle: spec.query.trim().to_lowercase(),
            filters,
            sort_key,
            group_by,
            hide_past: spec.hide_past,
            page_window: spec.page_window_per_group,
            status_buckets: spec.status_buckets && entity == Entity::Task,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn sort_key_parses_and_displays() {
        for key in [
            SortKey::CreatedAsc,
            SortKey::CreatedDesc,
            SortKey::DeadlineAsc,
            SortKey::DeadlineDesc,
            SortKey::DateAsc,
            SortKey::DateDesc,
            SortKey::PriorityAsc,
            SortKey::PriorityDesc,
        ] {
            assert_eq!(key.to_string().parse::<SortKey>().unwrap(), key);
        }
        let err = "alphabetical".parse::<SortKey>().unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownSortKey);
    }

    #[test]
    fn deadline_sort_is_rejected_for_events() {
        let spec = ViewSpec::events().sorted_by("deadline_asc");
        let err = CompiledSpec::compile(&spec, Entity::Event).unwrap_err();
        assert_eq!(err.code, ErrorCode::SortKeyNotApplicable);
        assert_eq!(err.field, "sort_key");
    }

    #[test]
    fn all_bypasses_categorical_filters() {
        let spec = ViewSpec::tasks()
            .with_filter("status", "all")
            .with_filter("priority", "ALL")
            .with_filter("space", "all");
        let compiled = CompiledSpec::compile(&spec, Entity::Task).unwrap();
        assert_eq!(compiled.filters, Filters::default());
    }

    #[test]
    fn filter_values_are_typed() {
        let spec = ViewSpec::tasks()
            .with_filter("status", "in-progress")
            .with_filter("priority", "none")
            .with_filter("space", "12");
        let compiled = CompiledSpec::compile(&spec, Entity::Task).unwrap();
        assert_eq!(compiled.filters.status, Some(TaskStatus::InProgress));
        assert_eq!(compiled.filters.priority, Some(Priority::None));
        assert_eq!(compiled.filters.space, Some(12));
    }

    #[test]
    fn bad_filter_values_name_the_field() {
        let spec = ViewSpec::tasks().with_filter("status", "blocked");
        let err = CompiledSpec::compile(&spec, Entity::Task).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFilterValue);
        assert_eq!(err.field, "filters.status");

        let spec = ViewSpec::events().with_filter("status", "done");
        let err = CompiledSpec::compile(&spec, Entity::Event).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownFilterField);

        let spec = ViewSpec::tasks().with_filter("space", "home");
        let err = CompiledSpec::compile(&spec, Entity::Task).unwrap_err();
        assert_eq!(err.field, "filters.space");
    }

    #[test]
    fn zero_page_window_is_rejected() {
        let spec = ViewSpec::tasks().with_page_window(0);
        let err = CompiledSpec::compile(&spec, Entity::Task).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPageWindow);
    }

    #[test]
    fn status_buckets_only_apply_to_tasks() {
        let spec = ViewSpec::events().with_status_buckets(true);
        let compiled = CompiledSpec::compile(&spec, Entity::Event).unwrap();
        assert!(!compiled.status_buckets);
    }

    #[test]
    fn query_is_normalized() {
        let spec = ViewSpec::tasks().with_query("  Quarterly REPORT ");
        let compiled = CompiledSpec::compile(&spec, Entity::Task).unwrap();
        assert_eq!(compiled.needle, "quarterly report");
    }

    #[test]
    fn spec_deserializes_with_defaults() {
        let spec: ViewSpec = serde_json::from_str(r#"{"sort_key": "priority_desc"}"#).unwrap();
        assert_eq!(spec.group_by, "space");
        assert_eq!(spec.page_window_per_group, DEFAULT_PAGE_WINDOW);
        assert!(!spec.hide_past);
    }
}
