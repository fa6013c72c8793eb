//! Derived views over tasks and events.
//!
//! [`project`] turns a flat collection into a filtered, sorted, grouped and
//! windowed page. It is a pure function of its inputs: nothing is cached and
//! nothing is mutated, so callers re-run it whenever the spec or the data
//! changes.
//!
//! The pipeline runs in a fixed order:
//!
//! 1. **Filter**: space membership, categorical filters, `hide_past`, and a
//!    case-insensitive substring match over name, description and space name.
//! 2. **Sort**: one stable comparator chosen by the sort key. With status
//!    buckets on, tasks are first split into `overdue`, `in-progress`,
//!    `to-do`, `done` buckets and the sort key only orders items inside a
//!    bucket. This is two sorting levels, not one combined key.
//! 3. **Group**: by space in the caller's space order, dropping empty groups.
//! 4. **Window**: each group shows its own page window.

mod item;
mod page;
mod spec;

pub use item::Viewable;
pub use page::{Group, GroupKey, GroupedPage, PageWindows, Projection, ViewSession};
pub use spec::{
    ALL, CompiledSpec, DEFAULT_PAGE_WINDOW, Entity, Filters, GroupBy, SortKey, ViewSpec,
};

use crate::error::SpecError;
use crate::types::{Priority, Space, SpaceId, Timestamp};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Inputs a projection needs besides the items themselves.
#[derive(Debug, Clone, Copy)]
pub struct ViewContext<'a> {
    /// Spaces in display order. Items outside these spaces are never shown.
    pub spaces: &'a [Space],
    pub now: Timestamp,
}

impl<'a> ViewContext<'a> {
    pub fn new(spaces: &'a [Space], now: Timestamp) -> Self {
        Self { spaces, now }
    }

    fn space_names(&self) -> HashMap<SpaceId, &'a str> {
        self.spaces
            .iter()
            .map(|s| (s.id, s.name.as_str()))
            .collect()
    }
}

/// Project `items` through `spec`.
///
/// The spec is validated before anything else; an invalid spec is never
/// partially applied.
pub fn project<T: Viewable>(
    items: &[T],
    ctx: &ViewContext<'_>,
    spec: &ViewSpec,
    windows: &PageWindows,
) -> Result<Projection<T>, SpecError> {
    let compiled = CompiledSpec::compile(spec, T::ENTITY)?;

    if items.is_empty() {
        return Ok(Projection::Empty);
    }

    let names = ctx.space_names();
    let mut matched: Vec<&T> = items
        .iter()
        .filter(|item| passes_filters(*item, &compiled, &names, ctx.now))
        .collect();

    if matched.is_empty() {
        return Ok(Projection::NoMatches);
    }

    sort_items(&mut matched, &compiled);

    let groups = group_items(matched, ctx, compiled.group_by);
    let matched_count = groups.iter().map(|(_, members)| members.len()).sum();

    let groups = groups
        .into_iter()
        .map(|(key, members)| {
            let window = windows.window_for(key, compiled.page_window);
            let total = members.len();
            let items: Vec<T> = members.into_iter().take(window).cloned().collect();
            Group {
                key,
                label: match key {
                    GroupKey::Space(id) => names.get(&id).map(|n| n.to_string()),
                    GroupKey::All => None,
                },
                remaining: total - items.len(),
                items,
                total,
                window,
            }
        })
        .collect();

    Ok(Projection::Page(GroupedPage {
        groups,
        matched: matched_count,
    }))
}

fn passes_filters<T: Viewable>(
    item: &T,
    spec: &CompiledSpec,
    names: &HashMap<SpaceId, &str>,
    now: Timestamp,
) -> bool {
    let Some(space_name) = names.get(&item.space_id()) else {
        return false;
    };
    let filters = &spec.filters;

    if filters.space.is_some_and(|id| id != item.space_id()) {
        return false;
    }
    if filters.status.is_some() && filters.status != item.status() {
        return false;
    }
    if filters
        .priority
        .is_some_and(|p| p != Priority::or_none(item.priority()))
    {
        return false;
    }
    if filters.overdue.is_some() && filters.overdue != item.overdue_flag() {
        return false;
    }
    if spec.hide_past && item.due().is_some_and(|due| due < now) {
        return false;
    }
    if !spec.needle.is_empty() && !haystack(item, space_name).contains(&spec.needle) {
        return false;
    }
    true
}

/// Lowercased text searched by the query. Missing fields contribute nothing.
fn haystack<T: Viewable>(item: &T, space_name: &str) -> String {
    format!(
        "{}\n{}\n{}",
        item.name(),
        item.description().unwrap_or_default(),
        space_name
    )
    .to_lowercase()
}

/// Null due dates count as furthest away: last ascending, first descending.
fn cmp_due(a: Option<Timestamp>, b: Option<Timestamp>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
    }
}

fn compare<T: Viewable>(a: &T, b: &T, key: SortKey) -> Ordering {
    let ascending = match key {
        SortKey::CreatedAsc | SortKey::CreatedDesc => a.created_at().cmp(&b.created_at()),
        SortKey::DeadlineAsc | SortKey::DeadlineDesc | SortKey::DateAsc | SortKey::DateDesc => {
            cmp_due(a.due(), b.due())
        }
        SortKey::PriorityAsc | SortKey::PriorityDesc => {
            Priority::rank_of(a.priority()).cmp(&Priority::rank_of(b.priority()))
        }
    };
    if key.is_descending() {
        ascending.reverse()
    } else {
        ascending
    }
}

fn sort_items<T: Viewable>(items: &mut Vec<&T>, spec: &CompiledSpec) {
    if !spec.status_buckets {
        items.sort_by(|a, b| compare(*a, *b, spec.sort_key));
        return;
    }

    // Bucket by status first, then order each bucket by the sort key.
    let mut buckets: [Vec<&T>; 4] = Default::default();
    for item in items.drain(..) {
        let rank = item.status().map(|s| s.bucket_rank()).unwrap_or(3);
        buckets[rank as usize].push(item);
    }
    for mut bucket in buckets {
        bucket.sort_by(|a, b| compare(*a, *b, spec.sort_key));
        items.extend(bucket);
    }
}

fn group_items<'t, T: Viewable>(
    sorted: Vec<&'t T>,
    ctx: &ViewContext<'_>,
    group_by: GroupBy,
) -> Vec<(GroupKey, Vec<&'t T>)> {
    match group_by {
        GroupBy::None => vec![(GroupKey::All, sorted)],
        GroupBy::Space => {
            let mut by_space: HashMap<SpaceId, Vec<&T>> = HashMap::new();
            for item in sorted {
                by_space.entry(item.space_id()).or_default().push(item);
            }
            let mut seen = HashSet::new();
            ctx.spaces
                .iter()
                .filter(|space| seen.insert(space.id))
                .filter_map(|space| {
                    by_space
                        .remove(&space.id)
                        .map(|members| (GroupKey::Space(space.id), members))
                })
                .collect()
        }
    }
}
