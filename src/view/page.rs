//! Projection output and per-group page windows.

use super::spec::ViewSpec;
use crate::types::SpaceId;
use serde::Serialize;
use std::collections::HashMap;

/// Identity of an output group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    /// The single group produced when grouping is off.
    All,
    Space(SpaceId),
}

/// One group of a projection, windowed to its current page size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group<T> {
    pub key: GroupKey,
    /// Space name for space groups.
    pub label: Option<String>,
    /// The visible slice, at most `window` items.
    pub items: Vec<T>,
    /// Items in this group after filtering.
    pub total: usize,
    pub window: usize,
    /// `total - items.len()`.
    pub remaining: usize,
}

impl<T> Group<T> {
    pub fn has_more(&self) -> bool {
        self.remaining > 0
    }
}

/// Non-empty groups in output order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupedPage<T> {
    pub groups: Vec<Group<T>>,
    /// Size of the filtered set; equals the sum of group totals.
    pub matched: usize,
}

/// Result of projecting a collection.
///
/// `Empty` (nothing to show at all) and `NoMatches` (everything filtered
/// out) are different states for the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Projection<T> {
    Empty,
    NoMatches,
    Page(GroupedPage<T>),
}

impl<T> Projection<T> {
    pub fn groups(&self) -> &[Group<T>] {
        match self {
            Projection::Page(page) => &page.groups,
            Projection::Empty | Projection::NoMatches => &[],
        }
    }

    pub fn group(&self, key: GroupKey) -> Option<&Group<T>> {
        self.groups().iter().find(|g| g.key == key)
    }

    pub fn matched(&self) -> usize {
        match self {
            Projection::Page(page) => page.matched,
            Projection::Empty | Projection::NoMatches => 0,
        }
    }

    /// Visible items across all groups, in output order.
    pub fn visible(&self) -> impl Iterator<Item = &T> {
        self.groups().iter().flat_map(|g| g.items.iter())
    }
}

/// Per-group "show more" state.
///
/// Each group starts at the spec's base window and grows by the same
/// increment independently of the others.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageWindows {
    expansions: HashMap<GroupKey, usize>,
}

impl PageWindows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Window for `key` given the spec's base window.
    pub fn window_for(&self, key: GroupKey, base: usize) -> usize {
        let expansions = self.expansions.get(&key).copied().unwrap_or(0);
        base.saturating_mul(expansions.saturating_add(1))
    }

    /// Advance one group's window by one increment.
    pub fn show_more(&mut self, key: GroupKey) {
        *self.expansions.entry(key).or_insert(0) += 1;
    }

    pub fn reset(&mut self) {
        self.expansions.clear();
    }
}

/// A spec together with the page windows opened under it.
///
/// Windows never outlive the spec they were opened under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSession {
    spec: ViewSpec,
    windows: PageWindows,
}

impl ViewSession {
    pub fn new(spec: ViewSpec) -> Self {
        Self {
            spec,
            windows: PageWindows::new(),
        }
    }

    pub fn spec(&self) -> &ViewSpec {
        &self.spec
    }

    pub fn windows(&self) -> &PageWindows {
        &self.windows
    }

    /// Replace the spec. Returns true, and resets every window, if it changed.
    pub fn set_spec(&mut self, spec: ViewSpec) -> bool {
        if spec == self.spec {
            return false;
        }
        self.spec = spec;
        self.windows.reset();
        true
    }

    pub fn show_more(&mut self, key: GroupKey) {
        self.windows.show_more(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_grow_per_group() {
        let mut windows = PageWindows::new();
        windows.show_more(GroupKey::Space(1));
        windows.show_more(GroupKey::Space(1));

        assert_eq!(windows.window_for(GroupKey::Space(1), 50), 150);
        assert_eq!(windows.window_for(GroupKey::Space(2), 50), 50);
    }

    #[test]
    fn changing_the_spec_resets_windows() {
        let mut session = ViewSession::new(ViewSpec::tasks());
        session.show_more(GroupKey::Space(3));

        assert!(!session.set_spec(ViewSpec::tasks()));
        assert_eq!(session.windows().window_for(GroupKey::Space(3), 10), 20);

        assert!(session.set_spec(ViewSpec::tasks().with_query("x")));
        assert_eq!(session.windows().window_for(GroupKey::Space(3), 10), 10);
    }
}
