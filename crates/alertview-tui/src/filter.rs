//! Badge counts and severity filtering.
//!
//! Everything here is recomputed from the cache and the current
//! [`SeverityFilter`] on each change; nothing is updated incrementally.

use alertview_core::{AlertId, SeverityFilter};
use tracing::debug;

use crate::cache::AlertCache;
use crate::render::{DateGroup, RenderedList};

/// Filtered projection of a [`RenderedList`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredView {
    pub filter: SeverityFilter,
    /// Groups with at least one visible row
    pub groups: Vec<DateGroup>,
    pub visible_count: usize,
    /// Shown instead of groups when nothing is visible
    pub placeholder: Option<String>,
}

impl FilteredView {
    /// Visible alert ids in display order.
    pub fn row_ids(&self) -> Vec<AlertId> {
        self.groups
            .iter()
            .flat_map(|g| g.items.iter().map(|i| i.id))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.visible_count == 0
    }
}

/// Project a rendered list through a severity filter.
pub fn project(list: &RenderedList, filter: SeverityFilter) -> FilteredView {
    let groups: Vec<DateGroup> = list
        .groups
        .iter()
        .filter_map(|group| {
            let items: Vec<_> = group
                .items
                .iter()
                .filter(|item| filter.matches(item.severity))
                .cloned()
                .collect();
            (!items.is_empty()).then(|| DateGroup {
                label: group.label.clone(),
                items,
            })
        })
        .collect();

    let visible_count = groups.iter().map(|g| g.items.len()).sum();
    let placeholder = match (&list.placeholder, visible_count) {
        (Some(text), _) => Some(text.clone()),
        (None, 0) => Some(format!("No {} alerts", filter.label().to_lowercase())),
        (None, _) => None,
    };

    FilteredView {
        filter,
        groups,
        visible_count,
        placeholder,
    }
}

/// Panel badge: the cache's unread count, hidden at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelBadge {
    pub count: usize,
}

impl PanelBadge {
    pub fn from_cache(cache: &AlertCache) -> Self {
        Self {
            count: cache.unread_count(),
        }
    }

    /// Check if badge should be displayed.
    pub fn should_display(&self) -> bool {
        self.count > 0
    }

    /// Badge text, or `None` when hidden.
    pub fn text(&self) -> Option<String> {
        self.should_display().then(|| self.count.to_string())
    }
}

/// Where a sidebar badge takes its number from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeSource {
    /// Mirrors the alert cache (views with the full list)
    Cache,
    /// Populated from the unread-count endpoint
    Remote,
}

/// Sidebar badge bound to one source for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidebarBadge {
    source: BadgeSource,
    count: Option<usize>,
}

impl SidebarBadge {
    pub fn new(source: BadgeSource) -> Self {
        Self {
            source,
            count: None,
        }
    }

    pub fn source(&self) -> BadgeSource {
        self.source
    }

    /// Apply a count from `source`. Counts from the other source are
    /// ignored; returns whether the update was accepted.
    pub fn update(&mut self, source: BadgeSource, count: usize) -> bool {
        if source != self.source {
            debug!(
                badge = ?self.source,
                rejected = ?source,
                "sidebar badge ignored update from other source"
            );
            return false;
        }
        self.count = Some(count);
        true
    }

    /// Last accepted count; `None` before the first update.
    pub fn count(&self) -> Option<usize> {
        self.count
    }

    pub fn should_display(&self) -> bool {
        self.count.is_some_and(|c| c > 0)
    }

    pub fn text(&self) -> Option<String> {
        match self.count {
            Some(count) if count > 0 => Some(count.to_string()),
            _ => None,
        }
    }
}
