//! Date-grouped projection of the alert cache.
//!
//! [`AlertRenderer`] turns the cache contents into a [`RenderedList`]: groups
//! keyed by the formatted calendar date in the viewer's time zone, each row
//! carrying a style, a time-of-day label, an optional device tag and a
//! mark-read affordance when the alert is still unread. The renderer owns no
//! alert state; it only remembers where each id landed in the last render.

use std::collections::HashMap;
use std::fmt::Display;

use alertview_core::{Alert, AlertId, DisplayConfig, Severity};
use chrono::{Local, TimeZone};

use crate::cache::AlertCache;

/// Placeholder shown when the cache holds no alerts.
pub const NO_ALERTS: &str = "No alerts";

/// Visual style derived from severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertStyle {
    Red,
    Orange,
    Blue,
    Gray,
}

impl From<Severity> for AlertStyle {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::High => AlertStyle::Red,
            Severity::Medium => AlertStyle::Orange,
            Severity::Low => AlertStyle::Blue,
            Severity::Unknown => AlertStyle::Gray,
        }
    }
}

/// The "mark as read" affordance on an unread row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkReadAction {
    pub id: AlertId,
}

/// One rendered alert row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedAlert {
    pub id: AlertId,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub style: AlertStyle,
    /// Time of day in the viewer's time zone
    pub time: String,
    pub device: Option<String>,
    /// Present iff the alert is unread
    pub mark_read: Option<MarkReadAction>,
}

impl RenderedAlert {
    pub fn is_unread(&self) -> bool {
        self.mark_read.is_some()
    }
}

/// Alerts sharing one formatted date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateGroup {
    pub label: String,
    pub items: Vec<RenderedAlert>,
}

/// Output of one render pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedList {
    pub groups: Vec<DateGroup>,
    /// Set only when there are no alerts at all
    pub placeholder: Option<String>,
}

impl RenderedList {
    /// Total rendered rows across groups.
    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|g| g.items.len()).sum()
    }

    /// Rows in display order.
    pub fn rows(&self) -> impl Iterator<Item = &RenderedAlert> + '_ {
        self.groups.iter().flat_map(|g| g.items.iter())
    }

    /// Row at a handle from the render that produced this list.
    pub fn get(&self, handle: RowHandle) -> Option<&RenderedAlert> {
        self.groups
            .get(handle.group)
            .and_then(|g| g.items.get(handle.item))
    }
}

/// Position of an alert in the last rendered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowHandle {
    pub group: usize,
    pub item: usize,
    /// Index across all groups
    pub row: usize,
}

/// Renders cache contents and tracks id → row handles.
#[derive(Debug, Clone)]
pub struct AlertRenderer {
    date_format: String,
    time_format: String,
    handles: HashMap<AlertId, RowHandle>,
}

impl AlertRenderer {
    pub fn new(display: &DisplayConfig) -> Self {
        Self {
            date_format: display.date_format.clone(),
            time_format: display.time_format.clone(),
            handles: HashMap::new(),
        }
    }

    /// Render the cache in the local time zone.
    pub fn render(&mut self, cache: &AlertCache) -> RenderedList {
        self.render_in(cache.alerts(), &Local)
    }

    /// Render alerts (in server order) in an explicit time zone.
    pub fn render_in<'a, I, Tz>(&mut self, alerts: I, tz: &Tz) -> RenderedList
    where
        I: IntoIterator<Item = &'a Alert>,
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.handles.clear();
        let mut groups: Vec<DateGroup> = Vec::new();
        let mut group_index: HashMap<String, usize> = HashMap::new();
        let mut row = 0;

        for alert in alerts {
            let local = alert.timestamp.with_timezone(tz);
            let label = local.format(&self.date_format).to_string();

            let group = *group_index.entry(label.clone()).or_insert_with(|| {
                groups.push(DateGroup {
                    label,
                    items: Vec::new(),
                });
                groups.len() - 1
            });

            let items = &mut groups[group].items;
            self.handles.insert(
                alert.id,
                RowHandle {
                    group,
                    item: items.len(),
                    row,
                },
            );
            items.push(RenderedAlert {
                id: alert.id,
                title: alert.title.clone(),
                message: alert.message.clone(),
                severity: alert.severity,
                style: AlertStyle::from(alert.severity),
                time: local.format(&self.time_format).to_string(),
                device: alert.device_name.clone(),
                mark_read: (!alert.is_read).then_some(MarkReadAction { id: alert.id }),
            });
            row += 1;
        }

        let placeholder = groups.is_empty().then(|| NO_ALERTS.to_string());
        RenderedList {
            groups,
            placeholder,
        }
    }

    /// Where `id` landed in the last render.
    pub fn handle(&self, id: AlertId) -> Option<RowHandle> {
        self.handles.get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn at(day: u32, hour: u32, minute: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, minute, 0).unwrap()
    }

    fn renderer() -> AlertRenderer {
        AlertRenderer::new(&DisplayConfig::default())
    }

    #[test]
    fn test_empty_renders_placeholder() {
        let list = renderer().render_in(std::iter::empty::<&Alert>(), &Utc);
        assert!(list.groups.is_empty());
        assert_eq!(list.placeholder.as_deref(), Some(NO_ALERTS));
        assert_eq!(list.row_count(), 0);
    }

    #[test]
    fn test_same_date_grouped_in_fetch_order() {
        // Later timestamp served first: order must not be re-sorted.
        let alerts = vec![
            Alert::new(2, "late", Severity::High, at(1, 22, 30)),
            Alert::new(1, "early", Severity::Low, at(1, 8, 0)),
            Alert::new(3, "next day", Severity::Medium, at(2, 9, 0)),
        ];
        let mut r = renderer();
        let list = r.render_in(&alerts, &Utc);

        assert_eq!(list.groups.len(), 2);
        assert_eq!(list.groups[0].label, "Sat Mar 1 2025");
        let ids: Vec<_> = list.groups[0].items.iter().map(|i| i.id.0).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(list.groups[1].items[0].id, AlertId(3));
        assert!(list.placeholder.is_none());
    }

    #[test]
    fn test_grouping_uses_viewer_time_zone() {
        let alerts = vec![
            Alert::new(1, "a", Severity::Low, at(1, 23, 0)),
            Alert::new(2, "b", Severity::Low, at(2, 1, 0)),
        ];
        let mut r = renderer();

        assert_eq!(r.render_in(&alerts, &Utc).groups.len(), 2);

        let west = FixedOffset::west_opt(5 * 3600).unwrap();
        let list = r.render_in(&alerts, &west);
        assert_eq!(list.groups.len(), 1);
        assert_eq!(list.groups[0].label, "Sat Mar 1 2025");
        assert_eq!(list.groups[0].items[0].time, "18:00");
        assert_eq!(list.groups[0].items[1].time, "20:00");
    }

    #[test]
    fn test_interleaved_dates_keep_first_occurrence_order() {
        let alerts = vec![
            Alert::new(1, "a", Severity::Low, at(2, 9, 0)),
            Alert::new(2, "b", Severity::Low, at(1, 9, 0)),
            Alert::new(3, "c", Severity::Low, at(2, 7, 0)),
        ];
        let list = renderer().render_in(&alerts, &Utc);
        assert_eq!(list.groups.len(), 2);
        let first: Vec<_> = list.groups[0].items.iter().map(|i| i.id.0).collect();
        assert_eq!(first, vec![1, 3]);
    }

    #[test]
    fn test_styles_by_severity() {
        assert_eq!(AlertStyle::from(Severity::High), AlertStyle::Red);
        assert_eq!(AlertStyle::from(Severity::Medium), AlertStyle::Orange);
        assert_eq!(AlertStyle::from(Severity::Low), AlertStyle::Blue);
        assert_eq!(AlertStyle::from(Severity::Unknown), AlertStyle::Gray);
    }

    #[test]
    fn test_mark_read_affordance_only_on_unread() {
        let alerts = vec![
            Alert::new(1, "unread", Severity::High, at(1, 8, 0)),
            Alert::new(2, "read", Severity::High, at(1, 9, 0)).with_read(true),
        ];
        let list = renderer().render_in(&alerts, &Utc);
        let items = &list.groups[0].items;
        assert_eq!(items[0].mark_read, Some(MarkReadAction { id: AlertId(1) }));
        assert!(items[1].mark_read.is_none());
        assert!(!items[1].is_unread());
    }

    #[test]
    fn test_device_tag_and_time() {
        let alerts = vec![
            Alert::new(1, "t", Severity::Low, at(1, 14, 5)).with_device("greenhouse-1", None),
        ];
        let list = renderer().render_in(&alerts, &Utc);
        let item = &list.groups[0].items[0];
        assert_eq!(item.device.as_deref(), Some("greenhouse-1"));
        assert_eq!(item.time, "14:05");
    }

    #[test]
    fn test_handles_track_positions() {
        let alerts = vec![
            Alert::new(1, "a", Severity::Low, at(2, 9, 0)),
            Alert::new(2, "b", Severity::Low, at(1, 9, 0)),
            Alert::new(3, "c", Severity::Low, at(1, 8, 0)),
        ];
        let mut r = renderer();
        let list = r.render_in(&alerts, &Utc);

        let handle = r.handle(AlertId(3)).unwrap();
        assert_eq!(
            handle,
            RowHandle {
                group: 1,
                item: 1,
                row: 2
            }
        );
        assert_eq!(list.get(handle).unwrap().id, AlertId(3));

        r.render_in(&alerts[..1], &Utc);
        assert!(r.handle(AlertId(3)).is_none());
    }

    #[test]
    fn test_render_from_cache() {
        let mut cache = AlertCache::new();
        cache.replace(vec![Alert::new(1, "a", Severity::High, at(1, 9, 0))]);
        let list = renderer().render(&cache);
        assert_eq!(list.row_count(), 1);
    }
}
