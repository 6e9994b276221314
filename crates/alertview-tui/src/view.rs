//! View types and navigation for the AlertView TUI.

use std::fmt;

use crate::session::PageMode;

/// Available views in the dashboard.
///
/// Each view owns its own alert session; switching views discards the old
/// session and starts a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Summary with the unread badge only
    #[default]
    Overview,
    /// Full alert list
    Alerts,
}

impl View {
    /// All views in display order (for Tab cycling).
    pub const ALL: [View; 2] = [View::Overview, View::Alerts];

    /// Returns the hotkey character for this view.
    pub fn hotkey(&self) -> char {
        match self {
            View::Overview => 'o',
            View::Alerts => 'a',
        }
    }

    /// Returns the display title for this view.
    pub fn title(&self) -> &'static str {
        match self {
            View::Overview => "Overview",
            View::Alerts => "Alerts",
        }
    }

    /// Returns the hotkey hint for status bar display.
    pub fn hotkey_hint(&self) -> String {
        format!("[{}] {}", self.hotkey(), self.title())
    }

    /// What the view's session loads.
    pub fn page_mode(&self) -> PageMode {
        match self {
            View::Overview => PageMode::BadgeOnly,
            View::Alerts => PageMode::FullList,
        }
    }

    /// Returns the next view in the cycle (for Tab navigation).
    pub fn next(&self) -> View {
        let idx = Self::ALL.iter().position(|v| v == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Returns the previous view in the cycle (for Shift+Tab navigation).
    pub fn prev(&self) -> View {
        let idx = Self::ALL.iter().position(|v| v == self).unwrap_or(0);
        if idx == 0 {
            Self::ALL[Self::ALL.len() - 1]
        } else {
            Self::ALL[idx - 1]
        }
    }

    /// Try to parse a view from a hotkey character.
    pub fn from_hotkey(key: char) -> Option<View> {
        match key.to_ascii_lowercase() {
            'o' => Some(View::Overview),
            'a' => Some(View::Alerts),
            _ => None,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_cycle() {
        assert_eq!(View::Overview.next(), View::Alerts);
        assert_eq!(View::Alerts.next(), View::Overview);
        assert_eq!(View::Overview.prev(), View::Alerts);
    }

    #[test]
    fn test_view_hotkeys() {
        for view in View::ALL {
            assert_eq!(View::from_hotkey(view.hotkey()), Some(view));
        }
        assert_eq!(View::from_hotkey('A'), Some(View::Alerts));
        assert_eq!(View::from_hotkey('x'), None);
        assert_eq!(View::Alerts.hotkey_hint(), "[a] Alerts");
    }

    #[test]
    fn test_page_modes() {
        assert_eq!(View::Overview.page_mode(), PageMode::BadgeOnly);
        assert_eq!(View::Alerts.page_mode(), PageMode::FullList);
    }
}
