//! Colors for the AlertView TUI.

use ratatui::style::Color;

use crate::render::AlertStyle;
use crate::session::NoticeLevel;

/// Color palette.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    /// Primary headers and focused borders
    pub header: Color,
    /// Hotkey hints
    pub hotkey: Color,
    /// Normal text
    pub text: Color,
    /// Secondary text (timestamps, read alerts)
    pub text_dim: Color,
    /// Unfocused borders
    pub border_dim: Color,
    /// Selected row background
    pub selection: Color,
    /// Unread badge background
    pub badge: Color,
    pub severity_high: Color,
    pub severity_medium: Color,
    pub severity_low: Color,
    pub severity_unknown: Color,
    pub notice_info: Color,
    pub notice_warning: Color,
}

/// Complete theme definition.
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: ThemeColors,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            colors: ThemeColors {
                header: Color::Cyan,
                hotkey: Color::Yellow,
                text: Color::White,
                text_dim: Color::Gray,
                border_dim: Color::DarkGray,
                selection: Color::DarkGray,
                badge: Color::Red,
                severity_high: Color::Red,
                // Orange
                severity_medium: Color::Rgb(255, 165, 0),
                severity_low: Color::Blue,
                severity_unknown: Color::Gray,
                notice_info: Color::Green,
                notice_warning: Color::Yellow,
            },
        }
    }
}

impl Theme {
    /// Color for a rendered alert style.
    pub fn style_color(&self, style: AlertStyle) -> Color {
        match style {
            AlertStyle::Red => self.colors.severity_high,
            AlertStyle::Orange => self.colors.severity_medium,
            AlertStyle::Blue => self.colors.severity_low,
            AlertStyle::Gray => self.colors.severity_unknown,
        }
    }

    pub fn notice_color(&self, level: NoticeLevel) -> Color {
        match level {
            NoticeLevel::Info => self.colors.notice_info,
            NoticeLevel::Warning => self.colors.notice_warning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_colors_are_distinct() {
        let theme = Theme::default();
        let colors = [
            theme.style_color(AlertStyle::Red),
            theme.style_color(AlertStyle::Orange),
            theme.style_color(AlertStyle::Blue),
            theme.style_color(AlertStyle::Gray),
        ];
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
