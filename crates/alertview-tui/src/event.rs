//! Event handling for the AlertView TUI.
//!
//! Maps keyboard input to [`AppEvent`]s.

use alertview_core::SeverityFilter;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::view::View;

/// Application-level events that can trigger state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Switch to a specific view
    SwitchView(View),
    /// Cycle to the next view
    NextView,
    /// Cycle to the previous view
    PrevView,
    ShowHelp,
    HideHelp,
    Quit,
    /// Force quit (Ctrl+C)
    ForceQuit,
    /// Fetch now instead of waiting for the next tick
    Refresh,
    Cancel,
    NavigateUp,
    NavigateDown,
    GoToTop,
    GoToBottom,
    /// Mark the selected alert read
    MarkRead,
    MarkAllRead,
    SetFilter(SeverityFilter),
    CycleFilter,
    /// No action needed
    None,
}

/// Input handler for converting key events to app events.
#[derive(Debug, Default)]
pub struct InputHandler;

impl InputHandler {
    pub fn new() -> Self {
        Self
    }

    /// Handle a key event and return the corresponding app event.
    pub fn handle_key(&mut self, key: KeyEvent) -> AppEvent {
        // Ctrl+C always force quits
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return AppEvent::ForceQuit;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('l') {
            return AppEvent::Refresh;
        }

        match key.code {
            KeyCode::Esc => AppEvent::Cancel,
            KeyCode::Char('q') | KeyCode::Char('Q') => AppEvent::Quit,
            KeyCode::Char('?') => AppEvent::ShowHelp,

            // Views
            KeyCode::Char('o') | KeyCode::Char('O') => AppEvent::SwitchView(View::Overview),
            KeyCode::Char('a') | KeyCode::Char('A') => AppEvent::SwitchView(View::Alerts),
            KeyCode::Tab => AppEvent::NextView,
            KeyCode::BackTab => AppEvent::PrevView,

            // List navigation
            KeyCode::Up | KeyCode::Char('k') => AppEvent::NavigateUp,
            KeyCode::Down | KeyCode::Char('j') => AppEvent::NavigateDown,
            KeyCode::Home | KeyCode::Char('g') => AppEvent::GoToTop,
            KeyCode::End | KeyCode::Char('G') => AppEvent::GoToBottom,

            // Alert actions
            KeyCode::Enter | KeyCode::Char('r') => AppEvent::MarkRead,
            KeyCode::Char('R') => AppEvent::MarkAllRead,

            // Severity filter
            KeyCode::Char('0') => AppEvent::SetFilter(SeverityFilter::All),
            KeyCode::Char('1') => AppEvent::SetFilter(SeverityFilter::High),
            KeyCode::Char('2') => AppEvent::SetFilter(SeverityFilter::Medium),
            KeyCode::Char('3') => AppEvent::SetFilter(SeverityFilter::Low),
            KeyCode::Char('f') | KeyCode::Char('F') => AppEvent::CycleFilter,

            _ => AppEvent::None,
        }
    }
}
