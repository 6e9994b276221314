//! Main application state and logic for the AlertView TUI.
//!
//! The `App` owns the tokio runtime, the active view and that view's
//! [`AlertSession`]. Switching views drops the session (stopping its poll
//! timer) and starts a fresh one for the new view.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use alertview_client::AlertTransport;
use alertview_core::{AlertId, AlertViewConfig, AlertViewError};
use chrono::Local;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tracing::{debug, info};

use crate::event::{AppEvent, InputHandler};
use crate::session::{AlertSession, NoticeLevel};
use crate::theme::Theme;
use crate::view::View;

/// Result type for app operations.
pub type AppResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Target frame rate.
const TARGET_FPS: u64 = 30;
const FRAME_DURATION: Duration = Duration::from_millis(1000 / TARGET_FPS);

/// Main application state.
pub struct App {
    /// Session for the current view; dropped before the runtime
    session: AlertSession,
    runtime: tokio::runtime::Runtime,
    config: AlertViewConfig,
    transport: Arc<dyn AlertTransport>,
    current_view: View,
    input_handler: InputHandler,
    should_quit: bool,
    show_help: bool,
    /// Latest notice for the footer
    status_message: Option<(NoticeLevel, String)>,
    /// Selected row in the filtered list
    selected: usize,
    theme: Theme,
    /// Dirty flag - whether UI needs redraw
    dirty: bool,
    last_draw: Instant,
}

impl App {
    /// Create the app and start the session for the default view.
    pub fn new(
        config: AlertViewConfig,
        transport: Arc<dyn AlertTransport>,
    ) -> alertview_core::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("alertview-io")
            .enable_all()
            .build()
            .map_err(|e| AlertViewError::Runtime {
                message: e.to_string(),
            })?;

        let current_view = View::default();
        let session = Self::open_session(&runtime, &transport, &config, current_view);

        Ok(Self {
            session,
            runtime,
            config,
            transport,
            current_view,
            input_handler: InputHandler::new(),
            should_quit: false,
            show_help: false,
            status_message: None,
            selected: 0,
            theme: Theme::default(),
            dirty: true,
            last_draw: Instant::now(),
        })
    }

    fn open_session(
        runtime: &tokio::runtime::Runtime,
        transport: &Arc<dyn AlertTransport>,
        config: &AlertViewConfig,
        view: View,
    ) -> AlertSession {
        let mut session = AlertSession::new(
            Arc::clone(transport),
            runtime.handle().clone(),
            view.page_mode(),
            config,
        );
        session.start();
        session
    }

    /// Returns the current view.
    pub fn current_view(&self) -> View {
        self.current_view
    }

    pub fn session(&self) -> &AlertSession {
        &self.session
    }

    /// Returns whether the app should quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_ref().map(|(_, msg)| msg.as_str())
    }

    /// Id of the selected row, if any.
    pub fn selected_id(&self) -> Option<AlertId> {
        self.session.view().row_ids().get(self.selected).copied()
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Switch to a different view, replacing the session.
    pub fn switch_view(&mut self, view: View) {
        if view == self.current_view {
            return;
        }
        info!(from = %self.current_view, to = %view, "switching view");
        self.current_view = view;
        self.session = Self::open_session(&self.runtime, &self.transport, &self.config, view);
        self.selected = 0;
        self.status_message = None;
        self.mark_dirty();
    }

    /// Handle a key event.
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if self.show_help {
            self.show_help = false;
            self.mark_dirty();
            return;
        }
        let event = self.input_handler.handle_key(key);
        self.handle_app_event(event);
    }

    /// Handle an application event.
    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::SwitchView(view) => self.switch_view(view),
            AppEvent::NextView => self.switch_view(self.current_view.next()),
            AppEvent::PrevView => self.switch_view(self.current_view.prev()),
            AppEvent::ShowHelp => self.show_help = true,
            AppEvent::HideHelp | AppEvent::Cancel => self.show_help = false,
            AppEvent::Quit | AppEvent::ForceQuit => self.should_quit = true,
            AppEvent::Refresh => {
                self.session.poll_now();
                self.status_message = Some((NoticeLevel::Info, "Refreshing...".to_string()));
            }
            AppEvent::NavigateUp => self.selected = self.selected.saturating_sub(1),
            AppEvent::NavigateDown => self.selected += 1,
            AppEvent::GoToTop => self.selected = 0,
            AppEvent::GoToBottom => self.selected = usize::MAX,
            AppEvent::MarkRead => self.mark_selected_read(),
            AppEvent::MarkAllRead => {
                if self.current_view == View::Alerts {
                    self.session.mark_all_read();
                }
            }
            AppEvent::SetFilter(filter) => self.session.set_filter(filter),
            AppEvent::CycleFilter => {
                let next = self.session.filter().next();
                self.session.set_filter(next);
            }
            AppEvent::None => return,
        }
        self.clamp_selection();
        self.mark_dirty();
    }

    fn mark_selected_read(&mut self) {
        if self.current_view != View::Alerts {
            return;
        }
        let Some(id) = self.selected_id() else {
            return;
        };
        if !self.session.mark_read(id) {
            debug!(alert_id = %id, "selected alert already read");
        }
    }

    fn clamp_selection(&mut self) {
        let rows = self.session.view().visible_count;
        self.selected = self.selected.min(rows.saturating_sub(1));
    }

    /// Apply finished network work and pick up notices.
    pub fn poll_session(&mut self) {
        if self.session.drain() {
            self.absorb_notices();
            self.clamp_selection();
            self.mark_dirty();
        }
    }

    fn absorb_notices(&mut self) {
        if let Some(notice) = self.session.take_notices().pop() {
            self.status_message = Some((notice.level, notice.message));
        }
    }

    /// Run the main application loop.
    pub fn run(&mut self) -> AppResult<()> {
        crossterm::terminal::enable_raw_mode().map_err(|e| AlertViewError::TerminalInit {
            message: e.to_string(),
        })?;
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_loop(&mut terminal);

        // Restore terminal
        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(
            terminal.backend_mut(),
            crossterm::terminal::LeaveAlternateScreen
        )?;
        terminal.show_cursor()?;

        result
    }

    /// The inner event loop with frame-rate limiting.
    fn run_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> AppResult<()> {
        while !self.should_quit {
            let frame_start = Instant::now();

            self.poll_session();

            // Redraw at least once a second so the clock stays current
            let needs_redraw =
                self.take_dirty() || self.last_draw.elapsed() >= Duration::from_secs(1);
            if needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                self.last_draw = Instant::now();
            }

            let timeout = FRAME_DURATION.saturating_sub(frame_start.elapsed());
            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key_event(key)
                    }
                    Event::Resize(_, _) => self.mark_dirty(),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Draw the UI.
    pub fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();

        // Main layout: header, content, footer
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(5),    // Content
                Constraint::Length(2), // Footer
            ])
            .split(area);

        self.draw_header(frame, chunks[0]);
        match self.current_view {
            View::Overview => self.draw_overview(frame, chunks[1]),
            View::Alerts => self.draw_alerts(frame, chunks[1]),
        }
        self.draw_footer(frame, chunks[2]);

        if self.show_help {
            self.draw_help_overlay(frame, area);
        }
    }

    /// Header with view tabs and the sidebar badge.
    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let colors = &self.theme.colors;
        let mut spans = vec![Span::styled(
            " AlertView ",
            Style::default()
                .fg(colors.header)
                .add_modifier(Modifier::BOLD),
        )];

        for view in View::ALL {
            let style = if view == self.current_view {
                Style::default()
                    .fg(colors.header)
                    .add_modifier(Modifier::UNDERLINED)
            } else {
                Style::default().fg(colors.text_dim)
            };
            spans.push(Span::raw(" "));
            spans.push(Span::styled(view.hotkey_hint(), style));
            if view == View::Alerts {
                if let Some(text) = self.session.sidebar_badge().text() {
                    spans.push(Span::styled(
                        format!(" {} ", text),
                        Style::default()
                            .fg(Color::White)
                            .bg(colors.badge)
                            .add_modifier(Modifier::BOLD),
                    ));
                }
            }
        }

        let now = Local::now().format("%H:%M:%S").to_string();
        let used: usize = spans.iter().map(|s| s.width()).sum();
        let spacing = (area.width as usize).saturating_sub(used + now.len() + 3);
        spans.push(Span::raw(" ".repeat(spacing)));
        spans.push(Span::styled(now, Style::default().fg(colors.text_dim)));

        let header = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colors.border_dim)),
        );
        frame.render_widget(header, area);
    }

    fn draw_overview(&self, frame: &mut Frame, area: Rect) {
        let colors = &self.theme.colors;
        let badge = self.session.sidebar_badge();
        let summary = match badge.count() {
            None => "Loading...".to_string(),
            Some(0) => "No unread alerts".to_string(),
            Some(1) => "1 unread alert".to_string(),
            Some(n) => format!("{} unread alerts", n),
        };

        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                summary,
                Style::default().fg(colors.text).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press [a] to open the alert list.",
                Style::default().fg(colors.text_dim),
            )),
        ];

        let panel = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colors.border_dim))
                .title(" Overview "),
        );
        frame.render_widget(panel, area);
    }

    fn draw_alerts(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        self.draw_alert_list(frame, chunks[0]);
        self.draw_detail(frame, chunks[1]);
    }

    fn draw_alert_list(&self, frame: &mut Frame, area: Rect) {
        let colors = &self.theme.colors;
        let view = self.session.view();

        let mut title = vec![Span::styled(
            format!(" Alerts [{}] ", view.filter),
            Style::default()
                .fg(colors.header)
                .add_modifier(Modifier::BOLD),
        )];
        if let Some(text) = self.session.panel_badge().text() {
            title.push(Span::styled(
                format!(" {} unread ", text),
                Style::default().fg(Color::White).bg(colors.badge),
            ));
        }

        let mut lines: Vec<Line> = Vec::new();
        let mut selected_line = 0;
        let selected_id = self.selected_id();

        if let Some(placeholder) = &view.placeholder {
            lines.push(Line::from(Span::styled(
                placeholder.clone(),
                Style::default().fg(colors.text_dim),
            )));
        }

        for group in &view.groups {
            lines.push(Line::from(Span::styled(
                group.label.clone(),
                Style::default()
                    .fg(colors.header)
                    .add_modifier(Modifier::BOLD),
            )));
            for item in &group.items {
                let color = self.theme.style_color(item.style);
                let (marker, text_style) = if item.is_unread() {
                    ("●", Style::default().fg(colors.text).add_modifier(Modifier::BOLD))
                } else {
                    (" ", Style::default().fg(colors.text_dim))
                };

                let mut spans = vec![
                    Span::styled(format!(" {} ", marker), Style::default().fg(color)),
                    Span::styled(
                        format!("{} ", item.severity.indicator()),
                        Style::default().fg(color),
                    ),
                    Span::styled(format!("{} ", item.time), Style::default().fg(colors.text_dim)),
                ];
                if let Some(device) = &item.device {
                    spans.push(Span::styled(
                        format!("[{}] ", device),
                        Style::default().fg(colors.hotkey),
                    ));
                }
                spans.push(Span::styled(item.title.clone(), text_style));

                let mut line = Line::from(spans);
                if Some(item.id) == selected_id {
                    selected_line = lines.len();
                    line = line.style(Style::default().bg(colors.selection));
                }
                lines.push(line);
            }
        }

        let visible = area.height.saturating_sub(2) as usize;
        let scroll = (selected_line + 1).saturating_sub(visible) as u16;

        let list = Paragraph::new(lines).scroll((scroll, 0)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colors.header))
                .title(Line::from(title)),
        );
        frame.render_widget(list, area);
    }

    fn draw_detail(&self, frame: &mut Frame, area: Rect) {
        let colors = &self.theme.colors;
        let mut lines: Vec<Line> = Vec::new();

        let selected = self
            .selected_id()
            .and_then(|id| self.session.cache().get(id).zip(self.session.row(id)));

        match selected {
            Some((alert, row)) => {
                let color = self.theme.style_color(row.style);
                let label = |text: &'static str| {
                    Span::styled(format!("{:<9}", text), Style::default().fg(colors.text_dim))
                };
                lines.push(Line::from(Span::styled(
                    alert.title.clone(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(""));
                lines.push(Line::from(vec![
                    label("Severity"),
                    Span::styled(alert.severity.label(), Style::default().fg(color)),
                ]));
                lines.push(Line::from(vec![
                    label("Time"),
                    Span::raw(
                        alert
                            .timestamp
                            .with_timezone(&Local)
                            .format("%Y-%m-%d %H:%M:%S")
                            .to_string(),
                    ),
                ]));
                if let Some(device) = &alert.device_name {
                    let device = match &alert.device_id {
                        Some(device_id) => format!("{} ({})", device, device_id),
                        None => device.clone(),
                    };
                    lines.push(Line::from(vec![label("Device"), Span::raw(device)]));
                }
                let status = match (row.is_unread(), self.session.cache().is_pending(alert.id)) {
                    (true, _) => "Unread  [Enter] mark read",
                    (false, true) => "Read (saving...)",
                    (false, false) => "Read",
                };
                lines.push(Line::from(vec![label("Status"), Span::raw(status)]));
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    alert.message.clone(),
                    Style::default().fg(colors.text),
                )));
            }
            None => lines.push(Line::from(Span::styled(
                "No alert selected",
                Style::default().fg(colors.text_dim),
            ))),
        }

        let detail = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colors.border_dim))
                .title(" Detail "),
        );
        frame.render_widget(detail, area);
    }

    /// Footer with hotkey hints, or the latest notice.
    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let colors = &self.theme.colors;
        let line = match &self.status_message {
            Some((level, message)) => Line::from(Span::styled(
                message.clone(),
                Style::default().fg(self.theme.notice_color(*level)),
            )),
            None => {
                let hotkey_style = Style::default().fg(colors.hotkey);
                let mut hints = vec![
                    Span::styled("[Tab]", hotkey_style),
                    Span::raw("View "),
                ];
                if self.current_view == View::Alerts {
                    hints.extend([
                        Span::styled("[Enter]", hotkey_style),
                        Span::raw("Mark read "),
                        Span::styled("[R]", hotkey_style),
                        Span::raw("Mark all "),
                        Span::styled("[0-3]", hotkey_style),
                        Span::raw("Filter "),
                    ]);
                }
                hints.extend([
                    Span::styled("[?]", hotkey_style),
                    Span::raw("Help "),
                    Span::styled("[q]", hotkey_style),
                    Span::raw("Quit"),
                ]);
                Line::from(hints)
            }
        };

        let footer = Paragraph::new(line)
            .style(Style::default().fg(colors.text_dim))
            .block(Block::default().borders(Borders::TOP));
        frame.render_widget(footer, area);
    }

    fn draw_help_overlay(&self, frame: &mut Frame, area: Rect) {
        let colors = &self.theme.colors;
        let overlay_width = 52.min(area.width.saturating_sub(4));
        let overlay_height = 22.min(area.height.saturating_sub(2));
        let overlay_x = (area.width - overlay_width) / 2;
        let overlay_y = (area.height - overlay_height) / 2;
        let overlay_area = Rect::new(overlay_x, overlay_y, overlay_width, overlay_height);

        frame.render_widget(Clear, overlay_area);

        let help_text = "\
AlertView Hotkey Reference

Views:
  o        Overview
  a        Alerts
  Tab      Cycle views

Alerts:
  ↑ k      Move up
  ↓ j      Move down
  Enter r  Mark selected read
  R        Mark all read
  0 1 2 3  Filter all/high/medium/low
  f        Cycle filter

General:
  Ctrl+L   Refresh now
  ?        Show this help
  q        Quit

Press any key to close this help.";

        let help = Paragraph::new(help_text)
            .style(Style::default().fg(colors.text))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(colors.header))
                    .title(Span::styled(
                        " Help ",
                        Style::default()
                            .fg(colors.header)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .style(Style::default().bg(Color::Black)),
            )
            .wrap(Wrap { trim: false });

        frame.render_widget(help, overlay_area);
    }

    /// Block until the session has applied one more completion.
    #[cfg(test)]
    fn settle(&mut self) {
        self.runtime.block_on(self.session.process_next());
        self.absorb_notices();
        self.clamp_selection();
    }
}
