//! Page session: the owned context behind one alert view.
//!
//! An [`AlertSession`] is created when a view is entered and dropped when the
//! user navigates away. It owns the [`AlertCache`], the filter selection, the
//! renderer and the badges. Transport calls run as tokio tasks and report back
//! through a single [`Completion`] channel; the UI thread drains that channel
//! and applies completions in the order they arrive, so the cache is never
//! touched from two places at once.
//!
//! The poll timer is an independent task. Each tick issues a fresh fetch even
//! if an earlier one has not returned; overlapping fetches all reconcile
//! through the cache's pending set.

use std::sync::Arc;
use std::time::Duration;

use alertview_client::{AlertTransport, TransportError};
use alertview_core::{Alert, AlertId, AlertViewConfig, SeverityFilter};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{AlertCache, MarkTicket};
use crate::filter::{self, BadgeSource, FilteredView, PanelBadge, SidebarBadge};
use crate::render::{AlertRenderer, RenderedAlert, RenderedList};

/// Which data a session loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    /// Full alert list; badges mirror the cache
    FullList,
    /// No list; the sidebar badge comes from the unread-count endpoint
    BadgeOnly,
}

/// Result of an asynchronous step, delivered back to the session.
#[derive(Debug)]
pub enum Completion {
    /// The poll timer fired
    PollTick,
    ListFetched {
        /// Sequence number of the fetch, in issue order
        seq: u64,
        result: Result<Vec<Alert>, TransportError>,
    },
    CountFetched {
        result: Result<usize, TransportError>,
    },
    MarkReadDone {
        ticket: MarkTicket,
        result: Result<(), TransportError>,
    },
    MarkAllDone {
        ticket: MarkTicket,
        result: Result<(), TransportError>,
    },
}

/// Notice severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// Transient message for the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// Owned state for one alert page.
pub struct AlertSession {
    transport: Arc<dyn AlertTransport>,
    runtime: Handle,
    mode: PageMode,
    poll_interval: Duration,

    cache: AlertCache,
    filter: SeverityFilter,
    renderer: AlertRenderer,
    rendered: RenderedList,
    view: FilteredView,
    sidebar: SidebarBadge,

    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    timer: Option<JoinHandle<()>>,

    /// Fetches issued so far
    issued_polls: u64,
    /// Highest fetch sequence applied
    applied_poll: u64,
    in_flight_polls: usize,
    notices: Vec<Notice>,
    dirty: bool,
}

impl AlertSession {
    /// Create a session. Nothing is fetched until [`AlertSession::start`].
    pub fn new(
        transport: Arc<dyn AlertTransport>,
        runtime: Handle,
        mode: PageMode,
        config: &AlertViewConfig,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let source = match mode {
            PageMode::FullList => BadgeSource::Cache,
            PageMode::BadgeOnly => BadgeSource::Remote,
        };
        let renderer = AlertRenderer::new(&config.display);
        let rendered = RenderedList::default();
        let view = filter::project(&rendered, SeverityFilter::All);

        Self {
            transport,
            runtime,
            mode,
            poll_interval: config.poll.interval(),
            cache: AlertCache::new(),
            filter: SeverityFilter::All,
            renderer,
            rendered,
            view,
            sidebar: SidebarBadge::new(source),
            tx,
            rx,
            timer: None,
            issued_polls: 0,
            applied_poll: 0,
            in_flight_polls: 0,
            notices: Vec::new(),
            dirty: true,
        }
    }

    /// Issue the first fetch and arm the poll timer.
    pub fn start(&mut self) {
        if self.timer.is_some() {
            return;
        }
        info!(
            mode = ?self.mode,
            transport = self.transport.name(),
            interval_secs = self.poll_interval.as_secs(),
            "alert session started"
        );
        self.rerender();
        self.poll_now();

        let tx = self.tx.clone();
        let period = self.poll_interval;
        self.timer = Some(self.runtime.spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(Completion::PollTick).is_err() {
                    break;
                }
            }
        }));
    }

    /// Issue a fetch now, independent of any fetch already in flight.
    pub fn poll_now(&mut self) {
        let transport = Arc::clone(&self.transport);
        let tx = self.tx.clone();

        match self.mode {
            PageMode::FullList => {
                self.issued_polls += 1;
                self.in_flight_polls += 1;
                let seq = self.issued_polls;
                debug!(seq, in_flight = self.in_flight_polls, "issuing alert list fetch");
                self.runtime.spawn(async move {
                    let result = transport.list_alerts().await;
                    deliver(&tx, Completion::ListFetched { seq, result });
                });
            }
            PageMode::BadgeOnly => {
                debug!("issuing unread count fetch");
                self.runtime.spawn(async move {
                    let result = transport.fetch_unread_count().await;
                    deliver(&tx, Completion::CountFetched { result });
                });
            }
        }
    }

    /// Change the filter selection and recompute the visible subset.
    pub fn set_filter(&mut self, filter: SeverityFilter) {
        if self.filter == filter {
            return;
        }
        debug!(filter = %filter, "filter changed");
        self.filter = filter;
        self.reproject();
    }

    /// Optimistically mark one alert read. Returns false if nothing was
    /// started because the alert is unknown or already read.
    pub fn mark_read(&mut self, id: AlertId) -> bool {
        let Some(ticket) = self.cache.begin_mark_read(id) else {
            debug!(alert_id = %id, "mark read ignored, alert unknown or already read");
            return false;
        };
        self.rerender();

        let transport = Arc::clone(&self.transport);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = transport.mark_read(id).await;
            deliver(&tx, Completion::MarkReadDone { ticket, result });
        });
        true
    }

    /// Optimistically mark every unread alert read.
    ///
    /// The request is sent even when the cache shows nothing unread, since
    /// the server may hold alerts the last poll did not return.
    pub fn mark_all_read(&mut self) -> bool {
        if self.mode == PageMode::BadgeOnly {
            return false;
        }
        let ticket = self.cache.begin_mark_all();
        debug!(mutation = %ticket.mutation, ids = ticket.ids.len(), "mark all read");
        if !ticket.ids.is_empty() {
            self.rerender();
        }

        let transport = Arc::clone(&self.transport);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = transport.mark_all_read().await;
            deliver(&tx, Completion::MarkAllDone { ticket, result });
        });
        true
    }

    /// Apply every completion that has already arrived. Returns whether
    /// anything visible changed.
    pub fn drain(&mut self) -> bool {
        while let Ok(completion) = self.rx.try_recv() {
            self.apply(completion);
        }
        self.take_dirty()
    }

    /// Wait for the next completion and apply it.
    pub async fn process_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(completion) => {
                self.apply(completion);
                true
            }
            None => false,
        }
    }

    /// Apply one completion to the session state.
    pub fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::PollTick => {
                debug!("poll tick");
                self.poll_now();
            }
            Completion::ListFetched { seq, result } => self.on_list_fetched(seq, result),
            Completion::CountFetched { result } => match result {
                Ok(count) => {
                    if self.sidebar.update(BadgeSource::Remote, count) {
                        self.dirty = true;
                    }
                }
                Err(e) => {
                    warn!(endpoint = e.endpoint(), error = %e, kind = %e.kind(), "unread count fetch failed");
                }
            },
            Completion::MarkReadDone { ticket, result } => match result {
                Ok(()) => {
                    self.cache.acknowledge(&ticket);
                }
                Err(e) => {
                    warn!(mutation = %ticket.mutation, endpoint = e.endpoint(), error = %e, kind = %e.kind(), "mark read failed");
                    // Nothing reverted: the server holds the alert read anyway.
                    if !self.cache.revert(&ticket).is_empty() {
                        self.rerender();
                        self.notify(Notice::warning(format!(
                            "Could not mark alert as read: {}",
                            e.friendly_message()
                        )));
                    }
                }
            },
            Completion::MarkAllDone { ticket, result } => match result {
                Ok(()) => {
                    self.cache.acknowledge(&ticket);
                    let marked = ticket.ids.len();
                    let message = if marked == 0 {
                        "All alerts marked as read".to_string()
                    } else {
                        format!(
                            "Marked {} alert{} as read",
                            marked,
                            if marked == 1 { "" } else { "s" }
                        )
                    };
                    self.notify(Notice::info(message));
                }
                Err(e) => {
                    warn!(mutation = %ticket.mutation, endpoint = e.endpoint(), error = %e, kind = %e.kind(), "mark all read failed");
                    if !self.cache.revert(&ticket).is_empty() {
                        self.rerender();
                    }
                    self.notify(Notice::warning(format!(
                        "Could not mark all alerts as read: {}",
                        e.friendly_message()
                    )));
                }
            },
        }
    }

    fn on_list_fetched(&mut self, seq: u64, result: Result<Vec<Alert>, TransportError>) {
        self.in_flight_polls = self.in_flight_polls.saturating_sub(1);
        match result {
            Ok(alerts) => {
                if seq < self.applied_poll {
                    debug!(
                        seq,
                        newest_applied = self.applied_poll,
                        "older fetch completed after a newer one"
                    );
                }
                self.applied_poll = self.applied_poll.max(seq);
                let summary = self.cache.replace(alerts);
                debug!(seq, generation = summary.generation, total = summary.total, "snapshot applied");
                self.rerender();
            }
            Err(e) => {
                warn!(seq, endpoint = e.endpoint(), error = %e, kind = %e.kind(), "alert list fetch failed, keeping previous state");
            }
        }
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
        self.dirty = true;
    }

    /// Re-render after a cache change, then re-project and refresh badges.
    fn rerender(&mut self) {
        self.rendered = self.renderer.render(&self.cache);
        if self.cache.is_loaded() {
            self.sidebar
                .update(BadgeSource::Cache, self.cache.unread_count());
        }
        self.reproject();
    }

    fn reproject(&mut self) {
        self.view = filter::project(&self.rendered, self.filter);
        self.dirty = true;
    }

    fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    // ============================================================
    // Accessors
    // ============================================================

    pub fn mode(&self) -> PageMode {
        self.mode
    }

    pub fn cache(&self) -> &AlertCache {
        &self.cache
    }

    pub fn filter(&self) -> SeverityFilter {
        self.filter
    }

    /// Full rendered list (before filtering).
    pub fn rendered(&self) -> &RenderedList {
        &self.rendered
    }

    /// Filtered projection currently on screen.
    pub fn view(&self) -> &FilteredView {
        &self.view
    }

    /// Rendered row for `id`, looked up through the renderer's handle map.
    pub fn row(&self, id: AlertId) -> Option<&RenderedAlert> {
        self.renderer
            .handle(id)
            .and_then(|handle| self.rendered.get(handle))
    }

    pub fn panel_badge(&self) -> PanelBadge {
        PanelBadge::from_cache(&self.cache)
    }

    pub fn sidebar_badge(&self) -> SidebarBadge {
        self.sidebar
    }

    /// Fetches issued but not yet completed.
    pub fn in_flight_polls(&self) -> usize {
        self.in_flight_polls
    }

    pub fn is_started(&self) -> bool {
        self.timer.is_some()
    }

    /// Take pending notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

impl Drop for AlertSession {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        debug!(mode = ?self.mode, "alert session closed");
    }
}

/// Send a completion; a closed channel means the session is gone.
fn deliver(tx: &mpsc::UnboundedSender<Completion>, completion: Completion) {
    if tx.send(completion).is_err() {
        debug!("session closed, dropping completion");
    }
}
