//! Terminal UI for AlertView.
//!
//! This crate provides the Ratatui-based alert dashboard and the page
//! session behind it.
//!
//! ## Layers
//!
//! - [`cache`] - alert state with optimistic read tracking
//! - [`render`] - date-grouped projection of the cache
//! - [`filter`] - severity filter and badge counts
//! - [`session`] - owned per-view context wiring the above to a transport
//! - [`app`] - terminal shell
//!
//! ## Hotkeys
//!
//! - `o` / `a` / `Tab` - Overview, Alerts, cycle views
//! - `j` / `k` - Move selection
//! - `Enter` or `r` - Mark selected alert read
//! - `R` - Mark all read
//! - `0`-`3`, `f` - Severity filter
//! - `Ctrl+L` - Refresh now
//! - `?` - Help
//! - `q` - Quit

pub mod app;
pub mod cache;
pub mod event;
pub mod filter;
pub mod render;
pub mod session;
pub mod theme;
pub mod view;

pub use app::{App, AppResult};
pub use cache::{AlertCache, MarkTicket, MutationId};
pub use filter::{BadgeSource, FilteredView, PanelBadge, SidebarBadge};
pub use render::{AlertRenderer, AlertStyle, RenderedAlert, RenderedList, RowHandle};
pub use session::{AlertSession, Completion, Notice, NoticeLevel, PageMode};
pub use view::View;
