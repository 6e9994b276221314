//! # alertview-client
//!
//! Transport to the remote alert store.
//!
//! This crate provides:
//! - [`AlertTransport`] - async trait for the four alert store calls
//! - [`HttpTransport`] - reqwest implementation
//! - [`MockTransport`] - scriptable in-memory store for tests
//! - [`TokenSource`] - anti-forgery token providers
//! - [`TransportError`] - uniform failure type
//!
//! ## Endpoints
//!
//! - `GET /alerts/` - alert list, newest first
//! - `GET /alerts/unread-count/` - `{"count": n}`
//! - `POST /alerts/{id}/mark-read/` - token required
//! - `POST /alerts/mark-all-read/` - token required

pub mod api_types;
pub mod error;
pub mod mock;
pub mod token;
pub mod transport;

pub use error::{Result, TransportError, TransportErrorKind};
pub use mock::{MockCall, MockOp, MockTransport};
pub use token::{CookieFileToken, StaticToken, TokenSource, token_source_from_config};
pub use transport::{AlertTransport, HttpTransport, mark_read_path};
