//! # alertview-core
//!
//! Core types, errors, configuration and logging for AlertView.
//!
//! This crate provides:
//! - [`Alert`], [`Severity`], [`SeverityFilter`] - the shared alert model
//! - [`AlertViewError`] - error type for configuration and terminal setup
//! - [`config`] - YAML configuration with environment overrides
//! - [`logging`] - tracing setup
//!
//! ## Example
//!
//! ```no_run
//! use alertview_core::{AlertViewConfig, logging};
//!
//! fn main() -> alertview_core::Result<()> {
//!     let _guard = logging::init_logging(None, false)?;
//!     let config = AlertViewConfig::load_or_default()?;
//!     config.validate()?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::{AlertViewConfig, DisplayConfig, PollConfig, ServerConfig};
pub use error::{AlertViewError, Result};
pub use logging::{LogGuard, init_logging};
pub use types::{Alert, AlertId, Severity, SeverityFilter};
