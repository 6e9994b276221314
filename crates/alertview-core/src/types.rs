//! Shared type definitions used across AlertView crates.
//!
//! The alert model mirrors the JSON objects served by the remote alert store,
//! so the transport, the cache and the renderer all agree on one shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned alert identifier.
///
/// Stable for the lifetime of an alert and never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(pub i64);

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for AlertId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Alert severity as reported by the server.
///
/// Anything the server sends that is not `high`, `medium` or `low`
/// (including a missing value) maps to [`Severity::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Severity {
    /// Parse a wire value. Matching ignores case and surrounding whitespace.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Unknown,
        }
    }

    /// Returns the wire/display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unknown => "unknown",
        }
    }

    /// Returns the status indicator for TUI display.
    pub fn indicator(&self) -> &'static str {
        match self {
            Self::High => "✖",
            Self::Medium => "⚠",
            Self::Low => "ℹ",
            Self::Unknown => "•",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single alert record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub title: String,
    pub message: String,
    /// Server clock.
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    pub is_read: bool,
}

impl Alert {
    /// Create an unread alert with no device association.
    pub fn new(
        id: impl Into<AlertId>,
        title: impl Into<String>,
        severity: Severity,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            message: String::new(),
            timestamp,
            severity,
            device_name: None,
            device_id: None,
            is_read: false,
        }
    }

    /// Set the message body.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach a device.
    pub fn with_device(mut self, name: impl Into<String>, device_id: Option<String>) -> Self {
        self.device_name = Some(name.into());
        self.device_id = device_id;
        self
    }

    /// Set the read flag.
    pub fn with_read(mut self, is_read: bool) -> Self {
        self.is_read = is_read;
        self
    }
}

/// Severity filter applied to the alert list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SeverityFilter {
    #[default]
    All,
    High,
    Medium,
    Low,
}

impl SeverityFilter {
    /// All filters in cycle order.
    pub const ALL: [SeverityFilter; 4] = [
        SeverityFilter::All,
        SeverityFilter::High,
        SeverityFilter::Medium,
        SeverityFilter::Low,
    ];

    /// Whether an alert of `severity` is visible under this filter.
    ///
    /// `Unknown` severities only show under [`SeverityFilter::All`].
    pub fn matches(&self, severity: Severity) -> bool {
        match self {
            Self::All => true,
            Self::High => severity == Severity::High,
            Self::Medium => severity == Severity::Medium,
            Self::Low => severity == Severity::Low,
        }
    }

    /// Next filter in the cycle.
    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl std::fmt::Display for SeverityFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
