//! Wire types for the alert store API.

use alertview_core::{Alert, AlertId, Severity};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert object as served by `GET /alerts/`.
///
/// Extra fields (`device`, `user`) are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiAlert {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub timestamp: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    pub is_read: bool,
}

/// Body of `GET /alerts/unread-count/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

/// Parse a server timestamp.
///
/// ISO-8601 with an offset is preferred; a naive timestamp is taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

impl ApiAlert {
    /// Convert to the domain model. Fails only on an unparseable timestamp.
    pub fn into_alert(self) -> std::result::Result<Alert, String> {
        let timestamp = parse_timestamp(&self.timestamp).ok_or_else(|| {
            format!("alert {}: invalid timestamp '{}'", self.id, self.timestamp)
        })?;

        Ok(Alert {
            id: AlertId(self.id),
            title: self.title,
            message: self.message,
            timestamp,
            severity: self
                .severity
                .as_deref()
                .map(Severity::parse)
                .unwrap_or(Severity::Unknown),
            device_name: self.device_name.filter(|name| !name.is_empty()),
            device_id: self.device_id.filter(|id| !id.is_empty()),
            is_read: self.is_read,
        })
    }
}
