//! Configuration for AlertView.
//!
//! Loaded from `~/.alertview/config.yaml` (or an explicit path). A missing
//! default file is not an error: every field has a default, so a fresh
//! install talks to `http://localhost:8000` and polls once a minute.
//!
//! ```yaml
//! server:
//!   base_url: https://sensors.example.com
//!   timeout_secs: 15
//!   csrf_header: X-CSRFToken
//!   csrf_cookie: csrftoken
//!   cookie_file: /home/me/.alertview/cookies
//! poll:
//!   interval_secs: 60
//! display:
//!   date_format: "%a %b %-d %Y"
//!   time_format: "%H:%M"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AlertViewError, Result};

/// Environment variable overriding `server.base_url`.
pub const ENV_BASE_URL: &str = "ALERTVIEW_BASE_URL";
/// Environment variable overriding `server.csrf_token`.
pub const ENV_CSRF_TOKEN: &str = "ALERTVIEW_CSRF_TOKEN";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertViewConfig {
    /// Remote alert store connection
    pub server: ServerConfig,
    /// Polling behaviour
    pub poll: PollConfig,
    /// Date/time rendering
    pub display: DisplayConfig,
}

/// Remote alert store connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL; endpoint paths such as `/alerts/` are appended to it
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Header carrying the anti-forgery token on mutations
    pub csrf_header: String,

    /// Cookie name holding the anti-forgery token
    pub csrf_cookie: String,

    /// Fixed token, used when no cookie file is configured
    pub csrf_token: Option<String>,

    /// Cookie file (`name=value; name2=value2`) re-read on every mutation
    pub cookie_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
            csrf_header: "X-CSRFToken".to_string(),
            csrf_cookie: "csrftoken".to_string(),
            csrf_token: None,
            cookie_file: None,
        }
    }
}

/// Poll timer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds between list fetches
    pub interval_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

impl PollConfig {
    /// Poll interval as a [`std::time::Duration`].
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_secs)
    }
}

/// Date/time rendering settings (chrono strftime syntax).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Date group heading; alerts whose local dates format identically share a group
    pub date_format: String,
    /// Time-of-day shown on each alert row
    pub time_format: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            date_format: "%a %b %-d %Y".to_string(),
            time_format: "%H:%M".to_string(),
        }
    }
}

impl AlertViewConfig {
    /// Load configuration from an explicit file. The file must exist.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AlertViewError::config_not_found(path, Some(e))
            } else {
                AlertViewError::io("reading config", path, e)
            }
        })?;

        let config = Self::parse(&content).map_err(|message| AlertViewError::ConfigInvalid {
            path: path.to_path_buf(),
            message,
        })?;

        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Load from the default location, falling back to defaults when absent.
    pub fn load_or_default() -> Result<Self> {
        let path = default_config_path()?;
        if path.exists() {
            Self::load(&path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse YAML content. An empty document yields the defaults.
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }

    /// Apply `ALERTVIEW_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            if !url.trim().is_empty() {
                self.server.base_url = url;
            }
        }
        if let Ok(token) = std::env::var(ENV_CSRF_TOKEN) {
            if !token.trim().is_empty() {
                self.server.csrf_token = Some(token);
            }
        }
    }

    /// Override the base URL (CLI flag).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.server.base_url = url.into();
        self
    }

    /// Override the poll interval.
    pub fn with_poll_interval(mut self, secs: u64) -> Self {
        self.poll.interval_secs = secs;
        self
    }

    /// Check field values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        let url = self.server.base_url.trim();
        if url.is_empty() {
            return Err(AlertViewError::config_validation("server.base_url is empty"));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AlertViewError::config_validation(format!(
                "server.base_url must start with http:// or https://, got '{}'",
                url
            )));
        }
        if self.poll.interval_secs == 0 {
            return Err(AlertViewError::config_validation(
                "poll.interval_secs must be at least 1",
            ));
        }
        if self.server.timeout_secs == 0 {
            return Err(AlertViewError::config_validation(
                "server.timeout_secs must be at least 1",
            ));
        }
        if self.server.csrf_header.trim().is_empty() {
            return Err(AlertViewError::config_validation("server.csrf_header is empty"));
        }
        Ok(())
    }
}

/// Default config file path (`~/.alertview/config.yaml`).
pub fn default_config_path() -> Result<PathBuf> {
    Ok(crate::logging::alertview_home()?.join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AlertViewConfig::default();
        assert_eq!(config.poll.interval_secs, 60);
        assert_eq!(config.server.csrf_header, "X-CSRFToken");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let config = AlertViewConfig::parse(
            "server:\n  base_url: https://sensors.example.com\npoll:\n  interval_secs: 15\n",
        )
        .unwrap();
        assert_eq!(config.server.base_url, "https://sensors.example.com");
        assert_eq!(config.poll.interval_secs, 15);
        assert_eq!(config.server.timeout_secs, 30);
        assert_eq!(config.display, DisplayConfig::default());
    }

    #[test]
    fn test_parse_empty_is_default() {
        assert_eq!(AlertViewConfig::parse("  \n").unwrap(), AlertViewConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = AlertViewConfig::load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "poll: [not, a, map").unwrap();
        let err = AlertViewConfig::load(&path).unwrap_err();
        assert!(matches!(err, AlertViewError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "display:\n  time_format: \"%I:%M %p\"\n").unwrap();
        let config = AlertViewConfig::load(&path).unwrap();
        assert_eq!(config.display.time_format, "%I:%M %p");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = AlertViewConfig::default().with_base_url("ftp://example.com");
        assert!(config.validate().is_err());

        let config = AlertViewConfig::default().with_base_url("");
        assert!(config.validate().is_err());

        let config = AlertViewConfig::default().with_poll_interval(0);
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        // SAFETY: serialized with every other test that touches the environment
        unsafe {
            std::env::set_var(ENV_BASE_URL, "https://override.example.com");
            std::env::set_var(ENV_CSRF_TOKEN, "tok-123");
        }
        let mut config = AlertViewConfig::default();
        config.apply_env_overrides();
        unsafe {
            std::env::remove_var(ENV_BASE_URL);
            std::env::remove_var(ENV_CSRF_TOKEN);
        }

        assert_eq!(config.server.base_url, "https://override.example.com");
        assert_eq!(config.server.csrf_token.as_deref(), Some("tok-123"));
    }
}
