//! Anti-forgery token sources.
//!
//! Mutations must carry the token the server handed out in a same-site
//! cookie. The transport asks for it synchronously right before each POST,
//! so a refreshed cookie file is picked up without restarting.

use std::path::PathBuf;
use std::sync::Arc;

use alertview_core::ServerConfig;
use tracing::debug;

/// Synchronous provider of the current anti-forgery token.
pub trait TokenSource: Send + Sync {
    /// Current token, or `None` when none is available.
    ///
    /// A missing token is not an error here; the server rejects the request
    /// and the caller sees a status error.
    fn current_token(&self) -> Option<String>;
}

/// A fixed token (or none).
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl TokenSource for StaticToken {
    fn current_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Reads the token cookie from a file on every call.
///
/// Accepts either a `Cookie:` header value (`a=1; csrftoken=abc`) spread over
/// one or more lines, or a Netscape cookie jar as written by curl.
#[derive(Debug, Clone)]
pub struct CookieFileToken {
    path: PathBuf,
    cookie_name: String,
}

impl CookieFileToken {
    pub fn new(path: impl Into<PathBuf>, cookie_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            cookie_name: cookie_name.into(),
        }
    }

    /// Find `name` in cookie file content.
    pub fn parse_cookie(content: &str, name: &str) -> Option<String> {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let jar_line = line.strip_prefix("#HttpOnly_").unwrap_or(line);
            let fields: Vec<&str> = jar_line.split('\t').collect();
            if fields.len() == 7 {
                if fields[5] == name && !fields[6].is_empty() {
                    return Some(fields[6].to_string());
                }
                continue;
            }
            if line.starts_with('#') {
                continue;
            }

            let header = line.strip_prefix("Cookie:").unwrap_or(line);
            for pair in header.split(';') {
                if let Some((key, value)) = pair.split_once('=') {
                    if key.trim() == name && !value.trim().is_empty() {
                        return Some(value.trim().to_string());
                    }
                }
            }
        }
        None
    }
}

impl TokenSource for CookieFileToken {
    fn current_token(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Self::parse_cookie(&content, &self.cookie_name),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "cookie file unreadable");
                None
            }
        }
    }
}

/// Build the token source described by the server config.
///
/// A cookie file wins over a fixed token.
pub fn token_source_from_config(config: &ServerConfig) -> Arc<dyn TokenSource> {
    match (&config.cookie_file, &config.csrf_token) {
        (Some(path), _) => Arc::new(CookieFileToken::new(path, config.csrf_cookie.clone())),
        (None, Some(token)) => Arc::new(StaticToken::new(token.clone())),
        (None, None) => Arc::new(StaticToken::none()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_header_format() {
        let content = "sessionid=xyz; csrftoken=abc123; theme=dark";
        assert_eq!(
            CookieFileToken::parse_cookie(content, "csrftoken"),
            Some("abc123".to_string())
        );
        assert_eq!(CookieFileToken::parse_cookie(content, "missing"), None);
    }

    #[test]
    fn test_parse_netscape_jar() {
        let content = "# Netscape HTTP Cookie File\n\
                       sensors.example.com\tFALSE\t/\tTRUE\t0\tcsrftoken\tjar-token\n\
                       #HttpOnly_sensors.example.com\tFALSE\t/\tTRUE\t0\tsessionid\ts1\n";
        assert_eq!(
            CookieFileToken::parse_cookie(content, "csrftoken"),
            Some("jar-token".to_string())
        );
        assert_eq!(
            CookieFileToken::parse_cookie(content, "sessionid"),
            Some("s1".to_string())
        );
    }

    #[test]
    fn test_cookie_file_reread() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies");
        let source = CookieFileToken::new(&path, "csrftoken");
        assert_eq!(source.current_token(), None);

        std::fs::write(&path, "csrftoken=first").unwrap();
        assert_eq!(source.current_token(), Some("first".to_string()));

        std::fs::write(&path, "Cookie: csrftoken=second").unwrap();
        assert_eq!(source.current_token(), Some("second".to_string()));
    }

    #[test]
    fn test_from_config_prefers_cookie_file() {
        let mut config = ServerConfig {
            csrf_token: Some("fixed".into()),
            ..Default::default()
        };
        assert_eq!(
            token_source_from_config(&config).current_token(),
            Some("fixed".to_string())
        );

        config.cookie_file = Some(PathBuf::from("/nonexistent/cookies"));
        assert_eq!(token_source_from_config(&config).current_token(), None);
    }
}
