use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Duration;

use crate::locale::Locale;

/// Endpoint used when neither the options nor the host page name one.
pub const DEFAULT_ENDPOINT: &str = "https://chat-widget.onrender.com/chat";

/// Reserved id of the widget root; also scopes the page-level load registry.
pub const DEFAULT_WIDGET_ID: &str = "cw-chat-widget";

//
// ---------- Error Types ----------
//
#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("WebDriver connection failed: {0}")]
    ConnectionError(String),

    #[error("Page operation failed: {0}")]
    OperationError(String),

    #[error("Invalid widget configuration: {0}")]
    ConfigError(String),

    #[error("Failed to inject widget: {0}")]
    InjectionError(String),

    #[error("Failed to decode page events: {0}")]
    EventDecodeError(String),
}

//
// ---------- Pending Replies ----------
//

/// Identifies one typing placeholder, and with it one outstanding round-trip.
///
/// Derived from the wall clock in milliseconds plus a per-widget counter, so two
/// sends inside the same millisecond still get distinct ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingId(String);

impl PendingId {
    pub fn generate(counter: u64) -> Self {
        Self(format!("typing-{}-{}", Utc::now().timestamp_millis(), counter))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PendingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ---------- Browser Config ----------
//

/// Default address of a locally running WebDriver server (geckodriver).
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

/// Configuration options for the WebDriver session hosting the page.
#[derive(Debug, Clone, Serialize)]
pub struct BrowserOptions {
    /// WebDriver server to connect to.
    pub webdriver_url: String,
    /// Whether the browser should run in headless mode.
    pub headless: bool,
    /// Optional window dimensions (width, height).
    pub window_size: Option<(u32, u32)>,
    /// Optional proxy URL to use for HTTP/HTTPS traffic.
    pub proxy: Option<String>,
    /// Optional user agent string override.
    pub user_agent: Option<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: false,
            window_size: Some((1280, 900)),
            proxy: None,
            user_agent: None,
        }
    }
}

impl BrowserOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn webdriver_url(mut self, url: &str) -> Self {
        self.webdriver_url = url.to_string();
        self
    }

    pub fn headless(mut self, enabled: bool) -> Self {
        self.headless = enabled;
        self
    }

    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = Some((width, height));
        self
    }

    pub fn proxy(mut self, proxy_url: &str) -> Self {
        self.proxy = Some(proxy_url.to_string());
        self
    }

    pub fn user_agent(mut self, ua: &str) -> Self {
        self.user_agent = Some(ua.to_string());
        self
    }
}

//
// ---------- Widget Config ----------
//

/// Configuration options for a chat widget instance.
#[derive(Debug, Clone, Serialize)]
pub struct WidgetOptions {
    /// Reply service URL, used unless the host page overrides it.
    pub endpoint: String,
    /// Reserved DOM id of the widget root.
    pub widget_id: String,
    /// Language for the built-in strings.
    pub locale: Locale,
    /// Phone number offered in the fallback message.
    pub contact_phone: Option<String>,
    /// Accent colour of the icon, header and user bubbles.
    pub accent: String,
    /// Whether to open the transcript with a greeting from the bot.
    pub greeting: bool,
    /// Wait after the page reports ready before building elements.
    pub settle_delay: Duration,
    /// Wait between failed injection attempts.
    pub retry_delay: Duration,
    /// Wait between opening the panel and focusing the input.
    pub focus_delay: Duration,
    /// How often the page is polled for clicks and submissions.
    pub poll_interval: Duration,
    /// Optional cap on a reply round-trip. `None` leaves it to the transport.
    pub request_timeout: Option<Duration>,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            widget_id: DEFAULT_WIDGET_ID.to_string(),
            locale: Locale::En,
            contact_phone: None,
            accent: "#2ecc71".to_string(),
            greeting: true,
            settle_delay: Duration::from_millis(1000),
            retry_delay: Duration::from_millis(1000),
            focus_delay: Duration::from_millis(100),
            poll_interval: Duration::from_millis(250),
            request_timeout: None,
        }
    }
}

impl WidgetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(mut self, url: &str) -> Self {
        self.endpoint = url.to_string();
        self
    }

    pub fn widget_id(mut self, id: &str) -> Self {
        self.widget_id = id.to_string();
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn contact_phone(mut self, phone: &str) -> Self {
        self.contact_phone = Some(phone.to_string());
        self
    }

    pub fn accent(mut self, color: &str) -> Self {
        self.accent = color.to_string();
        self
    }

    pub fn greeting(mut self, enabled: bool) -> Self {
        self.greeting = enabled;
        self
    }

    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn focus_delay(mut self, delay: Duration) -> Self {
        self.focus_delay = delay;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets a timeout for reply round-trips (in seconds).
    pub fn request_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout = Some(Duration::from_secs(seconds));
        self
    }

    /// Key under which the host page records that this widget has loaded.
    pub fn registry_key(&self) -> String {
        format!("{}:loaded", self.widget_id)
    }

    pub fn validate(&self) -> Result<(), WidgetError> {
        if self.widget_id.trim().is_empty() {
            return Err(WidgetError::ConfigError("widget id is empty".into()));
        }
        // Both end up in the widget's stylesheet text.
        let id_ok = self.widget_id.starts_with(|c: char| c.is_ascii_alphabetic())
            && self
                .widget_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !id_ok {
            return Err(WidgetError::ConfigError(format!(
                "widget id must be a letter followed by letters, digits, '-' or '_': {}",
                self.widget_id
            )));
        }
        let accent_ok = !self.accent.trim().is_empty()
            && self
                .accent
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "#(),.% -".contains(c));
        if !accent_ok {
            return Err(WidgetError::ConfigError(format!(
                "accent is not a plain CSS colour: {}",
                self.accent
            )));
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(WidgetError::ConfigError(format!(
                "endpoint must be an http(s) URL: {}",
                self.endpoint
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(WidgetError::ConfigError(
                "poll interval must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_ids_are_unique_within_a_millisecond() {
        let a = PendingId::generate(1);
        let b = PendingId::generate(2);
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("typing-"));
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let err = WidgetOptions::new().endpoint("ftp://example.com").validate();
        assert!(matches!(err, Err(WidgetError::ConfigError(_))));
        assert!(WidgetOptions::new().validate().is_ok());
    }

    #[test]
    fn rejects_stylesheet_breaking_id_and_accent() {
        for id in ["cw x", "cw{color:red}", "1cw", "cw\"", "cw;"] {
            assert!(
                WidgetOptions::new().widget_id(id).validate().is_err(),
                "accepted id {id:?}"
            );
        }
        for accent in ["red; } body { display: none", "#fff !important", "</style>", ""] {
            assert!(
                WidgetOptions::new().accent(accent).validate().is_err(),
                "accepted accent {accent:?}"
            );
        }
        assert!(WidgetOptions::new().widget_id("support_bot-2").validate().is_ok());
        assert!(WidgetOptions::new().accent("rgb(46, 204, 113)").validate().is_ok());
        assert!(WidgetOptions::new().accent("hsl(145, 63%, 49%)").validate().is_ok());
    }

    #[test]
    fn registry_key_is_scoped_to_widget_id() {
        let options = WidgetOptions::new().widget_id("support");
        assert_eq!(options.registry_key(), "support:loaded");
    }
}
