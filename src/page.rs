//! The host page the widget lives on.
//!
//! `HostPage` is everything the controller needs from a document. The browser
//! implementation is [`crate::client::BrowserClient`]; [`MemoryPage`] keeps the
//! same state in plain fields and backs the terminal session and the tests.

use std::collections::{HashSet, VecDeque};

use tokio::time::Duration;

use crate::dom::{ElementIds, UiEvent};
use crate::locale::Strings;
use crate::types::{WidgetError, WidgetOptions};

#[allow(async_fn_in_trait)]
pub trait HostPage {
    /// Whether the document has finished loading.
    async fn is_ready(&mut self) -> Result<bool, WidgetError>;

    /// Records `key` in the page's load registry. Returns `false` if it was
    /// already there.
    async fn claim(&mut self, key: &str) -> Result<bool, WidgetError>;

    async fn has_element(&mut self, id: &str) -> Result<bool, WidgetError>;

    /// Builds and attaches the widget elements. Returns `false`, leaving the
    /// page alone, if the root turned up in the meantime.
    async fn inject(
        &mut self,
        options: &WidgetOptions,
        strings: &Strings,
    ) -> Result<bool, WidgetError>;

    /// Endpoint set by the host page itself, if any.
    async fn endpoint_override(&mut self) -> Result<Option<String>, WidgetError>;

    /// Takes the interactions recorded since the last call.
    async fn drain_events(&mut self) -> Result<Vec<UiEvent>, WidgetError>;

    async fn set_panel_visible(&mut self, visible: bool) -> Result<(), WidgetError>;

    async fn focus_input(&mut self, delay: Duration) -> Result<(), WidgetError>;

    async fn clear_input(&mut self) -> Result<(), WidgetError>;

    async fn render_transcript(&mut self, html: &str) -> Result<(), WidgetError>;

    async fn scroll_to_bottom(&mut self) -> Result<(), WidgetError>;
}

/// In-memory host page.
#[derive(Debug, Default)]
pub struct MemoryPage {
    not_ready_polls: u32,
    failing_injections: u32,
    failing_drains: u32,
    failed_drains: u32,
    root_built_concurrently: bool,
    registry: HashSet<String>,
    elements: Vec<String>,
    events: VecDeque<UiEvent>,
    endpoint_override: Option<String>,
    pub inject_attempts: u32,
    pub panel_visible: bool,
    pub focused: bool,
    pub input: String,
    pub log_html: String,
    pub scrolls: u32,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports "not ready" for the first `polls` readiness checks.
    pub fn not_ready_for(mut self, polls: u32) -> Self {
        self.not_ready_polls = polls;
        self
    }

    /// Fails the first `attempts` injections.
    pub fn failing_injections(mut self, attempts: u32) -> Self {
        self.failing_injections = attempts;
        self
    }

    /// Fails the first `polls` event drains, leaving the queue intact.
    pub fn failing_drains(mut self, polls: u32) -> Self {
        self.failing_drains = polls;
        self
    }

    /// Another copy of the widget builds the root just before our first
    /// injection runs.
    pub fn root_built_concurrently(mut self) -> Self {
        self.root_built_concurrently = true;
        self
    }

    pub fn failed_drains(&self) -> u32 {
        self.failed_drains
    }

    pub fn with_endpoint_override(mut self, url: &str) -> Self {
        self.endpoint_override = Some(url.to_string());
        self
    }

    /// Number of attached elements with the given id.
    pub fn count_elements(&self, id: &str) -> usize {
        self.elements.iter().filter(|e| e.as_str() == id).count()
    }

    pub fn push_event(&mut self, event: UiEvent) {
        self.events.push_back(event);
    }

    /// Types into the input and presses send.
    pub fn submit(&mut self, text: &str) {
        self.input = text.to_string();
        self.push_event(UiEvent::Submit {
            text: text.to_string(),
        });
    }
}

impl HostPage for MemoryPage {
    async fn is_ready(&mut self) -> Result<bool, WidgetError> {
        if self.not_ready_polls > 0 {
            self.not_ready_polls -= 1;
            return Ok(false);
        }
        Ok(true)
    }

    async fn claim(&mut self, key: &str) -> Result<bool, WidgetError> {
        Ok(self.registry.insert(key.to_string()))
    }

    async fn has_element(&mut self, id: &str) -> Result<bool, WidgetError> {
        Ok(self.count_elements(id) > 0)
    }

    async fn inject(
        &mut self,
        options: &WidgetOptions,
        _strings: &Strings,
    ) -> Result<bool, WidgetError> {
        self.inject_attempts += 1;
        if self.failing_injections > 0 {
            self.failing_injections -= 1;
            return Err(WidgetError::InjectionError("document.body is null".into()));
        }
        let ids = ElementIds::new(&options.widget_id);
        if std::mem::take(&mut self.root_built_concurrently) {
            self.elements.extend(ids.all().iter().map(|id| id.to_string()));
        }
        if self.count_elements(&ids.root) > 0 {
            return Ok(false);
        }
        self.elements.extend(ids.all().iter().map(|id| id.to_string()));
        self.panel_visible = false;
        Ok(true)
    }

    async fn endpoint_override(&mut self) -> Result<Option<String>, WidgetError> {
        Ok(self.endpoint_override.clone())
    }

    async fn drain_events(&mut self) -> Result<Vec<UiEvent>, WidgetError> {
        if self.failing_drains > 0 {
            self.failing_drains -= 1;
            self.failed_drains += 1;
            return Err(WidgetError::OperationError("script timeout".into()));
        }
        Ok(self.events.drain(..).collect())
    }

    async fn set_panel_visible(&mut self, visible: bool) -> Result<(), WidgetError> {
        self.panel_visible = visible;
        if !visible {
            self.focused = false;
        }
        Ok(())
    }

    async fn focus_input(&mut self, _delay: Duration) -> Result<(), WidgetError> {
        if self.panel_visible {
            self.focused = true;
        }
        Ok(())
    }

    async fn clear_input(&mut self) -> Result<(), WidgetError> {
        self.input.clear();
        Ok(())
    }

    async fn render_transcript(&mut self, html: &str) -> Result<(), WidgetError> {
        self.log_html = html.to_string();
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), WidgetError> {
        self.scrolls += 1;
        Ok(())
    }
}
