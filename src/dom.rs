use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::WidgetError;
use crate::widget::{Event, ToggleSource};

/// Ids of the elements the widget attaches to the page, all derived from the
/// reserved root id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementIds {
    pub root: String,
    pub icon: String,
    pub panel: String,
    pub header: String,
    pub close: String,
    pub log: String,
    pub input: String,
    pub send: String,
}

impl ElementIds {
    pub fn new(widget_id: &str) -> Self {
        Self {
            root: widget_id.to_string(),
            icon: format!("{widget_id}-icon"),
            panel: format!("{widget_id}-panel"),
            header: format!("{widget_id}-header"),
            close: format!("{widget_id}-close"),
            log: format!("{widget_id}-log"),
            input: format!("{widget_id}-input"),
            send: format!("{widget_id}-send"),
        }
    }

    /// Every id, in the order the elements are created.
    pub fn all(&self) -> [&str; 8] {
        [
            &self.root,
            &self.icon,
            &self.panel,
            &self.header,
            &self.close,
            &self.log,
            &self.input,
            &self.send,
        ]
    }
}

/// A user interaction recorded by the injected script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum UiEvent {
    Toggle { source: ToggleSource },
    Submit { text: String },
}

impl From<UiEvent> for Event {
    fn from(event: UiEvent) -> Self {
        match event {
            UiEvent::Toggle { source } => Event::Toggle(source),
            UiEvent::Submit { text } => Event::Submit(text),
        }
    }
}

/// Decodes the array returned by the page's event queue drain.
///
/// Entries that do not decode are logged and skipped.
pub fn decode_events(value: Value) -> Result<Vec<UiEvent>, WidgetError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Null => return Ok(vec![]),
        Value::Object(ref map) if map.contains_key("error") => {
            return Err(WidgetError::EventDecodeError(map["error"].to_string()));
        }
        other => {
            return Err(WidgetError::EventDecodeError(format!(
                "expected an array, got {other}"
            )));
        }
    };

    let mut events = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<UiEvent>(item.clone()) {
            Ok(event) => events.push(event),
            Err(e) => log::warn!("Skipping page event {item}: {e}"),
        }
    }
    Ok(events)
}
