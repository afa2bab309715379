//! Widget state and the reducer that drives it.
//!
//! `Widget::update` takes one event, mutates the state and transcript, and
//! returns the effects the caller must carry out. It performs no I/O itself.

use serde::{Deserialize, Serialize};
use tokio::time::Duration;

use crate::effect::{Effect, PageEffect};
use crate::locale::Strings;
use crate::reply::ReplyError;
use crate::transcript::{Sender, Transcript, render_transcript};
use crate::types::{PendingId, WidgetOptions};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WidgetState {
    pub is_open: bool,
    pub is_loaded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleSource {
    Icon,
    CloseButton,
}

#[derive(Debug)]
pub enum Event {
    /// The elements are on the page.
    Loaded,
    Toggle(ToggleSource),
    /// Raw value of the text field when send or Enter was pressed.
    Submit(String),
    ReplySettled {
        pending: PendingId,
        outcome: Result<String, ReplyError>,
    },
}

#[derive(Debug, Clone)]
pub struct Widget {
    state: WidgetState,
    transcript: Transcript,
    strings: Strings,
    focus_delay: Duration,
}

impl Widget {
    pub fn new(options: &WidgetOptions) -> Self {
        let strings = options.locale.strings(options.contact_phone.as_deref());
        let mut transcript = Transcript::new();
        if options.greeting {
            transcript.push(Sender::Bot, strings.greeting.clone());
        }

        Self {
            state: WidgetState::default(),
            transcript,
            strings,
            focus_delay: options.focus_delay,
        }
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn strings(&self) -> &Strings {
        &self.strings
    }

    pub fn render(&self) -> String {
        render_transcript(&self.transcript, &self.strings)
    }

    pub fn update(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Loaded => {
                if self.state.is_loaded {
                    return vec![];
                }
                self.state.is_loaded = true;
                vec![
                    PageEffect::Render(self.render()).into(),
                    PageEffect::SetPanelVisible(self.state.is_open).into(),
                ]
            }

            Event::Toggle(_) => {
                self.state.is_open = !self.state.is_open;
                let mut effects = vec![PageEffect::SetPanelVisible(self.state.is_open).into()];
                if self.state.is_open {
                    effects.push(
                        PageEffect::FocusInput {
                            delay: self.focus_delay,
                        }
                        .into(),
                    );
                }
                effects
            }

            Event::Submit(raw) => {
                let message = raw.trim();
                if message.is_empty() {
                    return vec![];
                }
                let message = message.to_string();

                self.transcript.push(Sender::User, message.clone());
                let pending = self.transcript.begin_typing();

                vec![
                    PageEffect::ClearInput.into(),
                    PageEffect::Render(self.render()).into(),
                    PageEffect::ScrollToBottom.into(),
                    Effect::RequestReply { pending, message },
                ]
            }

            Event::ReplySettled { pending, outcome } => {
                if !self.transcript.finish_typing(&pending) {
                    return vec![];
                }
                match outcome {
                    Ok(reply) => self.transcript.push(Sender::Bot, reply),
                    Err(_) => self
                        .transcript
                        .push(Sender::BotError, self.strings.fallback.clone()),
                };
                vec![
                    PageEffect::Render(self.render()).into(),
                    PageEffect::ScrollToBottom.into(),
                ]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> Widget {
        Widget::new(&WidgetOptions::new().greeting(false))
    }

    fn pending_of(effects: &[Effect]) -> PendingId {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::RequestReply { pending, .. } => Some(pending.clone()),
                _ => None,
            })
            .expect("submit requests a reply")
    }

    #[test]
    fn greeting_opens_the_transcript() {
        let widget = Widget::new(&WidgetOptions::new());
        let first = widget.transcript().entries().next().unwrap();
        assert_eq!(first.sender, Sender::Bot);
        assert_eq!(first.text, widget.strings().greeting);
    }

    #[test]
    fn loaded_is_monotonic() {
        let mut widget = widget();
        assert_eq!(widget.update(Event::Loaded).len(), 2);
        assert!(widget.state().is_loaded);
        assert!(widget.update(Event::Loaded).is_empty());
        assert!(widget.state().is_loaded);
    }

    #[test]
    fn focus_only_when_opening() {
        let mut widget = widget();
        let opened = widget.update(Event::Toggle(ToggleSource::Icon));
        assert_eq!(
            opened,
            vec![
                Effect::Page(PageEffect::SetPanelVisible(true)),
                Effect::Page(PageEffect::FocusInput {
                    delay: Duration::from_millis(100)
                }),
            ]
        );
        let closed = widget.update(Event::Toggle(ToggleSource::CloseButton));
        assert_eq!(closed, vec![Effect::Page(PageEffect::SetPanelVisible(false))]);
    }

    #[test]
    fn focus_uses_configured_delay() {
        let options = WidgetOptions::new().focus_delay(Duration::from_millis(40));
        let mut widget = Widget::new(&options);
        let opened = widget.update(Event::Toggle(ToggleSource::Icon));
        assert!(opened.contains(&Effect::Page(PageEffect::FocusInput {
            delay: Duration::from_millis(40)
        })));
    }

    #[test]
    fn blank_submit_does_nothing() {
        let mut widget = widget();
        assert!(widget.update(Event::Submit("   \t\n".into())).is_empty());
        assert!(widget.transcript().is_empty());
        assert_eq!(widget.transcript().pending(), 0);
    }

    #[test]
    fn submit_trims_and_requests_reply() {
        let mut widget = widget();
        let effects = widget.update(Event::Submit("  Hello \n".into()));
        assert!(effects.contains(&PageEffect::ClearInput.into()));
        assert!(matches!(
            effects.last(),
            Some(Effect::RequestReply { message, .. }) if message == "Hello"
        ));
        assert_eq!(widget.transcript().pending(), 1);
    }

    #[test]
    fn failure_appends_fallback() {
        let mut widget = widget();
        let pending = pending_of(&widget.update(Event::Submit("hi".into())));
        widget.update(Event::ReplySettled {
            pending,
            outcome: Err(ReplyError::MissingReply),
        });

        let last = widget.transcript().entries().last().unwrap();
        assert_eq!(last.sender, Sender::BotError);
        assert_eq!(last.text, widget.strings().fallback);
        assert_eq!(widget.transcript().pending(), 0);
    }

    #[test]
    fn duplicate_settlement_is_ignored() {
        let mut widget = widget();
        let pending = pending_of(&widget.update(Event::Submit("hi".into())));
        widget.update(Event::ReplySettled {
            pending: pending.clone(),
            outcome: Ok("one".into()),
        });
        let effects = widget.update(Event::ReplySettled {
            pending,
            outcome: Ok("two".into()),
        });
        assert!(effects.is_empty());
        assert_eq!(widget.transcript().len(), 2);
    }
}
