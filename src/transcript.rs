//! Append-only chat transcript and its markup rendering.
//!
//! The transcript holds settled entries plus the typing placeholders of replies
//! still in flight. Rendering is a pure function of the transcript, so the page
//! only ever receives markup built from escaped text.

use serde::{Deserialize, Serialize};

use crate::locale::Strings;
use crate::types::PendingId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sender {
    User,
    Bot,
    BotError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub sender: Sender,
    pub text: String,
    pub sequence: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Entry(TranscriptEntry),
    Typing(PendingId),
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    items: Vec<Item>,
    next_sequence: u64,
    next_pending: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a settled entry and returns its sequence number.
    pub fn push(&mut self, sender: Sender, text: impl Into<String>) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.items.push(Item::Entry(TranscriptEntry {
            sender,
            text: text.into(),
            sequence,
        }));
        sequence
    }

    /// Appends a typing placeholder for a reply that has not settled yet.
    pub fn begin_typing(&mut self) -> PendingId {
        self.next_pending += 1;
        let id = PendingId::generate(self.next_pending);
        self.items.push(Item::Typing(id.clone()));
        id
    }

    /// Removes the placeholder with the given id. Returns `false` if it was
    /// already gone.
    pub fn finish_typing(&mut self, id: &PendingId) -> bool {
        match self
            .items
            .iter()
            .position(|item| matches!(item, Item::Typing(pending) if pending == id))
        {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Settled entries in order, placeholders skipped.
    pub fn entries(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.items.iter().filter_map(|item| match item {
            Item::Entry(entry) => Some(entry),
            Item::Typing(_) => None,
        })
    }

    pub fn pending(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, Item::Typing(_)))
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Escapes text for insertion into element content or a quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes a reply, then turns its line breaks into `<br>`.
pub fn format_reply(text: &str) -> String {
    escape_html(text)
        .replace("\r\n", "\n")
        .replace('\n', "<br>")
}

/// Renders the whole message log.
pub fn render_transcript(transcript: &Transcript, strings: &Strings) -> String {
    let bot_name = escape_html(&strings.bot_name);
    let mut html = String::new();

    for item in transcript.items() {
        match item {
            Item::Entry(entry) => match entry.sender {
                Sender::User => html.push_str(&format!(
                    r#"<div class="cw-entry cw-user" data-seq="{}"><div class="cw-bubble">{}</div></div>"#,
                    entry.sequence,
                    escape_html(&entry.text)
                )),
                Sender::Bot => html.push_str(&format!(
                    r#"<div class="cw-entry cw-bot" data-seq="{}"><div class="cw-name">{bot_name}</div><div class="cw-bubble">{}</div></div>"#,
                    entry.sequence,
                    format_reply(&entry.text)
                )),
                Sender::BotError => html.push_str(&format!(
                    r#"<div class="cw-entry cw-bot cw-error" data-seq="{}"><div class="cw-name">{bot_name}</div><div class="cw-bubble">{}</div></div>"#,
                    entry.sequence,
                    escape_html(&entry.text)
                )),
            },
            Item::Typing(id) => html.push_str(&format!(
                r#"<div class="cw-entry cw-bot cw-typing" id="{}"><div class="cw-name">{bot_name}</div><div class="cw-dots"><span></span><span></span><span></span></div></div>"#,
                escape_html(id.as_str())
            )),
        }
    }

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locale;

    #[test]
    fn sequences_are_monotonic_across_placeholders() {
        let mut transcript = Transcript::new();
        transcript.push(Sender::User, "one");
        let pending = transcript.begin_typing();
        transcript.push(Sender::User, "two");
        assert!(transcript.finish_typing(&pending));
        transcript.push(Sender::Bot, "three");

        let sequences: Vec<u64> = transcript.entries().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        assert_eq!(transcript.pending(), 0);
    }

    #[test]
    fn placeholder_is_removed_once() {
        let mut transcript = Transcript::new();
        let pending = transcript.begin_typing();
        assert!(transcript.finish_typing(&pending));
        assert!(!transcript.finish_typing(&pending));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<script>alert("x")</script> & 'y'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#39;y&#39;"
        );
    }

    #[test]
    fn reply_newlines_become_breaks_after_escaping() {
        assert_eq!(format_reply("a<b>\nc\r\nd"), "a&lt;b&gt;<br>c<br>d");
    }

    #[test]
    fn renders_user_text_escaped_and_typing_marker() {
        let strings = Locale::En.strings(None);
        let mut transcript = Transcript::new();
        transcript.push(Sender::User, "<script>alert(1)</script>\nnext");
        let pending = transcript.begin_typing();

        let html = render_transcript(&transcript, &strings);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;\nnext"));
        assert!(html.contains(&format!(r#"id="{pending}""#)));
        assert!(html.contains("cw-typing"));
    }

    #[test]
    fn error_entries_are_marked() {
        let strings = Locale::En.strings(None);
        let mut transcript = Transcript::new();
        transcript.push(Sender::BotError, "try later");
        let html = render_transcript(&transcript, &strings);
        assert!(html.contains("cw-error"));
        assert!(html.contains("try later"));
    }
}
