pub mod client;
pub mod controller;
pub mod dom;
pub mod effect;
pub mod js;
pub mod lifecycle;
pub mod locale;
pub mod page;
pub mod reply;
pub mod transcript;
pub mod types;
pub mod widget;

pub use client::{BrowserClient, BrowserPage};
pub use controller::Controller;
pub use lifecycle::{BootOutcome, Bootstrap, LifecycleState};
pub use locale::Locale;
pub use page::{HostPage, MemoryPage};
pub use reply::{HttpReplyService, ReplyError, ReplyService};
pub use transcript::{Sender, Transcript, TranscriptEntry};
pub use types::{BrowserOptions, WidgetError, WidgetOptions};
pub use widget::{Event, Widget, WidgetState};
