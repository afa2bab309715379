use tokio::task::JoinSet;
use tokio::time::{MissedTickBehavior, interval};

use crate::effect::{self, Effect};
use crate::lifecycle::{BootOutcome, Bootstrap};
use crate::page::HostPage;
use crate::reply::{ReplyError, ReplyService};
use crate::types::{PendingId, WidgetError, WidgetOptions};
use crate::widget::{Event, Widget};

type Settled = (PendingId, Result<String, ReplyError>);

/// Drives one widget on one host page.
///
/// Page interactions are folded through [`Widget::update`]; the resulting page
/// effects are applied in order and reply requests run as background tasks
/// whose results are fed back as they arrive.
pub struct Controller<P: HostPage, R: ReplyService> {
    page: P,
    replies: R,
    options: WidgetOptions,
    widget: Widget,
    bootstrap: Bootstrap,
    inflight: JoinSet<Settled>,
}

impl<P: HostPage, R: ReplyService> Controller<P, R> {
    pub fn new(page: P, replies: R, options: WidgetOptions) -> Self {
        Self {
            widget: Widget::new(&options),
            page,
            replies,
            options,
            bootstrap: Bootstrap::new(),
            inflight: JoinSet::new(),
        }
    }

    pub fn widget(&self) -> &Widget {
        &self.widget
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn into_page(self) -> P {
        self.page
    }

    pub fn replies(&self) -> &R {
        &self.replies
    }

    /// Number of reply round-trips not yet settled.
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    /// Puts the widget on the page. Calling it again is a no-op.
    pub async fn bootstrap(&mut self) -> Result<BootOutcome, WidgetError> {
        let outcome = self
            .bootstrap
            .run(&mut self.page, &self.options, self.widget.strings())
            .await?;

        if let Some(endpoint) = outcome.endpoint() {
            self.replies.set_endpoint(endpoint);
            self.dispatch(Event::Loaded).await?;
        }
        Ok(outcome)
    }

    /// Feeds one event through the reducer and carries out its effects.
    pub async fn dispatch(&mut self, event: Event) -> Result<(), WidgetError> {
        let effects = self.widget.update(event);

        let mut page_effects = Vec::with_capacity(effects.len());
        for effect in effects {
            match effect {
                Effect::Page(effect) => page_effects.push(effect),
                Effect::RequestReply { pending, message } => self.request_reply(pending, message),
            }
        }
        effect::apply_all(&mut self.page, &page_effects).await
    }

    fn request_reply(&mut self, pending: PendingId, message: String) {
        log::info!("Sending message ({pending})");
        let replies = self.replies.clone();
        self.inflight.spawn(async move {
            // A panicking service still settles its placeholder.
            let outcome = match tokio::spawn(async move { replies.reply(&message).await }).await {
                Ok(outcome) => outcome,
                Err(e) => Err(ReplyError::Network(format!("reply task failed: {e}"))),
            };
            (pending, outcome)
        });
    }

    async fn settle(&mut self, (pending, outcome): Settled) -> Result<(), WidgetError> {
        match &outcome {
            Ok(_) => log::info!("Reply received ({pending})"),
            Err(e) => log::error!("Chat reply failed ({pending}): {e}"),
        }
        self.dispatch(Event::ReplySettled { pending, outcome }).await
    }

    /// Waits for the next reply to arrive and applies it. Returns `false` when
    /// nothing is in flight.
    pub async fn settle_next(&mut self) -> Result<bool, WidgetError> {
        match self.inflight.join_next().await {
            Some(Ok(settled)) => {
                self.settle(settled).await?;
                Ok(true)
            }
            Some(Err(e)) => {
                log::error!("Reply task lost: {e}");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Settles every outstanding reply.
    pub async fn settle_all(&mut self) -> Result<(), WidgetError> {
        while self.settle_next().await? {}
        Ok(())
    }

    /// Drains the page's queued interactions and dispatches them. Returns how
    /// many there were.
    pub async fn pump_page(&mut self) -> Result<usize, WidgetError> {
        let events = self.page.drain_events().await?;
        let count = events.len();
        for event in events {
            if let Err(e) = self.dispatch(event.into()).await {
                log::warn!("Failed to update page: {e}");
            }
        }
        Ok(count)
    }

    /// Bootstraps, then serves the page. Only a failed bootstrap ends it; a
    /// failed poll is logged and retried on the next tick.
    pub async fn run(&mut self) -> Result<(), WidgetError> {
        if self.bootstrap().await? == BootOutcome::AlreadyLoaded {
            return Ok(());
        }

        let mut ticker = interval(self.options.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                Some(joined) = self.inflight.join_next(), if !self.inflight.is_empty() => {
                    match joined {
                        Ok(settled) => {
                            if let Err(e) = self.settle(settled).await {
                                log::warn!("Failed to show reply: {e}");
                            }
                        }
                        Err(e) => log::error!("Reply task lost: {e}"),
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.pump_page().await {
                        log::warn!("Failed to poll page: {e}");
                    }
                }
            }
        }
    }
}
