use serde::Serialize;
use tokio::time::Duration;

use crate::page::HostPage;
use crate::types::{PendingId, WidgetError};

/// Side effects requested by the widget reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Page(PageEffect),
    /// Start a reply round-trip for the placeholder `pending`.
    RequestReply { pending: PendingId, message: String },
}

/// Effects that touch only the host page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PageEffect {
    SetPanelVisible(bool),
    FocusInput { delay: Duration },
    ClearInput,
    Render(String),
    ScrollToBottom,
}

impl PageEffect {
    pub async fn apply<P: HostPage>(&self, page: &mut P) -> Result<(), WidgetError> {
        match self {
            PageEffect::SetPanelVisible(visible) => page.set_panel_visible(*visible).await,
            PageEffect::FocusInput { delay } => page.focus_input(*delay).await,
            PageEffect::ClearInput => page.clear_input().await,
            PageEffect::Render(html) => page.render_transcript(html).await,
            PageEffect::ScrollToBottom => page.scroll_to_bottom().await,
        }
    }
}

impl From<PageEffect> for Effect {
    fn from(effect: PageEffect) -> Self {
        Effect::Page(effect)
    }
}

/// Applies page effects in order, stopping at the first failure.
pub async fn apply_all<P: HostPage>(page: &mut P, effects: &[PageEffect]) -> Result<(), WidgetError> {
    for (i, effect) in effects.iter().enumerate() {
        if let Err(err) = effect.apply(page).await {
            log::warn!("Page effect {} ({:?}) failed: {}", i, effect, err);
            return Err(err);
        }
    }
    Ok(())
}
