//! Bootstrap of the widget onto a host page.
//!
//! `Uninitialized → WaitingForPageReady → Injected`. The first transition is
//! guarded by the page's load registry, the second waits for the document,
//! lets it settle, then builds the elements, retrying for as long as it takes.

use serde::Serialize;
use tokio::time::sleep;

use crate::locale::Strings;
use crate::page::HostPage;
use crate::types::{WidgetError, WidgetOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LifecycleState {
    Uninitialized,
    WaitingForPageReady,
    Injected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootOutcome {
    /// The page's registry already held this widget; nothing was done.
    AlreadyLoaded,
    /// The root element was already on the page, so nothing was built.
    Adopted { endpoint: String },
    /// Elements were built, after `attempts` tries.
    Injected { attempts: u32, endpoint: String },
}

impl BootOutcome {
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            BootOutcome::AlreadyLoaded => None,
            BootOutcome::Adopted { endpoint } | BootOutcome::Injected { endpoint, .. } => {
                Some(endpoint)
            }
        }
    }
}

#[derive(Debug)]
pub struct Bootstrap {
    state: LifecycleState,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self::new()
    }
}

impl Bootstrap {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Uninitialized,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub async fn run<P: HostPage>(
        &mut self,
        page: &mut P,
        options: &WidgetOptions,
        strings: &Strings,
    ) -> Result<BootOutcome, WidgetError> {
        if self.state != LifecycleState::Uninitialized {
            return Ok(BootOutcome::AlreadyLoaded);
        }

        let key = options.registry_key();
        if !page.claim(&key).await? {
            log::info!("Widget '{}' already loaded on this page", options.widget_id);
            return Ok(BootOutcome::AlreadyLoaded);
        }
        self.state = LifecycleState::WaitingForPageReady;

        loop {
            match page.is_ready().await {
                Ok(true) => break,
                Ok(false) => log::debug!("Page not ready yet"),
                Err(e) => log::warn!("Readiness check failed: {e}"),
            }
            sleep(options.retry_delay).await;
        }
        sleep(options.settle_delay).await;

        let mut attempts = 0;
        let built = loop {
            match page.has_element(&options.widget_id).await {
                Ok(true) => break false,
                Ok(false) => {}
                Err(e) => {
                    log::warn!("Could not look up #{}: {e}", options.widget_id);
                    sleep(options.retry_delay).await;
                    continue;
                }
            }

            attempts += 1;
            match page.inject(options, strings).await {
                Ok(true) => break true,
                Ok(false) => break false,
                Err(e) => {
                    log::warn!(
                        "Injection attempt {attempts} failed, retrying in {:?}: {e}",
                        options.retry_delay
                    );
                    sleep(options.retry_delay).await;
                }
            }
        };

        let endpoint = match page.endpoint_override().await {
            Ok(Some(url)) => {
                log::info!("Host page overrides endpoint: {url}");
                url
            }
            Ok(None) => options.endpoint.clone(),
            Err(e) => {
                log::warn!("Could not read endpoint override: {e}");
                options.endpoint.clone()
            }
        };

        self.state = LifecycleState::Injected;
        if built {
            log::info!("Widget '{}' injected", options.widget_id);
            Ok(BootOutcome::Injected { attempts, endpoint })
        } else {
            log::info!("Widget '{}' already on the page, adopting it", options.widget_id);
            Ok(BootOutcome::Adopted { endpoint })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::MemoryPage;
    use tokio::time::Duration;

    fn fast() -> WidgetOptions {
        WidgetOptions::new()
            .settle_delay(Duration::from_millis(1))
            .retry_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn second_start_on_same_page_is_a_no_op() {
        let options = fast();
        let strings = options.locale.strings(None);
        let mut page = MemoryPage::new();

        let first = Bootstrap::new().run(&mut page, &options, &strings).await.unwrap();
        assert!(matches!(first, BootOutcome::Injected { attempts: 1, .. }));

        let second = Bootstrap::new().run(&mut page, &options, &strings).await.unwrap();
        assert_eq!(second, BootOutcome::AlreadyLoaded);
        assert_eq!(page.count_elements("cw-chat-widget-icon"), 1);
        assert_eq!(page.count_elements("cw-chat-widget-panel"), 1);
    }

    #[tokio::test]
    async fn waits_for_ready_and_retries_injection() {
        let options = fast();
        let strings = options.locale.strings(None);
        let mut page = MemoryPage::new().not_ready_for(3).failing_injections(4);
        let mut boot = Bootstrap::new();

        let outcome = boot.run(&mut page, &options, &strings).await.unwrap();
        assert!(matches!(outcome, BootOutcome::Injected { attempts: 5, .. }));
        assert_eq!(boot.state(), LifecycleState::Injected);
        assert_eq!(page.count_elements("cw-chat-widget"), 1);
    }

    #[tokio::test]
    async fn page_global_overrides_endpoint() {
        let options = fast();
        let strings = options.locale.strings(None);
        let mut page = MemoryPage::new().with_endpoint_override("https://bot.example/chat");

        let outcome = Bootstrap::new().run(&mut page, &options, &strings).await.unwrap();
        assert_eq!(outcome.endpoint(), Some("https://bot.example/chat"));
    }

    #[tokio::test]
    async fn existing_root_is_adopted() {
        let options = fast();
        let strings = options.locale.strings(None);
        let mut page = MemoryPage::new();
        page.inject(&options, &strings).await.unwrap();

        let outcome = Bootstrap::new().run(&mut page, &options, &strings).await.unwrap();
        assert!(matches!(outcome, BootOutcome::Adopted { .. }));
        assert_eq!(page.inject_attempts, 1);
    }

    #[tokio::test]
    async fn root_built_during_injection_is_adopted() {
        let options = fast();
        let strings = options.locale.strings(None);
        let mut page = MemoryPage::new().root_built_concurrently();

        let outcome = Bootstrap::new().run(&mut page, &options, &strings).await.unwrap();
        assert!(matches!(outcome, BootOutcome::Adopted { .. }));
        assert_eq!(page.inject_attempts, 1);
        assert_eq!(page.count_elements("cw-chat-widget-panel"), 1);
    }
}
