use fantoccini::{Client, ClientBuilder, wd::Capabilities};
use serde_json::{Value, json};
use tokio::time::Duration;

use crate::dom::{self, ElementIds, UiEvent};
use crate::js;
use crate::locale::Strings;
use crate::page::HostPage;
use crate::types::{BrowserOptions, WidgetError, WidgetOptions};

/// WebDriver session powered by `fantoccini`.
pub struct BrowserClient {
    /// The underlying WebDriver client instance.
    pub client: Client,
}

impl BrowserClient {
    /// Connects to the WebDriver server with the given options.
    pub async fn connect(options: BrowserOptions) -> Result<Self, WidgetError> {
        let mut caps = Capabilities::new();

        let mut firefox_options = json!({
            "args": if options.headless {
                vec!["-headless"]
            } else {
                vec![]
            }
        });

        if let Some(ua) = &options.user_agent {
            firefox_options["prefs"] = json!({
                "general.useragent.override": ua
            });
        }

        caps.insert("moz:firefoxOptions".to_string(), firefox_options);

        if let Some(proxy) = &options.proxy {
            caps.insert(
                "proxy".to_string(),
                json!({
                    "proxyType": "manual",
                    "httpProxy": proxy,
                    "sslProxy" : proxy
                }),
            );
        }

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&options.webdriver_url)
            .await
            .map_err(|e| WidgetError::ConnectionError(e.to_string()))?;

        if let Some((width, height)) = options.window_size {
            client
                .set_window_size(width, height)
                .await
                .map_err(|e| WidgetError::OperationError(e.to_string()))?;
        }

        log::info!("Connected to WebDriver at {}", options.webdriver_url);
        Ok(Self { client })
    }

    /// Navigates the current tab to the given URL.
    pub async fn navigate(&mut self, url: &str) -> Result<(), WidgetError> {
        log::info!("Navigating to {url}");
        self.client
            .goto(url)
            .await
            .map_err(|e| WidgetError::OperationError(e.to_string()))
    }

    /// Runs a script in the current page and returns its result.
    pub async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, WidgetError> {
        self.client
            .execute(script, args)
            .await
            .map_err(|e| WidgetError::OperationError(e.to_string()))
    }

    /// Shuts down the browser session and closes the webdriver.
    pub async fn shutdown(self) -> Result<(), WidgetError> {
        self.client
            .close()
            .await
            .map_err(|e| WidgetError::OperationError(e.to_string()))
    }
}

/// A browser tab hosting one widget instance.
pub struct BrowserPage {
    browser: BrowserClient,
    ids: ElementIds,
}

impl BrowserPage {
    pub fn new(browser: BrowserClient, options: &WidgetOptions) -> Self {
        Self {
            browser,
            ids: ElementIds::new(&options.widget_id),
        }
    }

    pub fn browser_mut(&mut self) -> &mut BrowserClient {
        &mut self.browser
    }

    pub fn into_browser(self) -> BrowserClient {
        self.browser
    }

    /// Runs an element script that answers `false` when its element is gone.
    async fn on_element(&self, script: &str, id: &str, args: Vec<Value>) -> Result<(), WidgetError> {
        let found = self.browser.execute(script, args).await?;
        match found.as_bool() {
            Some(true) => Ok(()),
            _ => Err(WidgetError::OperationError(format!(
                "Widget element not found: #{id}"
            ))),
        }
    }
}

impl HostPage for BrowserPage {
    async fn is_ready(&mut self) -> Result<bool, WidgetError> {
        let ready = self.browser.execute(js::PAGE_READY, vec![]).await?;
        Ok(ready.as_bool().unwrap_or(false))
    }

    async fn claim(&mut self, key: &str) -> Result<bool, WidgetError> {
        let first = self
            .browser
            .execute(js::CLAIM_REGISTRY_KEY, vec![json!(key)])
            .await?;
        Ok(first.as_bool().unwrap_or(false))
    }

    async fn has_element(&mut self, id: &str) -> Result<bool, WidgetError> {
        let found = self.browser.execute(js::HAS_ELEMENT, vec![json!(id)]).await?;
        Ok(found.as_bool().unwrap_or(false))
    }

    async fn inject(&mut self, options: &WidgetOptions, strings: &Strings) -> Result<bool, WidgetError> {
        let config = json!({
            "ids": &self.ids,
            "accent": &options.accent,
            "strings": strings,
        });

        let created = self
            .browser
            .client
            .execute(js::INJECT_WIDGET, vec![config])
            .await
            .map_err(|e| WidgetError::InjectionError(e.to_string()))?;

        let created = created.as_bool().unwrap_or(true);
        if !created {
            log::debug!("#{} already present, nothing built", self.ids.root);
        }
        Ok(created)
    }

    async fn endpoint_override(&mut self) -> Result<Option<String>, WidgetError> {
        let value = self.browser.execute(js::ENDPOINT_OVERRIDE, vec![]).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn drain_events(&mut self) -> Result<Vec<UiEvent>, WidgetError> {
        let value = self
            .browser
            .execute(js::DRAIN_EVENTS, vec![json!(self.ids.root)])
            .await?;
        dom::decode_events(value)
    }

    async fn set_panel_visible(&mut self, visible: bool) -> Result<(), WidgetError> {
        let args = vec![json!(self.ids.panel), json!(visible)];
        self.on_element(js::SET_PANEL_VISIBLE, &self.ids.panel, args)
            .await
    }

    async fn focus_input(&mut self, delay: Duration) -> Result<(), WidgetError> {
        let args = vec![json!(self.ids.input), json!(delay.as_millis() as u64)];
        self.on_element(js::FOCUS_INPUT, &self.ids.input, args).await
    }

    // The page empties the input itself when it queues a submission.
    async fn clear_input(&mut self) -> Result<(), WidgetError> {
        Ok(())
    }

    async fn render_transcript(&mut self, html: &str) -> Result<(), WidgetError> {
        let args = vec![json!(self.ids.log), json!(html)];
        self.on_element(js::RENDER_TRANSCRIPT, &self.ids.log, args)
            .await
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), WidgetError> {
        let args = vec![json!(self.ids.log)];
        self.on_element(js::SCROLL_TO_BOTTOM, &self.ids.log, args)
            .await
    }
}
