use chat_widget::{
    BrowserOptions, Locale, WidgetOptions,
    types::{DEFAULT_ENDPOINT, DEFAULT_WEBDRIVER_URL, DEFAULT_WIDGET_ID},
};
use clap::{Args, Parser, Subcommand};
use tokio::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "cw",
    about = "Embeddable chat widget: inject it into a page or talk to its reply service",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open a page in a WebDriver browser and serve the widget on it
    Open {
        /// The page to host the widget
        #[arg(short, long)]
        url: String,

        #[command(flatten)]
        browser: BrowserArgs,

        #[command(flatten)]
        widget: WidgetArgs,
    },
    /// Chat with the reply service from the terminal
    Chat {
        #[command(flatten)]
        widget: WidgetArgs,
    },
}

#[derive(Args, Debug)]
pub struct BrowserArgs {
    /// WebDriver server address
    #[arg(long, env = "WEBDRIVER_URL", default_value = DEFAULT_WEBDRIVER_URL)]
    pub webdriver: String,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,

    /// Browser window size, as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_window_size)]
    pub window_size: Option<(u32, u32)>,

    /// Proxy for the browser's HTTP and HTTPS traffic
    #[arg(long)]
    pub proxy: Option<String>,

    /// User agent the browser reports
    #[arg(long)]
    pub user_agent: Option<String>,
}

impl BrowserArgs {
    pub fn to_options(&self) -> BrowserOptions {
        let mut options = BrowserOptions::new()
            .webdriver_url(&self.webdriver)
            .headless(self.headless);

        if let Some((width, height)) = self.window_size {
            options = options.window_size(width, height);
        }
        if let Some(proxy) = &self.proxy {
            options = options.proxy(proxy);
        }
        if let Some(ua) = &self.user_agent {
            options = options.user_agent(ua);
        }
        options
    }
}

fn parse_window_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let width = width.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let height = height.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    Ok((width, height))
}

#[derive(Args, Debug)]
pub struct WidgetArgs {
    /// Reply service URL
    #[arg(short, long, env = "CHAT_WIDGET_URL", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Language of the widget's built-in strings
    #[arg(long, value_enum, default_value_t = Locale::En)]
    pub locale: Locale,

    /// Phone number offered when a reply fails
    #[arg(long)]
    pub phone: Option<String>,

    /// Accent colour (any CSS colour)
    #[arg(long, default_value = "#2ecc71")]
    pub accent: String,

    /// Reserved id of the widget root element
    #[arg(long, default_value = DEFAULT_WIDGET_ID)]
    pub widget_id: String,

    /// Start with an empty transcript instead of a greeting
    #[arg(long)]
    pub no_greeting: bool,

    /// Give up on a reply after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Milliseconds to wait after the page is ready before injecting
    #[arg(long, default_value_t = 1000)]
    pub settle_ms: u64,

    /// Milliseconds between injection retries
    #[arg(long, default_value_t = 1000)]
    pub retry_ms: u64,

    /// Milliseconds between opening the panel and focusing the input
    #[arg(long, default_value_t = 100)]
    pub focus_ms: u64,

    /// Milliseconds between polls of the page for clicks and messages
    #[arg(long, default_value_t = 250)]
    pub poll_ms: u64,
}

impl WidgetArgs {
    pub fn to_options(&self) -> WidgetOptions {
        let mut options = WidgetOptions::new()
            .endpoint(&self.endpoint)
            .locale(self.locale)
            .accent(&self.accent)
            .widget_id(&self.widget_id)
            .greeting(!self.no_greeting)
            .settle_delay(Duration::from_millis(self.settle_ms))
            .retry_delay(Duration::from_millis(self.retry_ms))
            .focus_delay(Duration::from_millis(self.focus_ms))
            .poll_interval(Duration::from_millis(self.poll_ms));

        if let Some(phone) = &self.phone {
            options = options.contact_phone(phone);
        }
        if let Some(seconds) = self.timeout {
            options = options.request_timeout(seconds);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_flags_reach_options() {
        let cli = Cli::try_parse_from([
            "cw",
            "open",
            "--url",
            "https://example.com",
            "--window-size",
            "1024x768",
            "--proxy",
            "http://127.0.0.1:8080",
            "--user-agent",
            "cw-test",
        ])
        .unwrap();

        let Commands::Open { browser, .. } = cli.command else {
            panic!("expected open");
        };
        let options = browser.to_options();
        assert_eq!(options.window_size, Some((1024, 768)));
        assert_eq!(options.proxy.as_deref(), Some("http://127.0.0.1:8080"));
        assert_eq!(options.user_agent.as_deref(), Some("cw-test"));
    }

    #[test]
    fn window_size_must_be_width_by_height() {
        assert_eq!(parse_window_size("800X600"), Ok((800, 600)));
        assert!(parse_window_size("800").is_err());
        assert!(parse_window_size("wide x 600").is_err());
    }

    #[test]
    fn timing_flags_reach_options() {
        let cli = Cli::try_parse_from(["cw", "chat", "--focus-ms", "0", "--poll-ms", "50"]).unwrap();
        let Commands::Chat { widget } = cli.command else {
            panic!("expected chat");
        };
        let options = widget.to_options();
        assert!(options.focus_delay.is_zero());
        assert_eq!(options.poll_interval, Duration::from_millis(50));
    }
}
