mod cli;

use std::io::Write;

use anyhow::{Context, Result};
use chat_widget::{
    BrowserClient, BrowserPage, Controller, HttpReplyService, MemoryPage,
    Sender, WidgetOptions,
};
use clap::Parser;
use cli::{Cli, Commands};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Open {
            url,
            browser,
            widget,
        } => {
            let options = widget.to_options();
            options.validate()?;

            let mut browser = BrowserClient::connect(browser.to_options())
                .await
                .context("could not start a browser session")?;
            browser.navigate(&url).await?;

            let replies = HttpReplyService::new(&options.endpoint, &options)?;
            let page = BrowserPage::new(browser, &options);
            let mut controller = Controller::new(page, replies, options);

            println!("Widget served on {url}. Ctrl+C to exit.");

            let served = tokio::select! {
                result = controller.run() => result,
                _ = tokio::signal::ctrl_c() => {
                    log::info!("Interrupted, closing browser");
                    Ok(())
                }
            };

            if let Err(e) = controller.into_page().into_browser().shutdown().await {
                log::warn!("Failed to close browser: {e}");
            }
            served.context("widget stopped")?;
        }
        Commands::Chat { widget } => {
            let options = widget
                .to_options()
                .settle_delay(Duration::ZERO)
                .retry_delay(Duration::ZERO);
            options.validate()?;
            chat(options).await?;
        }
    }

    Ok(())
}

/// Line-based session against an in-memory page.
async fn chat(options: WidgetOptions) -> Result<()> {
    let replies = HttpReplyService::new(&options.endpoint, &options)?;
    let mut controller = Controller::new(MemoryPage::new(), replies, options);
    controller.bootstrap().await?;
    log::info!("Replies from {}", controller.replies().endpoint());

    let mut shown = print_new_entries(&controller, 0);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        controller.page_mut().submit(&line);
        controller.pump_page().await?;
        controller.settle_all().await?;
        shown = print_new_entries(&controller, shown);
    }

    Ok(())
}

fn print_new_entries(
    controller: &Controller<MemoryPage, HttpReplyService>,
    shown: usize,
) -> usize {
    let widget = controller.widget();
    let bot = &widget.strings().bot_name;
    let mut count = 0;
    for entry in widget.transcript().entries() {
        count += 1;
        if count <= shown {
            continue;
        }
        match entry.sender {
            Sender::User => {}
            Sender::Bot => println!("{bot}: {}", entry.text),
            Sender::BotError => println!("{bot} (!): {}", entry.text),
        }
    }
    count
}
