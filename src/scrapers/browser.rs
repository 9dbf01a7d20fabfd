use crate::scrapers::fetch::PageFetcher;
use anyhow::{Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Page fetcher that renders listings in headless Chrome, for sites that
/// only fill in their details from JavaScript
pub struct BrowserFetcher {
    browser: Arc<Browser>,
    settle: Duration,
}

impl BrowserFetcher {
    pub fn new(settle: Duration) -> Result<Self> {
        info!("Launching headless Chrome...");

        let options = LaunchOptions::default_builder()
            .headless(true)
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;

        Ok(Self {
            browser: Arc::new(browser),
            settle,
        })
    }
}

fn render(browser: &Browser, url: &str, settle: Duration) -> Result<String> {
    let tab = browser.new_tab()?;

    tab.navigate_to(url)?;
    tab.wait_until_navigated()?;

    debug!("Waiting {:?} for {} to settle", settle, url);
    thread::sleep(settle);

    let result = tab.evaluate("document.documentElement.outerHTML", false)?;
    let html = result
        .value
        .and_then(|value| value.as_str().map(str::to_string))
        .with_context(|| format!("Could not get HTML from {}", url))?;

    if let Err(e) = tab.close(true) {
        debug!("Failed to close tab for {}: {}", url, e);
    }

    debug!("Rendered {} bytes of HTML from {}", html.len(), url);
    Ok(html)
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let browser = Arc::clone(&self.browser);
        let url = url.to_string();
        let settle = self.settle;

        tokio::task::spawn_blocking(move || render(&browser, &url, settle))
            .await
            .context("Browser task panicked")?
    }
}
