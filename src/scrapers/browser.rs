use crate::scrapers::crawl::PageRenderer;
use crate::scrapers::types::BrowserSettings;
use anyhow::{bail, Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use serde_json::Value;
use tracing::{debug, info};

/// One headless Chrome process with a single tab, owned by one crawler.
///
/// The process is shut down by `close` or, failing that, when the session is
/// dropped.
pub struct BrowserSession {
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
}

impl BrowserSession {
    /// Launch Chrome and open the tab every page is rendered in
    pub fn launch(settings: &BrowserSettings) -> Result<Self> {
        info!("Launching headless Chrome...");

        let options = LaunchOptions::default_builder()
            .headless(settings.headless)
            .sandbox(false)
            .args(vec![OsStr::new("--disable-dev-shm-usage")])
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;

        let tab = browser.new_tab().context("Failed to open browser tab")?;
        tab.set_default_timeout(settings.page_timeout);
        tab.set_user_agent(&settings.user_agent, Some("fr-FR,fr;q=0.9"), None)
            .context("Failed to set user agent")?;

        Ok(Self {
            browser: Some(browser),
            tab: Some(tab),
        })
    }
}

impl PageRenderer for BrowserSession {
    fn render(&mut self, url: &str) -> Result<String> {
        let tab = self.tab.as_ref().context("Browser session is closed")?;

        tab.navigate_to(url)
            .with_context(|| format!("Failed to navigate to {}", url))?;
        tab.wait_until_navigated()
            .with_context(|| format!("Page did not finish loading: {}", url))?;

        let html_result = tab
            .evaluate("document.documentElement.outerHTML", false)
            .context("Failed to read page HTML")?;
        let html = page_html(html_result.value, url)?;

        debug!(url, bytes = html.len(), "Rendered page");
        Ok(html)
    }

    fn close(&mut self) {
        if let Some(tab) = self.tab.take() {
            if let Err(e) = tab.close(false) {
                debug!("Tab was already gone: {}", e);
            }
        }
        if self.browser.take().is_some() {
            info!("Closed headless Chrome");
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Markup returned by the `outerHTML` evaluation.
///
/// Anything but a string is an error, so a broken page is never mistaken for
/// an empty results page.
fn page_html(value: Option<Value>, url: &str) -> Result<String> {
    match value {
        Some(Value::String(html)) => Ok(html),
        Some(other) => bail!("Page HTML was not a string ({}): {}", other, url),
        None => bail!("Could not get HTML from page: {}", url),
    }
}
