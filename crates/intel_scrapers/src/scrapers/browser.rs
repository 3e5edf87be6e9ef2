use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tracing::warn;

use intel_core::{Error, Result};

/// Visible text pulled out of a rendered page.
pub struct RenderedPage {
    pub title: Option<String>,
    pub body_text: String,
}

/// Renders a page in a headless browser scoped to this single call and
/// returns its visible text.
///
/// The browser process and its event handler are torn down before this
/// function returns, on success, error and timeout alike. Navigation is
/// bounded by `timeout`; a page that never settles cannot hold the browser
/// open past it.
pub async fn fetch_rendered(url: &str, timeout: Duration) -> Result<RenderedPage> {
    let config = BrowserConfig::builder()
        .build()
        .map_err(Error::Scraping)?;
    let (mut browser, mut handler) = Browser::launch(config)
        .await
        .map_err(|e| Error::Scraping(format!("failed to launch browser: {}", e)))?;

    let handler_task = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    });

    let outcome = tokio::time::timeout(timeout, render(&browser, url)).await;

    if let Err(e) = browser.close().await {
        warn!("failed to close browser: {}", e);
    }
    let _ = browser.wait().await;
    handler_task.abort();

    match outcome {
        Ok(result) => result,
        Err(_) => Err(Error::Scraping(format!(
            "browser navigation timed out after {}s for {}",
            timeout.as_secs(),
            url
        ))),
    }
}

async fn render(browser: &Browser, url: &str) -> Result<RenderedPage> {
    let page = browser
        .new_page(url)
        .await
        .map_err(|e| Error::Scraping(format!("failed to open page: {}", e)))?;

    page.wait_for_navigation()
        .await
        .map_err(|e| Error::Scraping(format!("navigation failed: {}", e)))?;

    let body_text: String = page
        .evaluate("document.body ? document.body.innerText : ''")
        .await
        .map_err(|e| Error::Scraping(format!("failed to read page body: {}", e)))?
        .into_value()
        .map_err(|e| Error::Scraping(format!("unexpected page body value: {}", e)))?;

    let title: Option<String> = page
        .evaluate("(() => { const h = document.querySelector('h1'); return h ? h.innerText : null; })()")
        .await
        .map_err(|e| Error::Scraping(format!("failed to read page title: {}", e)))?
        .into_value()
        .unwrap_or(None);

    if let Err(e) = page.close().await {
        warn!("failed to close page: {}", e);
    }

    Ok(RenderedPage { title, body_text })
}
