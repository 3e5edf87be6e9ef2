use std::collections::HashSet;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use scraper::{Html, Selector};
use tokio::time::sleep;
use tracing::{error, info, warn};

use intel_core::{ArticleMetadata, Error, ExtractionMethod, Result, ScrapedArticle};

use crate::clean::{clean_text, extract_title_from_content};
use crate::scrapers::{browser, ScrapeConfig, Scraper};

const NEWSROOM_URL: &str = "https://nvidianews.nvidia.com/news";
const NEWSROOM_BASE: &str = "https://nvidianews.nvidia.com";
const SOURCE_NAME: &str = "NVIDIA Newsroom";
const MAX_RETRIES: u32 = 2;

/// Scraper for the NVIDIA Newsroom.
///
/// Discovery parses the listing page; per-article extraction tries a static
/// fetch first and falls back to a rendered-browser pass for script-assembled
/// pages.
pub struct NvidiaScraper {
    client: Client,
    max_articles: usize,
    timeout: Duration,
}

impl NvidiaScraper {
    pub fn new(config: &ScrapeConfig) -> Self {
        Self {
            client: Client::new(),
            max_articles: config.max_articles,
            timeout: config.timeout,
        }
    }

    /// One full extraction attempt: static, then rendered. `None` from a
    /// strategy means empty or missing content and triggers the next one.
    async fn extract_once(&self, url: &str) -> Result<ScrapedArticle> {
        let started = Instant::now();

        if let Some(mut article) = self.extract_static(url).await {
            article.metadata.processing_time = Some(started.elapsed().as_secs_f64());
            return Ok(article);
        }

        info!(url, "static extraction yielded no content, trying rendered fallback");

        if let Some(mut article) = self.extract_rendered(url).await {
            article.metadata.processing_time = Some(started.elapsed().as_secs_f64());
            return Ok(article);
        }

        Err(Error::Scraping(format!(
            "both static and rendered extraction failed for {}",
            url
        )))
    }

    async fn extract_static(&self, url: &str) -> Option<ScrapedArticle> {
        let response = match self.client.get(url).timeout(self.timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url, "static fetch failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(url, status = %response.status(), "static fetch returned an error status");
            return None;
        }

        let html = match response.text().await {
            Ok(html) => html,
            Err(e) => {
                warn!(url, "failed to read page body: {}", e);
                return None;
            }
        };

        let article = parse_static_article(&html, url);
        if article.is_none() {
            warn!(url, "static extraction returned no content");
        }
        article
    }

    async fn extract_rendered(&self, url: &str) -> Option<ScrapedArticle> {
        let page = match browser::fetch_rendered(url, self.timeout).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url, "rendered extraction failed: {}", e);
                return None;
            }
        };

        let content = clean_text(&page.body_text);
        if content.is_empty() {
            warn!(url, "rendered extraction returned no content");
            return None;
        }

        let title = page
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| extract_title_from_content(&content));

        Some(ScrapedArticle {
            url: url.to_string(),
            title,
            content,
            publish_date: Utc::now(),
            source: SOURCE_NAME.to_string(),
            metadata: ArticleMetadata::new(ExtractionMethod::Rendered),
        })
    }
}

#[async_trait]
impl Scraper for NvidiaScraper {
    fn source(&self) -> &str {
        SOURCE_NAME
    }

    fn can_handle(&self, url: &str) -> bool {
        url.contains("nvidianews.nvidia.com")
    }

    async fn article_urls(&self) -> Result<Vec<String>> {
        info!("fetching article listing from {}", NEWSROOM_URL);

        let response = self
            .client
            .get(NEWSROOM_URL)
            .timeout(self.timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::Scraping(format!(
                "listing fetch returned HTTP {}",
                response.status()
            )));
        }

        let html = response.text().await?;
        let urls = parse_listing(&html, self.max_articles);
        info!(count = urls.len(), "extracted article URLs");
        Ok(urls)
    }

    async fn scrape_article(&self, url: &str) -> Result<ScrapedArticle> {
        let mut attempt: u32 = 1;
        loop {
            match self.extract_once(url).await {
                Ok(article) => {
                    info!(url, title = %article.title, "article extracted");
                    return Ok(article);
                }
                Err(e) if attempt < MAX_RETRIES => {
                    let backoff = Duration::from_secs(1u64 << attempt);
                    warn!(
                        url,
                        attempt,
                        backoff_secs = backoff.as_secs(),
                        "extraction attempt failed, retrying: {}",
                        e
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(url, attempts = attempt, "all extraction attempts failed");
                    return Err(e);
                }
            }
        }
    }
}

/// Pulls candidate article URLs out of the newsroom listing page. Each card
/// is an `<article>` with the link inside its `<h3>`.
fn parse_listing(html: &str, max_articles: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("article h3 a").unwrap();

    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for link in document.select(&link_selector) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let url = if href.starts_with('/') {
            format!("{}{}", NEWSROOM_BASE, href)
        } else {
            href.to_string()
        };
        if !url.starts_with("http") {
            continue;
        }
        if seen.insert(url.clone()) {
            urls.push(url);
        }
        if urls.len() >= max_articles {
            break;
        }
    }

    urls
}

fn parse_static_article(html: &str, url: &str) -> Option<ScrapedArticle> {
    let document = Html::parse_document(html);

    let content = clean_text(&extract_article_text(&document));
    if content.is_empty() {
        return None;
    }

    let title = document_title(&document)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| extract_title_from_content(&content));

    let publish_date = published_time(&document).unwrap_or_else(Utc::now);

    Some(ScrapedArticle {
        url: url.to_string(),
        title,
        content,
        publish_date,
        source: SOURCE_NAME.to_string(),
        metadata: ArticleMetadata::new(ExtractionMethod::Static),
    })
}

fn extract_article_text(document: &Html) -> String {
    for selector in ["article p", "main p", "p"] {
        let selector = Selector::parse(selector).unwrap();
        let paragraphs: Vec<String> = document
            .select(&selector)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
            .collect();
        if !paragraphs.is_empty() {
            return paragraphs.join("\n\n");
        }
    }
    String::new()
}

fn document_title(document: &Html) -> Option<String> {
    let og_title = Selector::parse("meta[property='og:title']").unwrap();
    if let Some(content) = document
        .select(&og_title)
        .next()
        .and_then(|el| el.value().attr("content"))
    {
        if !content.trim().is_empty() {
            return Some(content.to_string());
        }
    }

    let title = Selector::parse("title").unwrap();
    if let Some(el) = document.select(&title).next() {
        let text = el.text().collect::<String>();
        if !text.trim().is_empty() {
            return Some(text);
        }
    }

    let h1 = Selector::parse("h1").unwrap();
    document
        .select(&h1)
        .next()
        .map(|el| el.text().collect::<String>())
        .filter(|text| !text.trim().is_empty())
}

fn published_time(document: &Html) -> Option<DateTime<Utc>> {
    let selector = Selector::parse("meta[property='article:published_time']").unwrap();
    let raw = document
        .select(&selector)
        .next()?
        .value()
        .attr("content")?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
