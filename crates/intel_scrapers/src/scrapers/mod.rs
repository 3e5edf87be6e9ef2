use std::time::Duration;

use async_trait::async_trait;

use intel_core::{Result, ScrapedArticle, Settings};

pub mod browser;
pub mod nvidia;

use nvidia::NvidiaScraper;

/// Per-source extraction settings: how many candidates a discovery pass may
/// yield and the bound on each network wait.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub max_articles: usize,
    pub timeout: Duration,
}

impl ScrapeConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_articles: settings.max_articles,
            timeout: Duration::from_secs(settings.scrape_timeout_secs),
        }
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_articles: 100,
            timeout: Duration::from_secs(30),
        }
    }
}

/// A source-specific extractor. Implementations are stateless transformers:
/// they fetch and parse, but never touch persisted state.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Human-readable name of the news source.
    fn source(&self) -> &str;

    /// True if this scraper understands the given URL.
    fn can_handle(&self, url: &str) -> bool;

    /// Candidate article URLs discovered from the source's listing page,
    /// bounded by the configured maximum.
    async fn article_urls(&self) -> Result<Vec<String>>;

    /// Extracts a single article, trying the static strategy first and the
    /// rendered fallback second, with bounded retries around the pair.
    async fn scrape_article(&self, url: &str) -> Result<ScrapedArticle>;
}

pub type BoxedScraper = Box<dyn Scraper>;
pub type ScraperFactory = fn(&ScrapeConfig) -> BoxedScraper;

/// Source-name lookup table. New sources register here.
const SOURCES: &[(&str, ScraperFactory)] =
    &[("nvidia", |config| Box::new(NvidiaScraper::new(config)))];

pub fn available_sources() -> Vec<&'static str> {
    SOURCES.iter().map(|(name, _)| *name).collect()
}

pub fn scraper_for_source(name: &str, config: &ScrapeConfig) -> Option<BoxedScraper> {
    SOURCES
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|(_, factory)| factory(config))
}

pub fn scraper_for_url(url: &str, config: &ScrapeConfig) -> Option<BoxedScraper> {
    SOURCES
        .iter()
        .map(|(_, factory)| factory(config))
        .find(|scraper| scraper.can_handle(url))
}
