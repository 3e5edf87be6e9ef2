use std::sync::Arc;

use tracing::{error, info, warn};

use intel_core::{ArticleAnalyzer, ArticleStore, Error, Result, ScrapedArticle};

use crate::scrapers::{self, ScrapeConfig, Scraper};

/// Counts reported at the end of every pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub extracted: usize,
    pub stored: usize,
    pub analyzed: usize,
    pub failed: usize,
}

/// Sequences one ingestion run: discover and extract, store as pending,
/// analyze, apply results. Failures are isolated per article; only a
/// store-level failure aborts the run, and the caller decides whether the
/// process keeps serving.
pub struct PipelineManager {
    store: Arc<dyn ArticleStore>,
    analyzer: Arc<dyn ArticleAnalyzer>,
    config: ScrapeConfig,
}

impl PipelineManager {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        analyzer: Arc<dyn ArticleAnalyzer>,
        config: ScrapeConfig,
    ) -> Self {
        Self {
            store,
            analyzer,
            config,
        }
    }

    /// Runs the pipeline for a registered source name.
    pub async fn run(&self, source: &str) -> Result<PipelineReport> {
        let scraper = scrapers::scraper_for_source(source, &self.config)
            .ok_or_else(|| Error::Config(format!("unknown source: {}", source)))?;
        self.run_with_scraper(scraper.as_ref()).await
    }

    pub async fn run_with_scraper(&self, scraper: &dyn Scraper) -> Result<PipelineReport> {
        info!(source = scraper.source(), "starting pipeline run");

        let articles = self.extract_stage(scraper).await?;
        let stored = self.store_stage(&articles).await;
        let outcomes = self.analyze_stage(&stored).await;
        let (analyzed, failed) = self.update_stage(outcomes).await;

        let report = PipelineReport {
            extracted: articles.len(),
            stored: stored.len(),
            analyzed,
            failed,
        };

        let stats = self.store.stats().await?;
        info!(
            extracted = report.extracted,
            stored = report.stored,
            analyzed = report.analyzed,
            failed = report.failed,
            total_records = stats.total,
            "✅ pipeline run complete"
        );

        Ok(report)
    }

    /// Stage 1: discovery plus per-URL extraction. A URL that fails
    /// extraction is logged and skipped; the rest of the batch continues.
    async fn extract_stage(&self, scraper: &dyn Scraper) -> Result<Vec<ScrapedArticle>> {
        let urls = scraper.article_urls().await?;
        let candidates: Vec<String> = urls.into_iter().take(self.config.max_articles).collect();
        info!(
            count = candidates.len(),
            source = scraper.source(),
            "discovered candidate URLs"
        );

        let mut articles = Vec::new();
        for (i, url) in candidates.iter().enumerate() {
            info!(url = %url, progress = %format!("{}/{}", i + 1, candidates.len()), "📰 extracting article");
            match scraper.scrape_article(url).await {
                Ok(article) => articles.push(article),
                Err(e) => error!(url = %url, "failed to extract article: {}", e),
            }
        }

        info!(
            extracted = articles.len(),
            failed = candidates.len() - articles.len(),
            "extraction stage complete"
        );
        Ok(articles)
    }

    /// Stage 2: upsert each article as pending. A storage failure for one
    /// article is logged and skipped.
    async fn store_stage(&self, articles: &[ScrapedArticle]) -> Vec<ScrapedArticle> {
        let mut stored = Vec::new();
        for article in articles {
            match self.store.upsert_scraped(article).await {
                Ok(()) => stored.push(article.clone()),
                Err(e) => error!(url = %article.url, "failed to store article: {}", e),
            }
        }
        stored
    }

    /// Stage 3: analyze one article at a time. The inference backend is a
    /// single shared resource, so there is no fan-out here.
    async fn analyze_stage(
        &self,
        articles: &[ScrapedArticle],
    ) -> Vec<(String, Result<intel_core::AnalysisResult>)> {
        let mut outcomes = Vec::with_capacity(articles.len());
        for article in articles {
            info!(url = %article.url, "🤖 analyzing article");
            let outcome = self.analyzer.analyze(article).await;
            if let Err(e) = &outcome {
                warn!(url = %article.url, "analysis failed: {}", e);
            }
            outcomes.push((article.url.clone(), outcome));
        }
        outcomes
    }

    /// Stage 4: persist each outcome — analysis fields and completion, or a
    /// failure marker that leaves the scraped fields untouched.
    async fn update_stage(
        &self,
        outcomes: Vec<(String, Result<intel_core::AnalysisResult>)>,
    ) -> (usize, usize) {
        let mut analyzed = 0;
        let mut failed = 0;

        for (url, outcome) in outcomes {
            match outcome {
                Ok(analysis) => match self.store.apply_analysis(&url, &analysis).await {
                    Ok(true) => analyzed += 1,
                    Ok(false) => {
                        warn!(url = %url, "record disappeared before analysis update");
                        failed += 1;
                    }
                    Err(e) => {
                        error!(url = %url, "failed to apply analysis: {}", e);
                        if let Err(mark_err) = self.store.mark_failed(&url, &e.to_string()).await {
                            error!(url = %url, "failed to record failure: {}", mark_err);
                        }
                        failed += 1;
                    }
                },
                Err(e) => {
                    if let Err(mark_err) = self.store.mark_failed(&url, &e.to_string()).await {
                        error!(url = %url, "failed to record failure: {}", mark_err);
                    }
                    failed += 1;
                }
            }
        }

        (analyzed, failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use intel_core::{
        AnalysisResult, ArticleMetadata, ArticleStatus, Classification, Entity, EntityType,
        ExtractionMethod,
    };
    use intel_storage::MemoryStore;

    fn article(n: usize) -> ScrapedArticle {
        ScrapedArticle {
            url: format!("https://nvidianews.nvidia.com/news/article-{}", n),
            title: format!("Announcement {}", n),
            content: format!("NVIDIA announced product number {} today.", n),
            publish_date: Utc::now(),
            source: "NVIDIA Newsroom".to_string(),
            metadata: ArticleMetadata::new(ExtractionMethod::Static),
        }
    }

    struct FixtureScraper {
        articles: Vec<ScrapedArticle>,
        broken_urls: Vec<String>,
    }

    #[async_trait]
    impl Scraper for FixtureScraper {
        fn source(&self) -> &str {
            "NVIDIA Newsroom"
        }

        fn can_handle(&self, url: &str) -> bool {
            url.contains("nvidianews.nvidia.com")
        }

        async fn article_urls(&self) -> Result<Vec<String>> {
            let mut urls: Vec<String> =
                self.articles.iter().map(|a| a.url.clone()).collect();
            urls.extend(self.broken_urls.iter().cloned());
            Ok(urls)
        }

        async fn scrape_article(&self, url: &str) -> Result<ScrapedArticle> {
            self.articles
                .iter()
                .find(|a| a.url == url)
                .cloned()
                .ok_or_else(|| Error::Scraping(format!("extraction failed for {}", url)))
        }
    }

    /// Analyzer that fails validation for the configured URLs.
    struct SelectiveAnalyzer {
        reject: Vec<String>,
    }

    #[async_trait]
    impl ArticleAnalyzer for SelectiveAnalyzer {
        async fn analyze(&self, article: &ScrapedArticle) -> Result<AnalysisResult> {
            if self.reject.contains(&article.url) {
                return Err(Error::validation(
                    "response",
                    "no JSON object found in inference output",
                ));
            }
            Ok(AnalysisResult {
                summary: "NVIDIA announced a new product for data centers.".to_string(),
                entities: vec![Entity {
                    text: "NVIDIA".to_string(),
                    entity_type: EntityType::Company,
                    mentions: 2,
                }],
                classification: Classification::ProductLaunch,
                sentiment_score: 8,
            })
        }
    }

    fn manager(
        store: Arc<MemoryStore>,
        articles: Vec<ScrapedArticle>,
        reject: Vec<String>,
    ) -> (PipelineManager, FixtureScraper) {
        let analyzer = Arc::new(SelectiveAnalyzer { reject });
        let manager = PipelineManager::new(store, analyzer, ScrapeConfig::default());
        let scraper = FixtureScraper {
            articles,
            broken_urls: Vec::new(),
        };
        (manager, scraper)
    }

    #[tokio::test]
    async fn one_validation_failure_does_not_poison_the_batch() {
        let store = Arc::new(MemoryStore::new());
        let articles = vec![article(1), article(2), article(3)];
        let rejected = articles[1].url.clone();
        let (manager, scraper) = manager(store.clone(), articles.clone(), vec![rejected.clone()]);

        let report = manager.run_with_scraper(&scraper).await.unwrap();
        assert_eq!(report.extracted, 3);
        assert_eq!(report.stored, 3);
        assert_eq!(report.analyzed, 2);
        assert_eq!(report.failed, 1);

        for (i, a) in articles.iter().enumerate() {
            let record = store.get(&a.url).await.unwrap().unwrap();
            if i == 1 {
                assert_eq!(record.status, ArticleStatus::Failed);
            } else {
                assert_eq!(record.status, ArticleStatus::Complete);
                assert!(record.analyzed_at.is_some());
            }
        }
    }

    #[tokio::test]
    async fn failed_article_keeps_its_scraped_fields() {
        let store = Arc::new(MemoryStore::new());
        let broken = article(1);
        let (manager, scraper) =
            manager(store.clone(), vec![broken.clone()], vec![broken.url.clone()]);

        manager.run_with_scraper(&scraper).await.unwrap();

        let record = store.get(&broken.url).await.unwrap().unwrap();
        assert_eq!(record.status, ArticleStatus::Failed);
        assert_eq!(record.title, broken.title);
        assert_eq!(record.content, broken.content);
        assert!(record.metadata.error.as_deref().unwrap_or("").len() > 0);
        assert!(record.metadata.failed_at.is_some());
        assert!(record.analyzed_at.is_none());
        assert!(record.summary.is_none());
    }

    #[tokio::test]
    async fn extraction_failures_are_skipped() {
        let store = Arc::new(MemoryStore::new());
        let articles = vec![article(1), article(2)];
        let analyzer = Arc::new(SelectiveAnalyzer { reject: Vec::new() });
        let manager = PipelineManager::new(store.clone(), analyzer, ScrapeConfig::default());
        let scraper = FixtureScraper {
            articles,
            broken_urls: vec!["https://nvidianews.nvidia.com/news/broken".to_string()],
        };

        let report = manager.run_with_scraper(&scraper).await.unwrap();
        assert_eq!(report.extracted, 2);
        assert_eq!(report.analyzed, 2);
        assert_eq!(report.failed, 0);
        assert!(store
            .get("https://nvidianews.nvidia.com/news/broken")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn re_extraction_replaces_without_duplicating() {
        let store = Arc::new(MemoryStore::new());
        let target = article(1);
        let (manager, scraper) = manager(store.clone(), vec![target.clone()], Vec::new());

        manager.run_with_scraper(&scraper).await.unwrap();
        let first = store.get(&target.url).await.unwrap().unwrap();

        manager.run_with_scraper(&scraper).await.unwrap();
        let second = store.get(&target.url).await.unwrap().unwrap();

        assert_eq!(first.title, second.title);
        assert_eq!(first.content, second.content);
        assert_eq!(first.source, second.source);
        assert!(second.scraped_at >= first.scraped_at);
        assert_eq!(second.status, ArticleStatus::Complete);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total, 1);
    }

    #[tokio::test]
    async fn unknown_source_is_a_configuration_error() {
        let store = Arc::new(MemoryStore::new());
        let analyzer = Arc::new(SelectiveAnalyzer { reject: Vec::new() });
        let manager = PipelineManager::new(store, analyzer, ScrapeConfig::default());

        let err = manager.run("acme").await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
