use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use intel_core::{
    AnalysisResult, ArticleStatus, ArticleStore, Result, ScrapedArticle, StoreStats, StoredArticle,
};

/// In-memory article store keyed by URL. Used in tests and for local runs
/// without a database.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, StoredArticle>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn upsert_scraped(&self, article: &ScrapedArticle) -> Result<()> {
        let record = StoredArticle::pending(article);
        self.records
            .write()
            .await
            .insert(article.url.clone(), record);
        Ok(())
    }

    async fn apply_analysis(&self, url: &str, analysis: &AnalysisResult) -> Result<bool> {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(url) else {
            return Ok(false);
        };

        record.summary = Some(analysis.summary.clone());
        record.entities = analysis.entities.clone();
        record.classification = Some(analysis.classification);
        record.sentiment_score = Some(analysis.sentiment_score);
        record.analyzed_at = Some(Utc::now());
        record.status = ArticleStatus::Complete;
        Ok(true)
    }

    async fn mark_failed(&self, url: &str, error: &str) -> Result<bool> {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(url) else {
            return Ok(false);
        };

        record.status = ArticleStatus::Failed;
        record.metadata.error = Some(error.to_string());
        record.metadata.failed_at = Some(Utc::now());
        Ok(true)
    }

    async fn find_by_status(
        &self,
        status: ArticleStatus,
        limit: usize,
    ) -> Result<Vec<StoredArticle>> {
        let records = self.records.read().await;
        let mut matching: Vec<StoredArticle> = records
            .values()
            .filter(|record| record.status == status)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn get(&self, url: &str) -> Result<Option<StoredArticle>> {
        Ok(self.records.read().await.get(url).cloned())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let records = self.records.read().await;
        let mut stats = StoreStats {
            total: records.len(),
            ..StoreStats::default()
        };
        for record in records.values() {
            match record.status {
                ArticleStatus::Pending => stats.pending += 1,
                ArticleStatus::Complete => stats.complete += 1,
                ArticleStatus::Failed => stats.failed += 1,
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intel_core::{ArticleMetadata, Classification, Entity, EntityType, ExtractionMethod};

    fn sample(url: &str) -> ScrapedArticle {
        ScrapedArticle {
            url: url.to_string(),
            title: "NVIDIA Announces New AI Chip".to_string(),
            content: "NVIDIA CEO Jensen Huang announced the H100 GPU.".to_string(),
            publish_date: Utc::now(),
            source: "NVIDIA Newsroom".to_string(),
            metadata: ArticleMetadata::new(ExtractionMethod::Static),
        }
    }

    fn analysis() -> AnalysisResult {
        AnalysisResult {
            summary: "NVIDIA unveiled the H100 GPU for AI training.".to_string(),
            entities: vec![Entity {
                text: "NVIDIA".to_string(),
                entity_type: EntityType::Company,
                mentions: 3,
            }],
            classification: Classification::ProductLaunch,
            sentiment_score: 8,
        }
    }

    #[tokio::test]
    async fn upsert_replaces_by_url() {
        let store = MemoryStore::new();
        let url = "https://nvidianews.nvidia.com/news/a";

        store.upsert_scraped(&sample(url)).await.unwrap();
        store.upsert_scraped(&sample(url)).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.pending, 1);
    }

    #[tokio::test]
    async fn upsert_resets_a_terminal_record_to_pending() {
        let store = MemoryStore::new();
        let url = "https://nvidianews.nvidia.com/news/a";

        store.upsert_scraped(&sample(url)).await.unwrap();
        assert!(store.apply_analysis(url, &analysis()).await.unwrap());
        store.upsert_scraped(&sample(url)).await.unwrap();

        let record = store.get(url).await.unwrap().unwrap();
        assert_eq!(record.status, ArticleStatus::Pending);
        assert!(record.analyzed_at.is_none());
        assert!(record.summary.is_none());
    }

    #[tokio::test]
    async fn apply_analysis_completes_the_record() {
        let store = MemoryStore::new();
        let url = "https://nvidianews.nvidia.com/news/a";
        store.upsert_scraped(&sample(url)).await.unwrap();

        assert!(store.apply_analysis(url, &analysis()).await.unwrap());

        let record = store.get(url).await.unwrap().unwrap();
        assert_eq!(record.status, ArticleStatus::Complete);
        assert!(record.analyzed_at.is_some());
        assert_eq!(record.sentiment_score, Some(8));
        assert_eq!(record.classification, Some(Classification::ProductLaunch));
        assert!(record.metadata.error.is_none());
    }

    #[tokio::test]
    async fn mark_failed_records_the_error_and_keeps_content() {
        let store = MemoryStore::new();
        let url = "https://nvidianews.nvidia.com/news/a";
        let article = sample(url);
        store.upsert_scraped(&article).await.unwrap();

        assert!(store.mark_failed(url, "invalid JSON").await.unwrap());

        let record = store.get(url).await.unwrap().unwrap();
        assert_eq!(record.status, ArticleStatus::Failed);
        assert_eq!(record.metadata.error.as_deref(), Some("invalid JSON"));
        assert!(record.metadata.failed_at.is_some());
        assert!(record.analyzed_at.is_none());
        assert_eq!(record.content, article.content);
    }

    #[tokio::test]
    async fn updates_against_unknown_urls_report_false() {
        let store = MemoryStore::new();
        assert!(!store
            .apply_analysis("https://nowhere.example", &analysis())
            .await
            .unwrap());
        assert!(!store.mark_failed("https://nowhere.example", "x").await.unwrap());
    }

    #[tokio::test]
    async fn find_by_status_filters_and_limits() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .upsert_scraped(&sample(&format!(
                    "https://nvidianews.nvidia.com/news/{}",
                    i
                )))
                .await
                .unwrap();
        }
        store
            .apply_analysis("https://nvidianews.nvidia.com/news/0", &analysis())
            .await
            .unwrap();

        let pending = store.find_by_status(ArticleStatus::Pending, 3).await.unwrap();
        assert_eq!(pending.len(), 3);
        let complete = store
            .find_by_status(ArticleStatus::Complete, 10)
            .await
            .unwrap();
        assert_eq!(complete.len(), 1);
    }
}
