use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{AnalysisResult, ArticleStatus, ScrapedArticle, StoredArticle};
use crate::Result;

/// Aggregate counts over the stored records, one per lifecycle state.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub total: usize,
    pub pending: usize,
    pub complete: usize,
    pub failed: usize,
}

/// Persistence operations the pipeline requires from its storage
/// collaborator. Connection management and richer query APIs are the
/// backend's own concern.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Insert-or-replace a scraped article keyed by URL, resetting it to
    /// pending with a fresh scraped-at timestamp.
    async fn upsert_scraped(&self, article: &ScrapedArticle) -> Result<()>;

    /// Apply analysis results to the record: summary, entities,
    /// classification, sentiment, analyzed-at, status=complete.
    /// Returns false if no record exists for the URL.
    async fn apply_analysis(&self, url: &str, analysis: &AnalysisResult) -> Result<bool>;

    /// Transition the record to failed, recording the error and a failed-at
    /// timestamp. The originally scraped fields are left untouched.
    /// Returns false if no record exists for the URL.
    async fn mark_failed(&self, url: &str, error: &str) -> Result<bool>;

    /// Fetch up to `limit` records in the given lifecycle state, most
    /// recently scraped first.
    async fn find_by_status(&self, status: ArticleStatus, limit: usize)
        -> Result<Vec<StoredArticle>>;

    /// Fetch a single record by URL.
    async fn get(&self, url: &str) -> Result<Option<StoredArticle>>;

    async fn stats(&self) -> Result<StoreStats>;
}
