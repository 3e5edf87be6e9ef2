use async_trait::async_trait;

use crate::types::{AnalysisResult, ScrapedArticle};
use crate::Result;

/// A text-generation backend. One `generate` call is one logical request to
/// the inference service; transient-failure retries happen behind this trait.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;

    /// Cheap liveness probe. Returns false on any error, never fails.
    async fn health_check(&self) -> bool;
}

/// Turns one scraped article into a validated analysis result.
#[async_trait]
pub trait ArticleAnalyzer: Send + Sync {
    async fn analyze(&self, article: &ScrapedArticle) -> Result<AnalysisResult>;
}
