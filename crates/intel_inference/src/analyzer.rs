use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use intel_core::{AnalysisResult, ArticleAnalyzer, Error, InferenceBackend, Result, ScrapedArticle};

use crate::prompts::{build_analysis_prompt, ANALYSIS_SYSTEM_PROMPT};
use crate::truncate::truncate_content;
use crate::validate::parse_analysis;

/// Single-pass analyzer: summary, entities, classification and sentiment all
/// come out of one inference call against a bounded prompt.
pub struct UnifiedAnalyzer {
    backend: Arc<dyn InferenceBackend>,
    max_content_chars: usize,
}

impl UnifiedAnalyzer {
    pub fn new(backend: Arc<dyn InferenceBackend>, max_content_chars: usize) -> Self {
        Self {
            backend,
            max_content_chars,
        }
    }
}

#[async_trait]
impl ArticleAnalyzer for UnifiedAnalyzer {
    async fn analyze(&self, article: &ScrapedArticle) -> Result<AnalysisResult> {
        info!(
            url = %article.url,
            content_length = article.content.len(),
            "starting analysis"
        );

        let (truncated, was_truncated) =
            truncate_content(&article.content, self.max_content_chars);
        if was_truncated {
            info!(
                original_length = article.content.len(),
                truncated_length = truncated.len(),
                "content truncated for inference"
            );
        }

        let user_prompt = build_analysis_prompt(article, &truncated);
        let response = self
            .backend
            .generate(ANALYSIS_SYSTEM_PROMPT, &user_prompt)
            .await?;

        if response.trim().is_empty() {
            return Err(Error::inference("inference service returned an empty response"));
        }

        let analysis = parse_analysis(&response)?;

        info!(
            url = %article.url,
            classification = %analysis.classification,
            sentiment = analysis.sentiment_score,
            entity_count = analysis.entities.len(),
            "analysis complete"
        );

        Ok(analysis)
    }
}
