use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// How an article's text was obtained from the source page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Plain HTTP fetch plus DOM text extraction.
    Static,
    /// Headless-browser render, for pages that assemble content with scripts.
    Rendered,
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMethod::Static => write!(f, "static"),
            ExtractionMethod::Rendered => write!(f, "rendered"),
        }
    }
}

/// Technical metadata carried alongside an article through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleMetadata {
    pub extraction_method: ExtractionMethod,
    pub content_truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
}

impl ArticleMetadata {
    pub fn new(extraction_method: ExtractionMethod) -> Self {
        Self {
            extraction_method,
            content_truncated: false,
            processing_time: None,
            error: None,
            failed_at: None,
        }
    }
}

impl Default for ArticleMetadata {
    fn default() -> Self {
        Self::new(ExtractionMethod::Static)
    }
}

/// A raw article as produced by an extractor, before any analysis.
///
/// Identity is the source URL. Title and content are guaranteed non-empty by
/// the extractors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedArticle {
    pub url: String,
    pub title: String,
    pub content: String,
    pub publish_date: DateTime<Utc>,
    pub source: String,
    #[serde(default)]
    pub metadata: ArticleMetadata,
}

/// Entity type enumeration used by the analysis contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Company,
    Person,
    Product,
    Technology,
}

impl FromStr for EntityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "company" => Ok(EntityType::Company),
            "person" => Ok(EntityType::Person),
            "product" => Ok(EntityType::Product),
            "technology" => Ok(EntityType::Technology),
            other => Err(Error::validation(
                "type",
                format!("unknown entity type: {}", other),
            )),
        }
    }
}

/// Named entity extracted from article content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub mentions: u32,
}

/// Fixed article classification enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    CompetitiveNews,
    PersonnelChange,
    ProductLaunch,
    MarketTrend,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::CompetitiveNews => "competitive_news",
            Classification::PersonnelChange => "personnel_change",
            Classification::ProductLaunch => "product_launch",
            Classification::MarketTrend => "market_trend",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "competitive_news" => Ok(Classification::CompetitiveNews),
            "personnel_change" => Ok(Classification::PersonnelChange),
            "product_launch" => Ok(Classification::ProductLaunch),
            "market_trend" => Ok(Classification::MarketTrend),
            other => Err(Error::validation(
                "classification",
                format!("unknown classification: {}", other),
            )),
        }
    }
}

/// Structured intelligence derived from one article in a single inference
/// pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    pub entities: Vec<Entity>,
    pub classification: Classification,
    pub sentiment_score: u8,
}

/// Lifecycle state of a stored article. Complete and failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Pending,
    Complete,
    Failed,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Pending => "pending",
            ArticleStatus::Complete => "complete",
            ArticleStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ArticleStatus::Pending),
            "complete" => Ok(ArticleStatus::Complete),
            "failed" => Ok(ArticleStatus::Failed),
            other => Err(Error::Storage(format!("unknown status: {}", other))),
        }
    }
}

/// A pipeline record: the scraped article plus lifecycle and derived fields.
///
/// `analyzed_at` is set exactly when status is complete; failure details live
/// in `metadata.error` / `metadata.failed_at` and are present exactly when
/// status is failed. The scraped fields are never touched after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredArticle {
    pub url: String,
    pub title: String,
    pub content: String,
    pub publish_date: DateTime<Utc>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<u8>,
    pub scraped_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_at: Option<DateTime<Utc>>,
    pub status: ArticleStatus,
    #[serde(default)]
    pub metadata: ArticleMetadata,
}

impl StoredArticle {
    /// Creates a fresh pending record from a scraped article, stamping
    /// `scraped_at` with the current time.
    pub fn pending(article: &ScrapedArticle) -> Self {
        Self {
            url: article.url.clone(),
            title: article.title.clone(),
            content: article.content.clone(),
            publish_date: article.publish_date,
            source: article.source.clone(),
            summary: None,
            entities: Vec::new(),
            classification: None,
            sentiment_score: None,
            scraped_at: Utc::now(),
            analyzed_at: None,
            status: ArticleStatus::Pending,
            metadata: article.metadata.clone(),
        }
    }
}
