use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use intel_core::{ArticleStatus, Classification, StoreStats, StoredArticle};

use crate::AppState;

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

type ApiError = (StatusCode, String);

fn internal_error(context: &str, e: intel_core::Error) -> ApiError {
    error!("{}: {}", context, e);
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    status: Option<String>,
    limit: Option<usize>,
}

/// Compact list entry: everything except the full article body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleListItem {
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<u8>,
    pub publish_date: DateTime<Utc>,
    pub source: String,
    pub status: ArticleStatus,
}

impl From<StoredArticle> for ArticleListItem {
    fn from(record: StoredArticle) -> Self {
        Self {
            url: record.url,
            title: record.title,
            summary: record.summary,
            classification: record.classification,
            sentiment_score: record.sentiment_score,
            publish_date: record.publish_date,
            source: record.source,
            status: record.status,
        }
    }
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ArticleListItem>>, ApiError> {
    let status = match params.status.as_deref() {
        None => ArticleStatus::Complete,
        Some(raw) => raw
            .parse()
            .map_err(|_| (StatusCode::BAD_REQUEST, format!("unknown status: {}", raw)))?,
    };
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    let records = state
        .store
        .find_by_status(status, limit)
        .await
        .map_err(|e| internal_error("failed to list articles", e))?;

    Ok(Json(records.into_iter().map(ArticleListItem::from).collect()))
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(url): Path<String>,
) -> Result<Json<StoredArticle>, ApiError> {
    let record = state
        .store
        .get(&url)
        .await
        .map_err(|e| internal_error("failed to fetch article", e))?;

    match record {
        Some(record) => Ok(Json(record)),
        None => Err((StatusCode::NOT_FOUND, format!("no article for {}", url))),
    }
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StoreStats>, ApiError> {
    let stats = state
        .store
        .stats()
        .await
        .map_err(|e| internal_error("failed to compute stats", e))?;
    Ok(Json(stats))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub services: BTreeMap<&'static str, &'static str>,
    pub timestamp: DateTime<Utc>,
}

/// Aggregates store and inference-service health. Healthy means every
/// service is up; anything less maps to 503 so orchestration notices.
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let database_up = state.store.stats().await.is_ok();
    let llm_up = state.llm.health_check().await;

    let mut services = BTreeMap::new();
    services.insert("database", if database_up { "up" } else { "down" });
    services.insert("llm", if llm_up { "up" } else { "down" });

    let up_count = [database_up, llm_up].iter().filter(|up| **up).count();
    let status = match up_count {
        2 => "healthy",
        0 => "unhealthy",
        _ => "degraded",
    };

    let code = if status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(HealthResponse {
            status,
            services,
            timestamp: Utc::now(),
        }),
    )
}
