use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

pub mod handlers;
pub mod state;

pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/articles", get(handlers::list_articles))
        .route("/api/articles/:url", get(handlers::get_article))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/health", get(handlers::health_check))
        .layer(cors)
        .with_state(Arc::new(state))
}

pub mod prelude {
    pub use super::{create_app, AppState};
    pub use intel_core::{Result, StoredArticle};
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use intel_core::{
        AnalysisResult, ArticleMetadata, ArticleStore, Classification, Entity, EntityType,
        ExtractionMethod, InferenceBackend, Result, ScrapedArticle,
    };
    use intel_storage::MemoryStore;
    use tower::util::ServiceExt;

    struct StubLlm {
        healthy: bool,
    }

    #[async_trait]
    impl InferenceBackend for StubLlm {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String> {
            Ok(String::new())
        }

        async fn health_check(&self) -> bool {
            self.healthy
        }
    }

    fn article(url: &str) -> ScrapedArticle {
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

    async fn app_with_data(llm_healthy: bool) -> Router {
        let store = Arc::new(MemoryStore::new());
        let url = "https://nvidianews.nvidia.com/news/a";
        store.upsert_scraped(&article(url)).await.unwrap();
        store.apply_analysis(url, &analysis()).await.unwrap();

        create_app(AppState {
            store,
            llm: Arc::new(StubLlm {
                healthy: llm_healthy,
            }),
        })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn lists_completed_articles_by_default() {
        let app = app_with_data(true).await;
        let response = app
            .oneshot(Request::get("/api/articles").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["classification"], "product_launch");
        assert_eq!(json[0]["sentimentScore"], 8);
        assert!(json[0].get("content").is_none());
    }

    #[tokio::test]
    async fn rejects_unknown_status_filters() {
        let app = app_with_data(true).await;
        let response = app
            .oneshot(
                Request::get("/api/articles?status=done")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_article_is_a_404() {
        let app = app_with_data(true).await;
        let response = app
            .oneshot(
                Request::get("/api/articles/https%3A%2F%2Fnowhere.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_reports_degraded_when_llm_is_down() {
        let app = app_with_data(false).await;
        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let json = body_json(response).await;
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["services"]["database"], "up");
        assert_eq!(json["services"]["llm"], "down");
    }

    #[tokio::test]
    async fn health_is_ok_when_all_services_are_up() {
        let app = app_with_data(true).await;
        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
    }
}
