pub mod config;
pub mod error;
pub mod inference;
pub mod storage;
pub mod types;

pub use config::Settings;
pub use error::Error;
pub use inference::{ArticleAnalyzer, InferenceBackend};
pub use storage::{ArticleStore, StoreStats};
pub use types::{
    AnalysisResult, ArticleMetadata, ArticleStatus, Classification, Entity, EntityType,
    ExtractionMethod, ScrapedArticle, StoredArticle,
};

pub type Result<T> = std::result::Result<T, Error>;
