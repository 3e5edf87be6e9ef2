pub mod analyzer;
pub mod client;
pub mod prompts;
pub mod truncate;
pub mod validate;

pub use analyzer::UnifiedAnalyzer;
pub use client::OllamaClient;
pub use truncate::truncate_content;
pub use validate::parse_analysis;

pub mod prelude {
    pub use super::{OllamaClient, UnifiedAnalyzer};
    pub use intel_core::{AnalysisResult, ArticleAnalyzer, InferenceBackend, Result};
}
