use std::sync::Arc;

use intel_core::{ArticleStore, InferenceBackend};

pub struct AppState {
    pub store: Arc<dyn ArticleStore>,
    pub llm: Arc<dyn InferenceBackend>,
}
