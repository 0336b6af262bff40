use onething_ai_adapters::TextStreamProvider;
use onething_core::TaskStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn TextStreamProvider>,
    pub store: Arc<TaskStore>,
}

impl AppState {
    pub fn new(provider: Arc<dyn TextStreamProvider>, store: Arc<TaskStore>) -> Self {
        Self { provider, store }
    }
}
