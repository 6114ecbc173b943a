use std::sync::Arc;

use crate::config::AppConfig;
use crate::store::ReadingStore;

/// Shared, immutable-after-load state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn ReadingStore>,
}
