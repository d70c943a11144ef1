use crate::api::ApiClient;
use crate::config::Config;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub api: ApiClient,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(api: ApiClient, config: Config) -> Self {
        Self {
            api,
            config: Arc::new(config),
        }
    }

    /// Requested center, or the configured default.
    pub fn center_id(&self, requested: Option<String>) -> String {
        requested
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| self.config.default_center_id.clone())
    }
}
