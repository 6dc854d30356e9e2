use crate::config::AppConfig;
use crate::llm::LlmManager;

/// Shared application state for the web server. Everything here is
/// immutable after startup; concurrent requests need no coordination.
pub struct AppState {
    pub config: AppConfig,
    pub llm_manager: LlmManager,
    pub http_client: reqwest::Client,
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: AppConfig, llm_manager: LlmManager) -> Self {
        Self {
            config,
            llm_manager,
            http_client: reqwest::Client::new(),
            startup_time: chrono::Utc::now(),
        }
    }
}
