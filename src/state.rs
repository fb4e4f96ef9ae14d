use crate::backend::SpreadsheetBackend;
use crate::config::ServerConfig;
use crate::service::SheetService;
use std::sync::Arc;

/// Shared application state: constructed once at startup, reused read-only
/// by every request. No per-request mutation.
pub struct AppState {
    config: Arc<ServerConfig>,
    sheets: SheetService,
}

impl AppState {
    pub fn new(config: Arc<ServerConfig>, backend: Arc<dyn SpreadsheetBackend>) -> Self {
        Self {
            config,
            sheets: SheetService::new(backend),
        }
    }

    pub fn config(&self) -> Arc<ServerConfig> {
        self.config.clone()
    }

    pub fn sheets(&self) -> &SheetService {
        &self.sheets
    }
}
