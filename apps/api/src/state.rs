use std::sync::Arc;

use crate::analysis::controller::AnalysisController;
use crate::analysis::sessions::SessionRegistry;
use crate::candidates::CandidateRepository;
use crate::config::Config;
use crate::llm_client::ProviderClient;
use crate::settings::store::SettingsStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable provider client. Default: HttpProviderClient; stubs in tests.
    pub provider: Arc<dyn ProviderClient>,
    pub settings: Arc<dyn SettingsStore>,
    pub candidates: Arc<dyn CandidateRepository>,
    pub sessions: SessionRegistry,
    pub config: Config,
}

impl AppState {
    /// A fresh controller bound to this state's provider client and timeout.
    pub fn new_controller(&self) -> AnalysisController {
        AnalysisController::new(Arc::clone(&self.provider), self.config.analysis_timeout)
    }
}
