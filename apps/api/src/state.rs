use std::sync::Arc;

use crate::config::Config;
use crate::llm::ModelClient;
use crate::report::ReportCoordinator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn ModelClient>,
    pub coordinator: Arc<ReportCoordinator>,
    pub config: Config,
}
